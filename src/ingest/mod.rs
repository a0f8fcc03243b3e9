/// Input side of the ingestion pipeline.
///
/// - `schema`    — required-column check on the CSV header
/// - `reader`    — chunked CSV reader
/// - `normalize` — raw rows → typed records, per-batch skip accounting

pub mod normalize;
pub mod reader;
pub mod schema;

#[cfg(test)]
pub(crate) mod fixtures;
