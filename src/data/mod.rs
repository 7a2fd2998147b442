/// Data layer: revision tables, loading, and metric series.
///
/// Architecture:
/// ```text
///  <entity>.csv / <entity>.parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RevisionTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ RevisionTable  │  Vec<Revision> sorted by timestamp
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ metrics   │  Metric::compute → TimeSeries (one per metric × entity)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
