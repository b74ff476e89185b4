/// Data layer: core types, loading, and grouped statistics.
///
/// Architecture:
/// ```text
///  barlog*.xlsx / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sheet → RawTable  (outer, inner) columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  per category → CategoryStats (mean, std dev)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod stats;
