//! Record-set persistence.
//!
//! - [`table`]: per-page CSV files (`partial_<n>.csv`, `full_<n>.csv`) and the
//!   merge of all enriched pages into one dataset
//!
//! ```text
//! data_dir/
//! ├── partial_288.csv
//! ├── partial_289.csv
//! ├── full_288.csv
//! ├── full_289.csv
//! └── dataset.csv   # output of `merge`
//! ```

pub mod table;
