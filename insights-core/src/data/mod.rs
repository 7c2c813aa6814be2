//! Data stages: remote fetch, JSON-to-CSV conversion, and table loading.

pub mod convert;
pub mod dune;
pub mod fetch;
pub mod loader;
pub mod provider;

pub use convert::{convert_file, json_to_csv, ConvertError, ConvertedTable};
pub use dune::{DuneProvider, DuneSettings, ProviderInitError};
pub use fetch::{fetch_to_file, read_meta, FetchMeta, FetchSummary};
pub use loader::{load_table, parse_table, CacheStats, LoadError, TableCache};
pub use provider::{DataError, QueryOutput, QueryProvider, QueryRequest, ResultFormat};
