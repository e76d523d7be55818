//! The dataset access layer: typed columns, datasets and a lazy named cache
//! over whatever engine materialises the register's tables.
pub mod cache;
pub mod column;
pub mod dataset;
pub mod error;
pub mod source;
pub mod value;

pub use cache::DatasetCache;
pub use column::Column;
pub use dataset::{row_key, Dataset};
pub use error::TableError;
pub use source::{DatasetSource, JsonDirSource, MemorySource};
pub use value::{parse_date, DataType, Value};
