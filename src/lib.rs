pub mod analysis;
pub mod archive;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod ingest;
pub mod search;
pub mod store;
pub mod table;

pub use config::Config;
pub use error::{Result, TabragError};
pub use index::VectorIndex;
pub use table::{Cell, ColumnClass, Table};
