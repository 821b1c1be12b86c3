//! Tables: schemas, append-only storage, and data tokens

mod schema;
mod store;
mod token;

pub use schema::{Field, TableConfig, TableSchema};
pub use store::{StoredRow, TableStore};
pub use token::{DataToken, TokenRegistry};
