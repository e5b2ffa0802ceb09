#[cfg(test)]
mod test_helpers;

mod postgres_client_wrapper;
mod schema_reader;
mod models;
mod error;
mod normalized_sql;
pub mod prompt;
pub mod completion;
pub mod validation;
pub mod evaluation;

pub use error::*;
pub use models::*;
pub use normalized_sql::NormalizedSql;
pub use postgres_client_wrapper::{FromRow, PostgresClientWrapper, TextQueryOutput};
pub use schema_reader::{fold_schema_rows, ColumnFields, SchemaReader, SchemaRow};
