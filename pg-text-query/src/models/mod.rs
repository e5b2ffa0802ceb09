mod column;
mod database;
mod relation;
mod schema;

pub use column::*;
pub use database::*;
pub use relation::*;
pub use schema::*;
