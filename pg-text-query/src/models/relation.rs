use serde::{Deserialize, Serialize};
use crate::models::column::PostgresColumn;

/// A table or a view. Which of the two it is follows from the list it is stored in
/// on [`crate::PostgresSchema`].
#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize, Deserialize)]
pub struct PostgresRelation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub columns: Vec<PostgresColumn>,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    /// Classifies `information_schema.tables.table_type`. Only `VIEW` is a view, everything
    /// else (`BASE TABLE`, `FOREIGN`, `LOCAL TEMPORARY`) is treated as a table.
    pub fn from_table_type(table_type: Option<&str>) -> Self {
        match table_type {
            Some("VIEW") => RelationKind::View,
            _ => RelationKind::Table,
        }
    }
}
