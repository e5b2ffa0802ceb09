use serde::{Deserialize, Serialize};
use crate::models::relation::{PostgresRelation, RelationKind};

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize, Deserialize)]
pub struct PostgresSchema {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Reserved for foreign schemas, introspection currently always sets this to false.
    #[serde(default)]
    pub is_foreign: bool,
    #[serde(default)]
    pub tables: Vec<PostgresRelation>,
    #[serde(default)]
    pub views: Vec<PostgresRelation>,
}

impl PostgresSchema {
    pub fn new(name: &str) -> Self {
        PostgresSchema {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn relations_mut(&mut self, kind: RelationKind) -> &mut Vec<PostgresRelation> {
        match kind {
            RelationKind::Table => &mut self.tables,
            RelationKind::View => &mut self.views,
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&PostgresRelation> {
        self.tables.iter().find(|t| t.name == name)
    }
}
