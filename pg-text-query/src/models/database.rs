use serde::{Deserialize, Serialize};
use crate::models::schema::PostgresSchema;
use crate::Result;

/// The introspected catalog of a single database.
///
/// Serializes to the json layout the prompt tooling reads and writes
/// (`name`, `description`, `schemata[]`), so hand written schema files can be used
/// in place of a live database.
#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize, Deserialize)]
pub struct PostgresDatabase {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub schemata: Vec<PostgresSchema>,
}

impl PostgresDatabase {
    pub fn get_schema(&self, name: &str) -> Option<&PostgresSchema> {
        self.schemata.iter().find(|s| s.name == name)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
