use serde::{Deserialize, Serialize};

#[derive(Debug, Eq, PartialEq, Default, Clone, Serialize, Deserialize)]
pub struct PostgresColumn {
    pub name: String,
    pub data_type: String,
    /// `YES` or `NO`, as reported by `information_schema.columns`.
    #[serde(default)]
    pub is_nullable: Option<String>,
    #[serde(default)]
    pub column_default: Option<String>,
    #[serde(default)]
    pub character_maximum_length: Option<i32>,
    #[serde(default)]
    pub ordinal_position: i32,
    #[serde(default)]
    pub description: Option<String>,
}

impl PostgresColumn {
    pub fn is_nullable(&self) -> bool {
        self.is_nullable.as_deref() != Some("NO")
    }
}
