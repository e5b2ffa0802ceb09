//! Renders a [`PostgresDatabase`] into sql comment lines a completion model can continue from.
//!
//! Everything in here is a pure function of its input, the same document always renders
//! to the same bytes.

use itertools::Itertools;
use crate::{PostgresColumn, PostgresDatabase, PostgresRelation, PostgresSchema};

pub const LANGUAGE_LINE: &str = "-- Language PostgreSQL";

pub const SELECT_1_LINE: &str = "SELECT 1;";

pub fn describe_column(column: &PostgresColumn, include_types: bool) -> String {
    if include_types {
        format!("{} {}", column.name, column.data_type)
    } else {
        column.name.clone()
    }
}

pub fn describe_columns(columns: &[PostgresColumn], include_types: bool) -> String {
    columns
        .iter()
        .map(|c| describe_column(c, include_types))
        .join(", ")
}

/// Relations in `public` are left unqualified, as that schema is on the default search path.
pub fn describe_relation_name(schema_name: &str, relation_name: &str) -> String {
    if schema_name == "public" {
        format!("\"{relation_name}\"")
    } else {
        format!("\"{schema_name}\".\"{relation_name}\"")
    }
}

/// Views are labelled as tables as well.
pub fn describe_relation(schema_name: &str, relation: &PostgresRelation, include_types: bool) -> String {
    format!(
        "-- Table = {}, columns = [{}]",
        describe_relation_name(schema_name, &relation.name),
        describe_columns(&relation.columns, include_types)
    )
}

/// Only `tables` are described, views are left out of the prompt.
pub fn describe_schema(schema: &PostgresSchema, include_types: bool) -> String {
    schema
        .tables
        .iter()
        .map(|t| describe_relation(&schema.name, t, include_types))
        .join("\n")
}

pub fn describe_database(db: &PostgresDatabase, include_types: bool) -> String {
    db.schemata
        .iter()
        .map(|s| describe_schema(s, include_types))
        .join("\n")
}

/// Joins prompt parts with newlines. Empty parts still produce an empty line.
pub fn concat_prompt<S: AsRef<str>>(parts: impl IntoIterator<Item = S>) -> String {
    parts.into_iter().map(|p| p.as_ref().to_string()).join("\n")
}

/// The baseline prompt.
///
/// Besides the actual request it asks for a `SELECT 1` query and provides it, which
/// nudges the model into continuing with raw sql instead of more comments.
pub fn default_prompt(text: &str, db: &PostgresDatabase, include_types: bool) -> String {
    concat_prompt([
        LANGUAGE_LINE.to_string(),
        describe_database(db, include_types),
        format!("-- A PostgreSQL query to return 1 and a PostgreSQL query for {text}"),
        SELECT_1_LINE.to_string(),
    ])
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CustomPromptOptions {
    pub include_schema: bool,
    pub include_types: bool,
    pub add_select_1: bool,
}

impl Default for CustomPromptOptions {
    fn default() -> Self {
        Self {
            include_schema: true,
            include_types: true,
            add_select_1: true,
        }
    }
}

/// A prompt built from a caller supplied task description.
///
/// `task_prompt` and `user_prompt` are concatenated as is, so the caller decides whether
/// they are separated by a space, a newline or nothing.
pub fn custom_prompt(
    task_prompt: &str,
    user_prompt: &str,
    db: &PostgresDatabase,
    options: &CustomPromptOptions,
) -> String {
    let mut parts = vec![LANGUAGE_LINE.to_string()];

    if options.include_schema {
        parts.push(describe_database(db, options.include_types));
    }

    parts.push(format!("{task_prompt}{user_prompt}"));

    if options.add_select_1 {
        parts.push(SELECT_1_LINE.to_string());
    }

    concat_prompt(parts)
}

/// Fills the `{schema}` and `{user_prompt}` placeholders of a prompt template.
/// `{user_input}` is accepted as an alias of `{user_prompt}`.
pub fn render_template(template: &str, schema: &str, user_prompt: &str) -> String {
    template
        .replace("{schema}", schema)
        .replace("{user_prompt}", user_prompt)
        .replace("{user_input}", user_prompt)
}
