use crate::models::*;
use crate::postgres_client_wrapper::PostgresClientWrapper;
use crate::Result;
use tracing::{debug, instrument};

mod schema_row;
#[cfg(test)]
pub mod tests;

pub use schema_row::{ColumnFields, SchemaRow};
pub(crate) use schema_row::GET_DB_SCHEMA_SQL;

pub struct SchemaReader<'a> {
    connection: &'a PostgresClientWrapper,
}

impl SchemaReader<'_> {
    pub fn new(connection: &PostgresClientWrapper) -> SchemaReader {
        SchemaReader { connection }
    }

    /// Reads the schemas, tables, views and columns of the connected database.
    ///
    /// `db_name` is only used to look up the database comment.
    #[instrument(skip(self))]
    pub async fn introspect_database(&self, db_name: &str) -> Result<PostgresDatabase> {
        let rows: Vec<SchemaRow> = self
            .connection
            .get_results_with_params(GET_DB_SCHEMA_SQL, &[&db_name])
            .await?;

        debug!(row_count = rows.len(), "read information schema rows");

        Ok(fold_schema_rows(rows))
    }
}

/// Folds flat information schema rows into a [`PostgresDatabase`].
///
/// The rows must already be ordered by schema name and then relation name. Consecutive
/// rows with the same key form a group, so out of order input results in split groups
/// rather than being merged.
pub fn fold_schema_rows(rows: impl IntoIterator<Item = SchemaRow>) -> PostgresDatabase {
    let mut db = PostgresDatabase::default();
    let mut current_schema: Option<PostgresSchema> = None;
    let mut current_relation: Option<RelationInProgress> = None;

    for (row_idx, row) in rows.into_iter().enumerate() {
        if row_idx == 0 {
            db.name = row.database_name.clone();
            db.description = row.database_description.clone();
        }

        let same_schema = current_schema
            .as_ref()
            .is_some_and(|s| s.name == row.schema_name);

        if !same_schema {
            if let Some(mut schema) = current_schema.take() {
                if let Some(relation) = current_relation.take() {
                    relation.flush_into(&mut schema);
                }
                db.schemata.push(schema);
            }

            current_schema = Some(PostgresSchema {
                name: row.schema_name.clone(),
                description: row.schema_description.clone(),
                ..Default::default()
            });
        }

        let same_relation = current_relation
            .as_ref()
            .is_some_and(|r| r.name == row.relation_name);

        if !same_relation {
            if let (Some(relation), Some(schema)) = (current_relation.take(), current_schema.as_mut()) {
                relation.flush_into(schema);
            }

            current_relation = Some(RelationInProgress {
                name: row.relation_name.clone(),
                description: row.relation_description.clone(),
                kind: None,
                columns: vec![],
            });
        }

        if let Some(relation) = current_relation.as_mut() {
            relation.kind = Some(RelationKind::from_table_type(row.relation_type.as_deref()));

            if let Some(column) = row.column.to_postgres_column() {
                relation.columns.push(column);
            }
        }
    }

    if let Some(mut schema) = current_schema.take() {
        if let Some(relation) = current_relation.take() {
            relation.flush_into(&mut schema);
        }
        db.schemata.push(schema);
    }

    db
}

struct RelationInProgress {
    name: Option<String>,
    description: Option<String>,
    kind: Option<RelationKind>,
    columns: Vec<PostgresColumn>,
}

impl RelationInProgress {
    /// Schemas without tables and tables without columns show up as placeholder rows,
    /// neither of which should end up in the schema.
    fn flush_into(self, schema: &mut PostgresSchema) {
        let (Some(name), Some(kind)) = (self.name, self.kind) else {
            return;
        };

        if name.is_empty() || self.columns.is_empty() {
            return;
        }

        schema.relations_mut(kind).push(PostgresRelation {
            name,
            description: self.description,
            columns: self.columns,
        });
    }
}
