use tokio_postgres::Row;
use crate::postgres_client_wrapper::FromRow;
use crate::PostgresColumn;

/// One row of [`GET_DB_SCHEMA_SQL`]. Database, schema and relation level values are
/// repeated on every column row of the same group.
#[derive(Debug, Eq, PartialEq, Default, Clone)]
pub struct SchemaRow {
    pub database_name: Option<String>,
    pub database_description: Option<String>,
    pub schema_name: String,
    pub schema_description: Option<String>,
    pub relation_name: Option<String>,
    pub relation_type: Option<String>,
    pub relation_description: Option<String>,
    pub column: ColumnFields,
}

/// The `schemata.tables.columns.*` part of a [`SchemaRow`].
///
/// Every field is nullable since schemas without tables and tables without
/// columns still produce a row through the left joins.
#[derive(Debug, Eq, PartialEq, Default, Clone)]
pub struct ColumnFields {
    pub name: Option<String>,
    pub ordinal_position: Option<i32>,
    pub column_default: Option<String>,
    pub is_nullable: Option<String>,
    pub data_type: Option<String>,
    pub character_maximum_length: Option<i32>,
    pub description: Option<String>,
}

impl ColumnFields {
    /// Returns `None` for the placeholder rows the left joins produce.
    pub fn to_postgres_column(&self) -> Option<PostgresColumn> {
        let name = self.name.as_ref()?;

        Some(PostgresColumn {
            name: name.clone(),
            data_type: self.data_type.clone().unwrap_or_default(),
            is_nullable: self.is_nullable.clone(),
            column_default: self.column_default.clone(),
            character_maximum_length: self.character_maximum_length,
            ordinal_position: self.ordinal_position.unwrap_or_default(),
            description: self.description.clone(),
        })
    }
}

impl FromRow for SchemaRow {
    fn from_row(row: Row) -> crate::Result<Self> {
        Ok(SchemaRow {
            database_name: row.try_get("name")?,
            database_description: row.try_get("description")?,
            schema_name: row.try_get("schemata.name")?,
            schema_description: row.try_get("schemata.description")?,
            relation_name: row.try_get("schemata.tables.name")?,
            relation_type: row.try_get("schemata.tables.type")?,
            relation_description: row.try_get("schemata.tables.description")?,
            column: ColumnFields {
                name: row.try_get("schemata.tables.columns.name")?,
                ordinal_position: row.try_get("schemata.tables.columns.ordinal_position")?,
                column_default: row.try_get("schemata.tables.columns.column_default")?,
                is_nullable: row.try_get("schemata.tables.columns.is_nullable")?,
                data_type: row.try_get("schemata.tables.columns.data_type")?,
                character_maximum_length: row
                    .try_get("schemata.tables.columns.character_maximum_length")?,
                description: row.try_get("schemata.tables.columns.description")?,
            },
        })
    }
}

// The concat operator || is used to build relation names, not concat(), so a missing table
// yields NULL instead of asking obj_description about the relation ".".
//language=postgresql
pub(crate) const GET_DB_SCHEMA_SQL: &str = r#"
SELECT
    (SELECT pg_catalog.shobj_description(d.oid, 'pg_database')
     FROM pg_catalog.pg_database d
     WHERE d.datname = $1::text) AS "description",
    "information_schema"."schemata"."catalog_name"::text AS "name",
    "information_schema"."schemata"."schema_name"::text AS "schemata.name",
    "information_schema"."tables"."table_name"::text AS "schemata.tables.name",
    "information_schema"."tables"."table_type"::text AS "schemata.tables.type",
    "information_schema"."columns"."column_name"::text AS "schemata.tables.columns.name",
    "information_schema"."columns"."ordinal_position"::int4 AS "schemata.tables.columns.ordinal_position",
    "information_schema"."columns"."column_default"::text AS "schemata.tables.columns.column_default",
    "information_schema"."columns"."is_nullable"::text AS "schemata.tables.columns.is_nullable",
    "information_schema"."columns"."data_type"::text AS "schemata.tables.columns.data_type",
    "information_schema"."columns"."character_maximum_length"::int4 AS "schemata.tables.columns.character_maximum_length",
    obj_description(
        quote_ident("information_schema"."schemata"."schema_name")::regnamespace::oid,
        'pg_namespace'
    ) AS "schemata.description",
    obj_description(
        (quote_ident("information_schema"."schemata"."schema_name") || '.' || quote_ident("information_schema"."tables"."table_name"))::regclass::oid,
        'pg_class'
    ) AS "schemata.tables.description",
    col_description(
        (quote_ident("information_schema"."schemata"."schema_name") || '.' || quote_ident("information_schema"."tables"."table_name"))::regclass::oid,
        "information_schema"."columns"."ordinal_position"::int4
    ) AS "schemata.tables.columns.description"
FROM "information_schema"."schemata"
LEFT JOIN "information_schema"."tables"
    ON "information_schema"."schemata"."schema_name" = "information_schema"."tables"."table_schema"
LEFT JOIN "information_schema"."columns"
    ON "information_schema"."tables"."table_name" = "information_schema"."columns"."table_name"
    AND "information_schema"."tables"."table_schema" = "information_schema"."columns"."table_schema"
WHERE "information_schema"."schemata"."schema_name" NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
ORDER BY "schemata.name", "schemata.tables.name", "schemata.tables.columns.ordinal_position";
"#;
