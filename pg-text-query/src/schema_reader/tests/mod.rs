
use super::*;
use crate::test_helpers::TestHelper;
use pg_text_query_test_macros::pg_test;
use similar_asserts::assert_eq;

pub async fn introspect_schema(test_helper: &TestHelper) -> PostgresDatabase {
    let conn = test_helper.get_conn();
    let reader = SchemaReader::new(conn);
    reader.introspect_database(&test_helper.test_db_name).await.unwrap()
}

async fn test_introspection(
    helper: &TestHelper,
    create_table_statement: &str,
    expected_schemata: Vec<PostgresSchema>,
) {
    helper.execute_not_query(create_table_statement).await;

    let db = introspect_schema(helper).await;

    assert_eq!(db.name.as_deref(), Some(helper.test_db_name.as_str()));
    assert_eq!(db.schemata, expected_schemata)
}

fn public_schema(tables: Vec<PostgresRelation>) -> PostgresSchema {
    PostgresSchema {
        name: "public".to_string(),
        description: Some("standard public schema".to_string()),
        tables,
        ..Default::default()
    }
}

fn column(name: &str, data_type: &str, ordinal_position: i32) -> PostgresColumn {
    PostgresColumn {
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: Some("YES".to_string()),
        ordinal_position,
        ..Default::default()
    }
}

#[pg_test(arg(postgres = 14))]
#[pg_test(arg(postgres = 15))]
#[pg_test(arg(postgres = 16))]
async fn reads_simple_schema(helper: &TestHelper) {
    test_introspection(
        helper,
        r#"
    create table penguins(
        id serial primary key,
        species text not null,
        island varchar(40),
        bill_length_mm double precision
    );
    "#,
        vec![public_schema(vec![PostgresRelation {
            name: "penguins".to_string(),
            description: None,
            columns: vec![
                PostgresColumn {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    is_nullable: Some("NO".to_string()),
                    column_default: Some("nextval('penguins_id_seq'::regclass)".to_string()),
                    ordinal_position: 1,
                    ..Default::default()
                },
                PostgresColumn {
                    is_nullable: Some("NO".to_string()),
                    ..column("species", "text", 2)
                },
                PostgresColumn {
                    character_maximum_length: Some(40),
                    ..column("island", "character varying", 3)
                },
                column("bill_length_mm", "double precision", 4),
            ],
        }])],
    )
    .await;
}

#[pg_test(arg(postgres = 16))]
async fn excludes_system_schemas(helper: &TestHelper) {
    let db = introspect_schema(helper).await;

    for system_schema in ["pg_catalog", "information_schema", "pg_toast"] {
        assert!(db.get_schema(system_schema).is_none(), "{system_schema} was introspected");
    }
}

#[pg_test(arg(postgres = 16))]
async fn keeps_schemas_without_relations(helper: &TestHelper) {
    test_introspection(
        helper,
        r#"
    create schema empty_schema;
    create table column_less();
    "#,
        vec![
            PostgresSchema::new("empty_schema"),
            public_schema(vec![]),
        ],
    )
    .await;
}

#[pg_test(arg(postgres = 16))]
async fn reads_multiple_schemas_in_order(helper: &TestHelper) {
    test_introspection(
        helper,
        r#"
    create schema zoo;
    create table zoo.keepers(name text);
    create table zoo.animals(name text, legs int);
    create table public.visits(day date);
    "#,
        vec![
            public_schema(vec![PostgresRelation {
                name: "visits".to_string(),
                description: None,
                columns: vec![column("day", "date", 1)],
            }]),
            PostgresSchema {
                name: "zoo".to_string(),
                tables: vec![
                    PostgresRelation {
                        name: "animals".to_string(),
                        description: None,
                        columns: vec![column("name", "text", 1), column("legs", "integer", 2)],
                    },
                    PostgresRelation {
                        name: "keepers".to_string(),
                        description: None,
                        columns: vec![column("name", "text", 1)],
                    },
                ],
                ..Default::default()
            },
        ],
    )
    .await;
}
