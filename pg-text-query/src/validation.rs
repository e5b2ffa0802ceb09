use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser as SqlParser;
use tracing::debug;

/// Checks that generated text is a usable query.
///
/// Rejects text that is empty, that only contains comments, or that does not parse as
/// PostgreSQL.
pub fn is_valid_query(sql: &str) -> bool {
    let dialect = PostgreSqlDialect {};

    match SqlParser::parse_sql(&dialect, sql) {
        Ok(statements) => !statements.is_empty(),
        Err(e) => {
            debug!(error = %e, "generated query does not parse");
            false
        }
    }
}
