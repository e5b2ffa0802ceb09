use crate::{PgTextQueryError, Result};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSqlOwned, ToSql};
use tokio_postgres::{Client, NoTls, Row, SimpleQueryMessage};
use tracing::instrument;

pub struct PostgresClientWrapper {
    client: Client,
    join_handle: JoinHandle<Result<()>>,
}

impl PostgresClientWrapper {
    #[instrument(skip_all)]
    pub async fn new(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

        // The connection object performs the actual communication with the database,
        // so spawn it off to run on its own.
        let join_handle = tokio::spawn(async move {
            match connection.await {
                Err(e) => Err(PgTextQueryError::PostgresError(e)),
                Ok(_) => Ok(()),
            }
        });

        Ok(PostgresClientWrapper {
            client,
            join_handle,
        })
    }

    pub async fn execute_non_query(&self, sql: &str) -> Result {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| PgTextQueryError::PostgresErrorWithQuery {
                source: e,
                query: sql.to_string(),
            })?;

        Ok(())
    }

    pub async fn get_results<T: FromRow>(&self, sql: &str) -> Result<Vec<T>> {
        self.get_results_with_params(sql, &[]).await
    }

    pub async fn get_results_with_params<T: FromRow>(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<T>> {
        let query_results = self.client.query(sql, params).await.map_err(|e| {
            PgTextQueryError::PostgresErrorWithQuery {
                source: e,
                query: sql.to_string(),
            }
        })?;

        let mut output = Vec::with_capacity(query_results.len());

        for row in query_results.into_iter() {
            output.push(T::from_row(row)?);
        }

        Ok(output)
    }

    /// Runs arbitrary sql over the simple query protocol and returns at most `limit` rows
    /// with every value in its text representation.
    ///
    /// Used for running generated queries, where the result shape is not known up front.
    /// When the sql holds several statements, the rows of the last statement that
    /// returned any are kept.
    #[instrument(skip(self))]
    pub async fn get_text_rows(&self, sql: &str, limit: usize) -> Result<TextQueryOutput> {
        let messages = self.client.simple_query(sql).await.map_err(|e| {
            PgTextQueryError::PostgresErrorWithQuery {
                source: e,
                query: sql.to_string(),
            }
        })?;

        let mut output = TextQueryOutput::default();
        let mut current = TextQueryOutput::default();

        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    if current.columns.is_empty() {
                        current.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }

                    if current.rows.len() >= limit {
                        current.truncated = true;
                        continue;
                    }

                    let values = (0..row.len())
                        .map(|idx| row.get(idx).map(|v| v.to_string()))
                        .collect();

                    current.rows.push(values);
                }
                SimpleQueryMessage::CommandComplete(_) => {
                    if !current.columns.is_empty() {
                        output = std::mem::take(&mut current);
                    }
                }
                _ => {}
            }
        }

        Ok(output)
    }
}

impl Drop for PostgresClientWrapper {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

/// The rows returned by [`PostgresClientWrapper::get_text_rows`].
#[derive(Debug, Default, Eq, PartialEq, Serialize)]
pub struct TextQueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Set when the query returned more rows than were kept.
    pub truncated: bool,
}

pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl<T1: FromSqlOwned> FromRow for (T1,) {
    fn from_row(row: Row) -> Result<Self> {
        Ok((row.try_get(0)?,))
    }
}
