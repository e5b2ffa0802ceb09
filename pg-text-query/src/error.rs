use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgTextQueryError {
    #[error("Error from postgres: `{0}`")]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Error from postgres: `{query}` when executing query: `{source}`")]
    PostgresErrorWithQuery {
        query: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("io error: `{0}`")]
    IoError(#[from] std::io::Error),

    #[error("Invalid json: `{0}`")]
    Json(#[from] serde_json::Error),

    #[error("Invalid yaml: `{0}`")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} not found in environment")]
    MissingEnvVar(String),

    #[error("Completion request failed: `{0}`")]
    CompletionRequest(#[from] reqwest::Error),

    #[error("Unexpected completion response: {0}")]
    InvalidCompletionResponse(String),

    #[error("{0}")]
    QueryGen(String),

    #[error("Unknown test case category '{0}'")]
    UnknownTestCategory(String),
}

pub type Result<T = ()> = std::result::Result<T, PgTextQueryError>;
