//! Sends prompts to a completion model and returns the sql it generates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use crate::validation::is_valid_query;
use crate::{PgTextQueryError, Result};

mod config;
mod openai;

pub use config::*;
pub use openai::*;

pub const INVALID_QUERY_MESSAGE: &str = "Generated query is empty, only a comment, or invalid.";

/// Which endpoint a prompt is sent to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionType {
    /// Plain text completion, the prompt is continued.
    Single,
    /// Chat completion, the prompt is sent as the user message.
    #[default]
    Chat,
}

/// A model that can continue a prompt.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Continues `prompt` using the text completion endpoint.
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String>;
    /// Answers `user` using the chat completion endpoint, optionally framed by a system message.
    async fn chat(&self, system: Option<&str>, user: &str, params: &CompletionParams) -> Result<String>;
    /// Human readable name of the provider.
    fn name(&self) -> &str;
}

/// Generates queries through a [`CompletionProvider`], using the request defaults from a
/// [`CompletionConfig`].
pub struct QueryGenerator<'a> {
    provider: &'a dyn CompletionProvider,
    config: &'a CompletionConfig,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, config: &'a CompletionConfig) -> Self {
        Self { provider, config }
    }

    /// Generates a query from a text completion of `prompt`.
    ///
    /// `overrides` replace the configured default parameters key by key. With
    /// `validate_sql` set, output that [`is_valid_query`] rejects is returned as an error.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn generate_query(
        &self,
        prompt: &str,
        overrides: &CompletionParams,
        validate_sql: bool,
    ) -> Result<String> {
        let params = self.config.completion_create.with_overrides(overrides);
        let query = self.provider.complete(prompt, &params).await?;
        info!(query_length = query.len(), "generated query");

        check_query(query, validate_sql)
    }

    /// Like [`QueryGenerator::generate_query`], but through the chat endpoint.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn generate_query_chat(
        &self,
        prompt: &str,
        system: Option<&str>,
        overrides: &CompletionParams,
        validate_sql: bool,
    ) -> Result<String> {
        let params = self.config.chat_completion_create.with_overrides(overrides);
        let query = self.provider.chat(system, prompt, &params).await?;
        info!(query_length = query.len(), "generated query from chat");

        check_query(query, validate_sql)
    }

    pub async fn generate(
        &self,
        completion_type: CompletionType,
        prompt: &str,
        system: Option<&str>,
        overrides: &CompletionParams,
        validate_sql: bool,
    ) -> Result<String> {
        match completion_type {
            CompletionType::Single => self.generate_query(prompt, overrides, validate_sql).await,
            CompletionType::Chat => {
                self.generate_query_chat(prompt, system, overrides, validate_sql)
                    .await
            }
        }
    }
}

fn check_query(query: String, validate_sql: bool) -> Result<String> {
    if validate_sql && !is_valid_query(&query) {
        warn!(query = %query, "rejected generated query");
        return Err(PgTextQueryError::QueryGen(INVALID_QUERY_MESSAGE.to_string()));
    }

    Ok(query)
}
