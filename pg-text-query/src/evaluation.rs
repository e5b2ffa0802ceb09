//! Runs a suite of natural language requests through a model and compares the generated
//! sql to the expected queries.
//!
//! A test directory contains a test case file (by default `test_prompts.json`) mapping a
//! category name to its cases, and a `test_schemas` directory with the schema documents
//! the cases refer to.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use crate::completion::{CompletionParams, CompletionType, QueryGenerator};
use crate::normalized_sql::NormalizedSql;
use crate::prompt::{describe_database, render_template};
use crate::{PgTextQueryError, PostgresDatabase, Result};

pub const DEFAULT_TEMPLATE: &str =
    "A PostgreSQL Query to SELECT 1 and a PostgreSQL query to {user_prompt}";

pub const SCHEMA_DIR: &str = "test_schemas";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestCaseId {
    Number(i64),
    Text(String),
}

impl Display for TestCaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TestCaseId::Number(n) => write!(f, "{n}"),
            TestCaseId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct PromptTestCase {
    pub id: TestCaseId,
    pub prompt: String,
    pub expected_outputs: Vec<String>,
    /// File name of the schema document, relative to the [`SCHEMA_DIR`].
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub test_cases: TestCasesSection,
    #[serde(default)]
    pub model: ModelSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptSection {
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for PromptSection {
    fn default() -> Self {
        Self {
            template: default_template(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestCasesSection {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for TestCasesSection {
    fn default() -> Self {
        Self {
            category: default_category(),
            filename: default_filename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ModelSection {
    #[serde(default, rename = "type")]
    pub completion_type: CompletionType,
    #[serde(default)]
    pub params: CompletionParams,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_category() -> String {
    "one_test".to_string()
}

fn default_filename() -> String {
    "test_prompts.json".to_string()
}

impl EvaluationConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub id: TestCaseId,
    pub user_prompt: String,
    pub task_prompt: String,
    pub prompt: String,
    pub expected_outputs: Vec<String>,
    pub sql_output: String,
    pub success: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub task_prompt: String,
    pub results: Vec<EvaluationResult>,
    pub total: usize,
    pub successful: usize,
}

/// True when `actual` matches any of the expected queries.
pub fn sql_matches<S: AsRef<str>>(expected_outputs: &[S], actual: &str) -> bool {
    let actual = NormalizedSql::from(actual);
    expected_outputs
        .iter()
        .any(|expected| NormalizedSql::from(expected.as_ref()) == actual)
}

/// Reads the cases of the configured category from the test case file in `test_dir`.
pub fn load_test_cases(test_dir: &Path, config: &TestCasesSection) -> Result<Vec<PromptTestCase>> {
    let content = std::fs::read_to_string(test_dir.join(&config.filename))?;
    let mut categories: BTreeMap<String, Vec<PromptTestCase>> = serde_json::from_str(&content)?;

    categories
        .remove(&config.category)
        .ok_or_else(|| PgTextQueryError::UnknownTestCategory(config.category.clone()))
}

pub struct Evaluator<'a> {
    generator: &'a QueryGenerator<'a>,
    config: &'a EvaluationConfig,
    schema_dir: PathBuf,
    schemas: BTreeMap<String, PostgresDatabase>,
}

impl<'a> Evaluator<'a> {
    pub fn new(generator: &'a QueryGenerator<'a>, config: &'a EvaluationConfig, test_dir: &Path) -> Self {
        Self {
            generator,
            config,
            schema_dir: test_dir.join(SCHEMA_DIR),
            schemas: BTreeMap::new(),
        }
    }

    fn schema(&mut self, name: &str) -> Result<&PostgresDatabase> {
        if !self.schemas.contains_key(name) {
            let content = std::fs::read_to_string(self.schema_dir.join(name))?;
            let db = PostgresDatabase::from_json(&content)?;
            self.schemas.insert(name.to_string(), db);
        }

        Ok(&self.schemas[name])
    }

    #[instrument(skip_all, fields(id = %case.id))]
    pub async fn evaluate_case(&mut self, case: &PromptTestCase) -> Result<EvaluationResult> {
        let template = self.config.prompt.template.clone();
        let schema = describe_database(self.schema(&case.schema)?, true);
        let prompt = render_template(&template, &schema, &case.prompt);

        let sql_output = self
            .generator
            .generate(
                self.config.model.completion_type,
                &prompt,
                None,
                &self.config.model.params,
                false,
            )
            .await?;

        let success = sql_matches(&case.expected_outputs, &sql_output);

        if success {
            info!(user_prompt = %case.prompt, generated = %sql_output.trim(), "SUCCESS");
        } else {
            error!(
                user_prompt = %case.prompt,
                generated = %sql_output.trim(),
                expected = ?case.expected_outputs,
                "FAILURE"
            );
        }

        Ok(EvaluationResult {
            id: case.id.clone(),
            user_prompt: case.prompt.clone(),
            task_prompt: template,
            prompt,
            expected_outputs: case.expected_outputs.clone(),
            sql_output,
            success,
        })
    }

    pub async fn evaluate(&mut self, cases: &[PromptTestCase]) -> Result<EvaluationReport> {
        let mut results = Vec::with_capacity(cases.len());

        for case in cases {
            results.push(self.evaluate_case(case).await?);
        }

        let successful = results.iter().filter(|r| r.success).count();
        info!(total = results.len(), successful, "finished evaluation");

        Ok(EvaluationReport {
            task_prompt: self.config.prompt.template.clone(),
            total: results.len(),
            successful,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionConfig, CompletionProvider};
    use async_trait::async_trait;
    use indoc::indoc;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Answers every request with the next canned response.
    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(vec![]),
            }
        }

        fn next(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.responses.lock().unwrap().pop().unwrap_or_default())
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String> {
            self.next(prompt)
        }

        async fn chat(&self, _system: Option<&str>, user: &str, _params: &CompletionParams) -> Result<String> {
            self.next(user)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const PENGUINS_SCHEMA: &str = r#"{
        "name": "bitdotio/palmerpenguins",
        "schemata": [{
            "name": "public",
            "tables": [{
                "name": "penguins",
                "columns": [
                    {"name": "species", "data_type": "text"},
                    {"name": "island", "data_type": "text"}
                ]
            }]
        }]
    }"#;

    const TEST_CASES: &str = r#"{
        "easy": [
            {"id": 1, "prompt": "count the penguins", "expected_outputs": ["SELECT COUNT(*) FROM penguins;"], "schema": "penguins.json"},
            {"id": "islands", "prompt": "list the islands", "expected_outputs": ["SELECT DISTINCT island FROM penguins", "SELECT island FROM penguins GROUP BY island"], "schema": "penguins.json"}
        ]
    }"#;

    fn create_test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pgtq_evaluation_{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(dir.join(SCHEMA_DIR)).unwrap();
        std::fs::write(dir.join(SCHEMA_DIR).join("penguins.json"), PENGUINS_SCHEMA).unwrap();
        std::fs::write(dir.join("test_prompts.json"), TEST_CASES).unwrap();
        dir
    }

    #[test]
    fn matches_any_expected_output() {
        let expected = ["SELECT DISTINCT island FROM penguins", "SELECT island FROM penguins GROUP BY island"];

        assert!(sql_matches(&expected, "select island\nfrom penguins\ngroup by island;"));
        assert!(!sql_matches(&expected, "SELECT species FROM penguins"));
        assert!(!sql_matches::<&str>(&[], "SELECT 1"));
    }

    #[test]
    fn joined_tokens_do_not_match() {
        assert!(!sql_matches(&["SELECT a b FROM t"], "SELECT ab FROM t"));
        assert!(!sql_matches(
            &["SELECT COUNT(*) FROM penguins WHERE island = 'Torgersen Island'"],
            "SELECT COUNT(*) FROM penguins WHERE island = 'TorgersenIsland'"
        ));
    }

    #[test]
    fn reads_config_with_defaults() {
        let config = EvaluationConfig::from_yaml(indoc! {"
            test_cases:
              category: easy
            model:
              type: single
              params:
                temperature: 0.2
        "})
        .unwrap();

        assert_eq!(config.prompt.template, DEFAULT_TEMPLATE);
        assert_eq!(config.test_cases.category, "easy");
        assert_eq!(config.test_cases.filename, "test_prompts.json");
        assert_eq!(config.model.completion_type, CompletionType::Single);
        assert_eq!(config.model.params, CompletionParams::new().with("temperature", 0.2));

        let defaults = EvaluationConfig::from_yaml("{}").unwrap();
        assert_eq!(defaults.model.completion_type, CompletionType::Chat);
        assert_eq!(defaults.test_cases.category, "one_test");
    }

    #[test]
    fn loads_cases_of_category() {
        let dir = create_test_dir();

        let cases = load_test_cases(
            &dir,
            &TestCasesSection {
                category: "easy".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, TestCaseId::Number(1));
        assert_eq!(cases[1].id.to_string(), "islands");

        let missing = load_test_cases(&dir, &TestCasesSection::default());
        assert!(matches!(missing, Err(PgTextQueryError::UnknownTestCategory(c)) if c == "one_test"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn evaluates_cases() {
        let dir = create_test_dir();
        let config = EvaluationConfig {
            prompt: PromptSection {
                template: "{schema}\n-- A PostgreSQL query to {user_prompt}".to_string(),
            },
            test_cases: TestCasesSection {
                category: "easy".to_string(),
                ..Default::default()
            },
            model: ModelSection::default(),
        };
        let cases = load_test_cases(&dir, &config.test_cases).unwrap();

        let provider = ScriptedProvider::new(&["select count(*) from penguins", "SELECT species FROM penguins"]);
        let completion_config = CompletionConfig::load(None).unwrap();
        let generator = QueryGenerator::new(&provider, &completion_config);
        let mut evaluator = Evaluator::new(&generator, &config, &dir);

        let report = evaluator.evaluate(&cases).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 1);
        assert!(report.results[0].success);
        assert!(!report.results[1].success);
        assert_eq!(
            report.results[0].prompt,
            "-- Table = \"penguins\", columns = [species text, island text]\n-- A PostgreSQL query to count the penguins"
        );
        assert_eq!(provider.prompts.lock().unwrap().len(), 2);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
