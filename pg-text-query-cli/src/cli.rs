use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about)]
#[command(propagate_version = true)]
/// Turns natural language requests into PostgreSQL queries.
///
/// Reads the schema of a database, renders it into a prompt and asks an OpenAI compatible
/// completion model to continue it with sql.
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Yaml file with the default request parameters for the completion endpoints. If not
    /// specified, the built-in defaults are used.
    #[arg(long, global = true, env = "PGTQ_OPENAI_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the schema of a database as json
    Schema {
        #[command(flatten)]
        db_args: DbArgs,
    },
    /// Print the prompt that would be sent to the model
    Prompt(PromptArgs),
    /// Generate a query for a natural language request
    Generate(GenerateArgs),
    /// Run a suite of test prompts against the model and print a json report
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// The host of the database
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// The port of the database
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// The username to use when connecting to the database
    #[arg(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    /// The password to use when connecting to the database
    #[arg(long, env = "DB_PW", default_value = "")]
    pub db_password: String,

    /// The name of the database
    #[arg(long, env = "DB_NAME", default_value = "postgres")]
    pub db_name: String,
}

impl DbArgs {
    pub(crate) fn get_connection_string(&self) -> String {
        let mut connection_string = format!(
            "host={} port={} user={} dbname={}",
            self.db_host, self.db_port, self.db_user, self.db_name
        );

        if !self.db_password.is_empty() {
            connection_string.push_str(&format!(" password={}", self.db_password));
        }

        connection_string
    }
}

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
    #[command(flatten)]
    pub db_args: DbArgs,

    /// Read the schema from a json file instead of from the database
    #[arg(long)]
    pub schema_file: Option<PathBuf>,

    /// The natural language request
    #[arg(long)]
    pub text: String,

    /// Leave the column types out of the schema description
    #[arg(long)]
    pub exclude_types: bool,

    /// Use a custom task description in front of the request instead of the default prompt
    #[arg(long)]
    pub task_prompt: Option<String>,

    /// Leave the schema out of a custom prompt
    #[arg(long, requires = "task_prompt")]
    pub no_schema: bool,

    /// Don't end a custom prompt with `SELECT 1;`
    #[arg(long, requires = "task_prompt")]
    pub no_select_1: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub prompt: PromptArgs,

    /// The api key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Use the chat completion endpoint instead of text completion
    #[arg(long)]
    pub chat: bool,

    /// System message to send along with a chat completion
    #[arg(long, requires = "chat")]
    pub system: Option<String>,

    /// Fail if the generated text is not a parsable query
    #[arg(long)]
    pub validate: bool,

    /// Run the generated query against the database and print the rows
    #[arg(long)]
    pub execute: bool,

    /// The maximum number of rows to print when executing
    #[arg(long, default_value_t = 50)]
    pub max_rows: usize,

    /// Overrides the configured sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Yaml file describing the template, test cases and model to evaluate
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Directory with the test case file and the `test_schemas` directory
    #[arg(long, default_value = ".")]
    pub test_dir: PathBuf,

    /// The api key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}
