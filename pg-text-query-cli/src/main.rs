use crate::cli::{Commands, DbArgs, EvaluateArgs, GenerateArgs, PromptArgs};
use clap::Parser;
use pg_text_query::completion::{
    CompletionConfig, CompletionParams, CompletionType, OpenAiClient, QueryGenerator,
};
use pg_text_query::evaluation::{load_test_cases, EvaluationConfig, Evaluator};
use pg_text_query::prompt::{custom_prompt, default_prompt, CustomPromptOptions};
use pg_text_query::{PostgresClientWrapper, PostgresDatabase, Result, SchemaReader};
use std::path::Path;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    run(cli).await?;

    Ok(())
}

#[instrument(skip_all)]
async fn run(cli: cli::Cli) -> Result<()> {
    match cli.command {
        Commands::Schema { db_args } => {
            let db = read_schema(&db_args).await?;
            println!("{}", db.to_json_pretty()?);
        }
        Commands::Prompt(prompt_args) => {
            let db = load_schema(&prompt_args).await?;
            println!("{}", render_prompt(&prompt_args, &db));
        }
        Commands::Generate(generate_args) => {
            let completion_config = CompletionConfig::load(cli.config.as_deref())?;
            do_generate(generate_args, &completion_config).await?;
        }
        Commands::Evaluate(evaluate_args) => {
            let completion_config = CompletionConfig::load(cli.config.as_deref())?;
            do_evaluate(evaluate_args, &completion_config).await?;
        }
    }

    Ok(())
}

async fn read_schema(db_args: &DbArgs) -> Result<PostgresDatabase> {
    let connection = PostgresClientWrapper::new(&db_args.get_connection_string()).await?;
    let reader = SchemaReader::new(&connection);

    reader.introspect_database(&db_args.db_name).await
}

async fn load_schema(prompt_args: &PromptArgs) -> Result<PostgresDatabase> {
    match &prompt_args.schema_file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            PostgresDatabase::from_json(&content)
        }
        None => read_schema(&prompt_args.db_args).await,
    }
}

fn render_prompt(prompt_args: &PromptArgs, db: &PostgresDatabase) -> String {
    let include_types = !prompt_args.exclude_types;

    match &prompt_args.task_prompt {
        Some(task_prompt) => custom_prompt(
            task_prompt,
            &prompt_args.text,
            db,
            &CustomPromptOptions {
                include_schema: !prompt_args.no_schema,
                include_types,
                add_select_1: !prompt_args.no_select_1,
            },
        ),
        None => default_prompt(&prompt_args.text, db, include_types),
    }
}

#[instrument(skip_all)]
async fn do_generate(args: GenerateArgs, completion_config: &CompletionConfig) -> Result<()> {
    let db = load_schema(&args.prompt).await?;
    let prompt = render_prompt(&args.prompt, &db);

    let client = OpenAiClient::from_key_or_env(args.api_key.as_deref(), &completion_config.api_base)?;
    let generator = QueryGenerator::new(&client, completion_config);

    let mut overrides = CompletionParams::new();
    if let Some(temperature) = args.temperature {
        overrides = overrides.with("temperature", temperature);
    }

    let completion_type = if args.chat {
        CompletionType::Chat
    } else {
        CompletionType::Single
    };

    let query = generator
        .generate(
            completion_type,
            &prompt,
            args.system.as_deref(),
            &overrides,
            args.validate,
        )
        .await?;
    println!("{}", query.trim());

    if args.execute {
        let connection = PostgresClientWrapper::new(&args.prompt.db_args.get_connection_string()).await?;
        let output = connection.get_text_rows(&query, args.max_rows).await?;
        info!(rows = output.rows.len(), truncated = output.truncated, "executed generated query");
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

#[instrument(skip_all)]
async fn do_evaluate(args: EvaluateArgs, completion_config: &CompletionConfig) -> Result<()> {
    let config = match &args.config_file {
        Some(path) => EvaluationConfig::from_file(path)?,
        None => EvaluationConfig::default(),
    };

    let test_dir: &Path = &args.test_dir;
    let cases = load_test_cases(test_dir, &config.test_cases)?;
    info!(category = %config.test_cases.category, cases = cases.len(), "loaded test cases");

    let client = OpenAiClient::from_key_or_env(args.api_key.as_deref(), &completion_config.api_base)?;
    let generator = QueryGenerator::new(&client, completion_config);
    let mut evaluator = Evaluator::new(&generator, &config, test_dir);

    let report = evaluator.evaluate(&cases).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
