//! sql-scout - ask business questions, get SQL, give feedback.
//!
//! Everything here is presentation glue: a line-based read-eval loop over
//! the [`Assistant`], which owns the actual control flow.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use sql_scout::app::{Assistant, FeedbackOutcome};
use sql_scout::cli::Cli;
use sql_scout::config::{Config, DbConfig, LlmSettings};
use sql_scout::db::{MySqlExecutor, QueryResult};
use sql_scout::error::ScoutError;
use sql_scout::feedback::MySqlFeedbackStore;
use sql_scout::llm::create_client;
use sql_scout::logging;
use sql_scout::schema::SchemaContext;
use sql_scout::session::QuerySlot;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let db_config = resolve_database(&cli, &config)?;
    // Fail fast on missing required values before any external call.
    db_config.validate().context("Invalid database settings")?;

    let llm_settings = resolve_llm(&cli, &config)?;
    let client = create_client(&llm_settings).context("Failed to set up the completion client")?;

    let schema = match cli
        .schema_file
        .as_deref()
        .or(config.schema.context_file.as_deref())
    {
        Some(path) => SchemaContext::from_file(path)?,
        None => SchemaContext::builtin(),
    };

    let executor = Arc::new(MySqlExecutor::new(&db_config)?);
    let store = MySqlFeedbackStore::new(&db_config)?;
    if let Err(e) = store.ensure_table().await {
        // Feedback stays unavailable until the table exists; the
        // generation loop itself still works.
        warn!("Could not bootstrap the feedback table: {e}");
    }

    let mut assistant = Assistant::new(client, schema, executor, Arc::new(store));

    println!("sql-scout v{}", env!("CARGO_PKG_VERSION"));
    println!("Target: {}", db_config.display_string());
    println!("Type a question, then :execute, :good, or :bad. :help lists commands.");

    repl(&mut assistant).await
}

/// Resolves the database config with precedence: CLI args, then the config
/// file, then DB_* environment variables.
fn resolve_database(cli: &Cli, config: &Config) -> anyhow::Result<DbConfig> {
    let mut db_config = config.database.clone();
    if let Some(cli_config) = cli.to_db_config()? {
        db_config.merge(&cli_config);
    }
    db_config.apply_env_defaults();
    Ok(db_config)
}

/// Resolves LLM settings with the same precedence as the database config.
fn resolve_llm(cli: &Cli, config: &Config) -> anyhow::Result<LlmSettings> {
    let mut llm_config = config.llm.clone();
    if let Some(provider) = &cli.llm {
        llm_config.provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        llm_config.model = model.clone();
    }
    llm_config.apply_env_defaults();
    Ok(llm_config.settings()?)
}

async fn repl(assistant: &mut Assistant) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            if !dispatch(assistant, command).await {
                break;
            }
        } else {
            ask(assistant, line).await;
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

/// Runs one command. Returns false when the loop should exit.
async fn dispatch(assistant: &mut Assistant, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next();

    match name.as_str() {
        "help" | "h" => print_help(),
        "show" | "s" => print_state(assistant),
        "tables" | "t" => match assistant.list_tables().await {
            Ok(tables) if tables.is_empty() => println!("Connected; no tables visible."),
            Ok(tables) => {
                println!("Connected. Tables:");
                for table in tables {
                    println!("  {table}");
                }
            }
            Err(e) => report(&e),
        },
        "execute" | "x" => {
            let slot = match argument.map(str::parse::<QuerySlot>) {
                Some(Ok(slot)) => Some(slot),
                Some(Err(e)) => {
                    println!("{e}");
                    return true;
                }
                None => None,
            };
            let result = match slot {
                Some(slot) => assistant.execute(slot).await,
                None => assistant.execute_current().await,
            };
            match result {
                Ok(result) => print_result(&result),
                Err(e) => report(&e),
            }
        }
        "good" | "bad" => give_feedback(assistant, name == "good").await,
        "quit" | "exit" | "q" => return false,
        other => println!("Unknown command ':{other}'. :help lists commands."),
    }

    true
}

async fn ask(assistant: &mut Assistant, question: &str) {
    println!("Generating SQL...");
    match assistant.submit_question(question).await {
        Ok(sql) => {
            println!("\nGenerated SQL:");
            println!("{}", indent(&sql));
            println!("\nRun it with :execute, or judge it with :good / :bad.");
        }
        Err(e) => report(&e),
    }
}

async fn give_feedback(assistant: &mut Assistant, accepted: bool) {
    match assistant.record_feedback(accepted).await {
        Ok(FeedbackOutcome::Accepted { .. }) => {
            println!("Thanks, feedback saved.");
        }
        Ok(FeedbackOutcome::Rejected {
            refinement: Ok(sql),
            ..
        }) => {
            println!("Feedback saved.\n\nImproved SQL:");
            println!("{}", indent(&sql));
            println!("\nRun it with :execute, or judge it with :good / :bad.");
        }
        Ok(FeedbackOutcome::Rejected {
            refinement: Err(e), ..
        }) => {
            println!("Feedback saved, but no improved query could be generated.");
            report(&e);
            println!("The previous query is still available (:execute original).");
        }
        Err(e) => report(&e),
    }
}

fn report(error: &ScoutError) {
    println!("{}: {error}", error.category());
}

fn print_help() {
    println!("Commands:");
    println!("  <question>            Generate SQL for a new question");
    println!("  :execute [original|refined]   Run the current (or named) query");
    println!("  :good                 Save positive feedback; settles the question");
    println!("  :bad                  Save negative feedback and request a revision");
    println!("  :show                 Show the session state");
    println!("  :tables               Connection smoke test (SHOW TABLES)");
    println!("  :quit                 Exit");
}

fn print_state(assistant: &Assistant) {
    println!("Phase: {}", assistant.phase());
    match assistant.question() {
        Some(question) => println!("Question: {question}"),
        None => println!("Question: (none)"),
    }
    if let Some(sql) = assistant.generated_sql() {
        println!("Generated SQL:\n{}", indent(sql));
    }
    if let Some(sql) = assistant.refined_sql() {
        println!("Refined SQL:\n{}", indent(sql));
    }
    if let Some(failure) = assistant.last_error() {
        println!("Last execution error ({}): {}", failure.kind, failure.message);
    }
    println!(
        "Feedback recorded: {}",
        if assistant.feedback_given() { "yes" } else { "no" }
    );
}

fn print_result(result: &QueryResult) {
    if result.columns.is_empty() {
        println!("(empty result)");
        return;
    }

    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.name.len()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, &w)| format!("{:<w$}", c.name))
        .collect();
    println!("{}", header.join(" | "));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );

    for row in &rendered {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        println!("{}", cells.join(" | "));
    }

    println!(
        "{} row(s) in {:.1?}{}",
        result.row_count,
        result.execution_time,
        if result.was_truncated {
            " (truncated)"
        } else {
            ""
        }
    );
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
