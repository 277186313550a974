mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codejudge_common::types::Language;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codejudge")]
#[command(about = "CodeJudge CLI - Browse problems, run and submit solutions", long_about = None)]
struct Cli {
    /// Signed-in user id (required for run, submit, exec and profile)
    #[arg(short, long, global = true, env = "CODEJUDGE_USER")]
    user: Option<String>,

    /// E-mail of the signed-in user, used for the default display name
    #[arg(long, global = true, env = "CODEJUDGE_EMAIL", default_value = "")]
    email: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List problems in the catalog
    Problems {
        /// Case-insensitive match against title or description
        #[arg(short, long)]
        search: Option<String>,

        /// Easy, Medium or Hard
        #[arg(short, long)]
        difficulty: Option<String>,
    },

    /// Show a problem with its example test cases
    Show {
        /// Problem id (e.g., two-sum)
        id: String,
    },

    /// List supported languages
    Languages,

    /// Run a solution against the visible test cases
    Run {
        /// Problem id
        id: String,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Language (defaults to JUDGE_LANGUAGE or cpp)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Submit a solution against visible and hidden test cases
    Submit {
        /// Problem id
        id: String,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Language (defaults to JUDGE_LANGUAGE or cpp)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Execute a program once with custom input
    Exec {
        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// Text passed as standard input
        #[arg(long, conflicts_with = "stdin_file")]
        stdin: Option<String>,

        /// File passed as standard input
        #[arg(long)]
        stdin_file: Option<PathBuf>,

        /// Language (defaults to JUDGE_LANGUAGE or cpp)
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Show progress of the signed-in user
    Profile {
        /// Change the display name (at least 2 characters)
        #[arg(long)]
        set_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut ctx = commands::Context::load(cli.user.as_deref(), &cli.email)?;

    match cli.command {
        Commands::Problems { search, difficulty } => {
            commands::list_problems(&ctx, search.as_deref(), difficulty.as_deref())?;
        }
        Commands::Show { id } => {
            commands::show_problem(&ctx, &id)?;
        }
        Commands::Languages => {
            commands::list_languages(&ctx);
        }
        Commands::Run { id, file, language } => {
            commands::run_problem(&ctx, &id, &file, language).await?;
        }
        Commands::Submit { id, file, language } => {
            commands::submit_problem(&ctx, &id, &file, language).await?;
        }
        Commands::Exec {
            file,
            stdin,
            stdin_file,
            language,
        } => {
            commands::execute(&ctx, &file, stdin, stdin_file.as_deref(), language).await?;
        }
        Commands::Profile { set_name } => {
            commands::show_profile(&mut ctx, set_name.as_deref()).await?;
        }
    }

    Ok(())
}
