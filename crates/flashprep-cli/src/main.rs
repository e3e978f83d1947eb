use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flashprep_core::question::{FilterCriteria, QuestionDraft, QuestionScope};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flashprep")]
#[command(about = "Flashprep CLI - interview question flashcards", long_about = None)]
struct Cli {
    /// Access token from a previous `flashprep login`
    #[arg(long, env = "FLASHPREP_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Config file to read instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password and print the access token
    Login {
        email: String,
        #[arg(long, env = "FLASHPREP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out the current token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your own questions
    Mine(FilterArgs),
    /// List the public question pool
    Public(FilterArgs),
    /// List tags used across a collection
    Tags {
        /// Read tags from the public pool instead of your own questions
        #[arg(long)]
        public: bool,
    },
    /// Create a question
    Add(DraftArgs),
    /// Replace the content of a question
    Edit {
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete a question
    Delete { id: String },
    /// Generate narration audio for a question
    GenerateAudio { id: String },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Case-insensitive text to find in question or answer
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long, short)]
    pub category: Option<String>,
    #[arg(long, short)]
    pub tag: Option<String>,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[arg(long, short)]
    pub question: String,
    #[arg(long, short)]
    pub answer: String,
    #[arg(long, short)]
    pub category: Option<String>,
    /// Repeat or comma-separate to add several tags
    #[arg(long, short, value_delimiter = ',')]
    pub tag: Vec<String>,
    #[arg(long)]
    pub public: bool,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        let mut criteria = FilterCriteria::new();
        if let Some(search) = args.search {
            criteria = criteria.with_search(search);
        }
        if let Some(category) = args.category {
            criteria = criteria.with_category(category);
        }
        if let Some(tag) = args.tag {
            criteria = criteria.with_tag(tag);
        }
        criteria
    }
}

impl From<DraftArgs> for QuestionDraft {
    fn from(args: DraftArgs) -> Self {
        QuestionDraft {
            category: args.category,
            tags: args.tag,
            is_public: args.public,
            ..QuestionDraft::new(args.question, args.answer)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config.as_deref(), cli.token, cli.json)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, &password).await?
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Mine(filters) => {
            commands::questions::list(&ctx, QuestionScope::Mine, filters.into()).await?
        }
        Commands::Public(filters) => {
            commands::questions::list(&ctx, QuestionScope::Public, filters.into()).await?
        }
        Commands::Tags { public } => {
            let scope = if public {
                QuestionScope::Public
            } else {
                QuestionScope::Mine
            };
            commands::questions::tags(&ctx, scope).await?
        }
        Commands::Add(draft) => commands::questions::add(&ctx, draft.into()).await?,
        Commands::Edit { id, draft } => commands::questions::edit(&ctx, &id, draft.into()).await?,
        Commands::Delete { id } => commands::questions::delete(&ctx, &id).await?,
        Commands::GenerateAudio { id } => commands::questions::generate_audio(&ctx, &id).await?,
    }

    Ok(())
}
