#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, DemoInput, DemoStrategy, InfoStrategy, InitStrategy, StreamInput,
    StreamStrategy, VersionStrategy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "promptchain")]
#[command(about = "Chained prompts against a chat-completion endpoint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chained-conversation walk-through
    Demo {
        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Stream a single reply to stdout
    Stream {
        /// Prompt to send
        prompt: String,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,

        /// Print raw provider events instead of text
        #[arg(long)]
        raw: bool,
    },
    /// Show effective configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { model } => DemoStrategy.execute(DemoInput { model }).await,
        Commands::Stream { prompt, model, raw } => {
            StreamStrategy
                .execute(StreamInput { prompt, model, raw })
                .await
        }
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
