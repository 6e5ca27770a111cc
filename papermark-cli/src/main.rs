//! Papermark CLI - question-bank conversion and remote sync.

mod io;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use papermark_core::{validate_import, AnnotationStore, RemoteClient, RemoteConfig};

#[derive(Parser)]
#[command(name = "papermark", about = "PDF question-bank annotation toolkit", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check an import document without touching any state
    Validate {
        /// Question-bank or flat annotation JSON file
        input: PathBuf,
    },
    /// Import a document and re-export it as a question bank
    Convert {
        /// Question-bank or flat annotation JSON file
        input: PathBuf,
        /// Output path (defaults to ~/.papermark/bank.json)
        output: Option<PathBuf>,
    },
    /// Fetch the remote question bank and write it to a file
    Pull {
        /// Output path (defaults to ~/.papermark/bank.json)
        output: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Upload a local document to the remote question bank
    Push {
        /// Question-bank or flat annotation JSON file
        input: PathBuf,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Args)]
struct RemoteArgs {
    /// Service endpoint
    #[arg(long, env = "PAPERMARK_BASE_URL")]
    base_url: Option<String>,

    /// X-API-Key header credential
    #[arg(long, env = "PAPERMARK_API_KEY")]
    api_key: Option<String>,

    /// Remote document id
    #[arg(long, env = "PAPERMARK_DOCUMENT_ID")]
    id: Option<String>,

    /// Remote file name (without the .pdf suffix)
    #[arg(long, env = "PAPERMARK_FILE_NAME")]
    file_name: Option<String>,
}

impl RemoteArgs {
    fn into_config(self) -> RemoteConfig {
        let mut config = RemoteConfig::default();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(id) = self.id {
            config.document_id = id;
        }
        if let Some(file_name) = self.file_name {
            config.file_name = file_name;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { input } => {
            let data = io::load_json(&input)?;
            let validation = validate_import(&data);
            if validation.valid {
                println!("{}", validation.message);
            } else {
                eprintln!("Invalid: {}", validation.message);
                std::process::exit(1);
            }
        }

        Command::Convert { input, output } => {
            let data = io::load_json(&input)?;
            let mut store = AnnotationStore::new();
            let report = store.import_json(&data, true);
            if !report.success {
                anyhow::bail!("Import failed: {}", report.message);
            }

            let bank = store.to_question_bank();
            let path = io::save_bank(&bank, output)?;
            println!(
                "Wrote {} ({} questions, {} annotations)",
                path.display(),
                bank.total_questions,
                bank.total_annotations
            );
        }

        Command::Pull { output, remote } => {
            let client = RemoteClient::new(remote.into_config());
            let mut store = AnnotationStore::new();
            let report = client.import_from_remote(&mut store).await;
            if !report.success {
                anyhow::bail!("Pull failed: {}", report.message);
            }

            let bank = store.to_question_bank();
            let path = io::save_bank(&bank, output)?;
            println!("{} -> {}", report.message, path.display());
        }

        Command::Push { input, remote } => {
            let data = io::load_json(&input)?;
            let mut store = AnnotationStore::new();
            let report = store.import_json(&data, true);
            if !report.success {
                anyhow::bail!("Import failed: {}", report.message);
            }

            let client = RemoteClient::new(remote.into_config());
            let sync = client.export_to_remote(&store).await;
            if !sync.success {
                anyhow::bail!("Push failed: {}", sync.message);
            }
            println!("{}", sync.message);
        }
    }

    Ok(())
}
