mod config;
mod logging;
mod notes_client;
mod types;
mod views;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::notes_client::{DocType, NotesClient, SearchTarget};
use crate::views::{
    SearchView, SimilarView, UploadView, ViewPhase, DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILAR_LIMIT,
};

#[derive(Debug, Parser)]
#[command(
    name = "inkdex",
    version,
    about = "Capture handwritten notes and reference documents, then search them semantically"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload an image or PDF for OCR and indexing
    Upload {
        /// File to submit
        file: PathBuf,
        /// Kind of document being submitted
        #[arg(long, value_enum, default_value_t = DocType::Note)]
        doc_type: DocType,
        /// Optional display title
        #[arg(long)]
        title: Option<String>,
    },
    /// Search stored documents with a text query
    Search {
        /// Query text; may be omitted when --file is given
        query: Vec<String>,
        /// Extract the query from this image/PDF instead of typing it
        #[arg(long)]
        file: Option<PathBuf>,
        /// Which document category to search
        #[arg(long, value_enum, default_value_t = SearchTarget::Both)]
        target: SearchTarget,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },
    /// Find documents similar to a stored document
    Similar {
        /// ID of the source document
        document_id: String,
        /// Which document category to search
        #[arg(long, value_enum, default_value_t = SearchTarget::Both)]
        target: SearchTarget,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SIMILAR_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    let config = Config::load().await;

    let client = match NotesClient::from_config(&config) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("inkdex: {err}");
            return ExitCode::FAILURE;
        }
    };

    let probe = client.readiness_probe();
    if config.disable_startup_probe {
        debug!("Startup readiness probe disabled by configuration");
    } else {
        probe.spawn();
    }

    let (phase, rendering) = match cli.command {
        Command::Upload {
            file,
            doc_type,
            title,
        } => {
            let mut view = UploadView::new(client, probe);
            view.set_file(file);
            view.set_doc_type(doc_type);
            if let Some(title) = title {
                view.set_title(title);
            }
            view.submit().await;
            (view.phase(), view.render())
        }
        Command::Search {
            query,
            file,
            target,
            limit,
        } => {
            let mut view = SearchView::new(client, probe);
            view.set_target(target);
            view.set_limit(limit);
            view.set_query(query.join(" "));
            if let Some(file) = file {
                view.attach_file(file).await;
            }
            if view.phase() == ViewPhase::Failed {
                // OCR-assist already failed; nothing to submit.
                (view.phase(), view.render())
            } else {
                view.submit().await;
                (view.phase(), view.render())
            }
        }
        Command::Similar {
            document_id,
            target,
            limit,
        } => {
            let view = SimilarView::open(client, probe, document_id, target, limit).await;
            (view.phase(), view.render())
        }
    };

    if !rendering.is_empty() {
        println!("{rendering}");
    }

    if phase == ViewPhase::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
