mod api;
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use qlens_answerer::providers::OpenAiProvider;
use qlens_answerer::QuestionAnswerer;
use qlens_media::allowed_file;
use qlens_core::ExtractedText;
use qlens_understanding::{decode_image, extract_question, OcrsRecognizer, TextRecognizer};

use api::AppState;
use config::Config;

#[derive(Parser)]
#[command(name = "qlens")]
#[command(about = "qlens: answer the question written in an image")]
#[command(version)]
struct Cli {
    /// Read settings from this dotenv file instead of searching for `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run OCR and question detection on a local image and print the result
    Ocr {
        /// Path to the image file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    };
    qlens_logging::init_logger(&config.log_dir, &config.log_level);

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                bind_address: bind.unwrap_or(config.bind_address),
                ..config
            };
            if let Err(e) = run_server(config).await {
                error!(error = %format!("{e:#}"), "Application startup failed");
                return Err(e);
            }
        }
        Commands::Ocr { path } => run_ocr(&config, &path).await?,
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.openai_model,
        "Starting qlens"
    );

    let api_key = config.require_api_key()?;

    std::fs::create_dir_all(&config.upload_folder).with_context(|| {
        format!("failed to create upload folder {}", config.upload_folder.display())
    })?;

    let recognizer = OcrsRecognizer::load(&config.ocr).context("OCR engine initialization failed")?;

    let provider = OpenAiProvider::new(api_key).with_base_url(&config.openai_base_url);
    let answerer = QuestionAnswerer::new(Arc::new(provider)).with_model(&config.openai_model);

    let state = Arc::new(AppState {
        recognizer: Arc::new(recognizer),
        answerer,
    });

    let app = api::build_router(state);
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Question answering service initialized successfully");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Diagnostic: OCR a local file without calling the LLM.
async fn run_ocr(config: &Config, path: &Path) -> Result<()> {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if !allowed_file(filename) {
        warn!(file = %path.display(), "Extension would be rejected by the HTTP API");
    }

    let recognizer = OcrsRecognizer::load(&config.ocr).context("OCR engine initialization failed")?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let image = decode_image(&bytes)?;
    let extracted = recognizer.recognize(image).await?;

    println!("{}", serde_json::to_string_pretty(&ocr_report(&extracted))?);

    Ok(())
}

/// The JSON document `qlens ocr` prints on stdout.
fn ocr_report(extracted: &ExtractedText) -> Value {
    let text = extracted.joined();
    let question = extract_question(&text);
    json!({
        "fragments": extracted.fragments,
        "text": text,
        "is_question": question.is_some(),
    })
}
