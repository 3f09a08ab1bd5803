//! Parc Control - command line front end for the parc assistant.
//!
//! Thin presentation layer: builds the pipeline once, then answers queries
//! either one-shot (`--query`) or from an interactive prompt.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parc_core::rag::{HttpLanguageModel, LanguageModelService};
use parc_core::semantic::{EmbeddingService, HttpEmbeddingService};
use parc_core::store::InMemoryStore;
use parc_core::{Pipeline, PipelineConfig, ResponseEnvelope};

#[derive(Parser)]
#[command(name = "parcctl")]
#[command(about = "Parc Assistant - questions en langage naturel sur le parc matériel", long_about = None)]
#[command(version)]
struct Cli {
    /// Answer a single query and exit
    #[arg(short, long)]
    query: Option<String>,

    /// Print the full response envelope as JSON
    #[arg(long)]
    json: bool,

    /// Ollama endpoint enabling the optional embedding and LLM tiers
    #[arg(long)]
    ollama_url: Option<String>,

    /// Embedding model served by the endpoint
    #[arg(long, default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Generation model served by the endpoint
    #[arg(long, default_value = "mistral")]
    generation_model: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::default();

    let embedding: Option<Box<dyn EmbeddingService>> = match &cli.ollama_url {
        Some(url) => {
            info!("semantic tier enabled via {}", url);
            Some(Box::new(
                HttpEmbeddingService::new(
                    url.clone(),
                    cli.embedding_model.clone(),
                    config.service_timeout_secs,
                )
                .context("building embedding client")?,
            ))
        }
        None => None,
    };

    let llm: Option<Box<dyn LanguageModelService>> = match &cli.ollama_url {
        Some(url) => Some(Box::new(
            HttpLanguageModel::new(
                url.clone(),
                cli.generation_model.clone(),
                config.service_timeout_secs,
            )
            .context("building language model client")?,
        )),
        None => None,
    };

    let store = Arc::new(InMemoryStore::with_demo_data());
    let pipeline = Pipeline::new(config, store, embedding, llm).context("building pipeline")?;

    if let Some(query) = cli.query {
        print_envelope(&pipeline.process(&query), cli.json)?;
        return Ok(());
    }

    println!("Parc Assistant — posez une question sur le parc (quit pour sortir)");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        print_envelope(&pipeline.process(line), cli.json)?;
    }
    Ok(())
}

fn print_envelope(envelope: &ResponseEnvelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    } else {
        println!("{}", envelope.response);
        println!(
            "  [{} · {} · confiance {}]",
            envelope.intent, envelope.source, envelope.confidence
        );
    }
    Ok(())
}
