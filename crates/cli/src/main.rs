//! ingestq CLI - Command-line client for the ingestq HTTP API

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ingestq_core::domain::{Priority, MAX_BATCH_SIZE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "ingestq-cli")]
#[command(about = "ingestq priority ingestion scheduler CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon base URL
    #[arg(long, env = "INGESTQ_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit ids for ingestion
    Ingest {
        /// HIGH, MEDIUM or LOW (case-insensitive)
        #[arg(short, long, value_parser = parse_priority, default_value = "MEDIUM")]
        priority: Priority,

        /// Item ids (1..=1000000007)
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },

    /// Show the status record of an ingestion
    Status { ingestion_id: String },

    /// Poll an ingestion until it completes
    Watch {
        ingestion_id: String,

        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },

    /// Show daemon statistics
    Stats,
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::from_str(&raw.to_ascii_uppercase()).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct IngestResult {
    ingestion_id: String,
}

#[derive(Deserialize)]
struct StatusRecord {
    ingestion_id: String,
    status: String,
    batches: Vec<BatchRecord>,
}

#[derive(Deserialize)]
struct BatchRecord {
    batch_id: String,
    ids: Vec<i64>,
    status: String,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "#")]
    index: usize,
    batch_id: String,
    ids: String,
    status: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .context("Failed to connect to daemon")?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .context("Failed to connect to daemon")?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("Failed to parse response");
    }

    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    anyhow::bail!("HTTP {}: {}", status.as_u16(), detail)
}

fn paint_status(status: &str) -> String {
    match status {
        "completed" => status.green().to_string(),
        "triggered" => status.yellow().to_string(),
        _ => status.dimmed().to_string(),
    }
}

fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_record(record: &StatusRecord) {
    println!(
        "  {} {}",
        "Ingestion:".bold(),
        record.ingestion_id.as_str().cyan()
    );
    println!("  {} {}", "Status:".bold(), paint_status(&record.status));
    println!();

    let rows: Vec<BatchRow> = record
        .batches
        .iter()
        .enumerate()
        .map(|(index, batch)| BatchRow {
            index: index + 1,
            batch_id: batch.batch_id.clone(),
            ids: format_ids(&batch.ids),
            status: batch.status.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new(&cli.url);

    match cli.command {
        Commands::Ingest { priority, ids } => {
            let body = json!({ "ids": ids, "priority": priority });
            let result: IngestResult = client.post("/ingest", body).await?;

            println!("{}", "✓ Ingestion accepted".green().bold());
            println!("  {} {}", "Ingestion ID:".bold(), result.ingestion_id);
            println!("  {} {}", "Priority:".bold(), priority);
            println!("  {} {}", "Batches:".bold(), ids.len().div_ceil(MAX_BATCH_SIZE));
        }

        Commands::Status { ingestion_id } => {
            let record: StatusRecord = client.get(&format!("/status/{}", ingestion_id)).await?;
            print_record(&record);
        }

        Commands::Watch {
            ingestion_id,
            interval_ms,
        } => {
            let path = format!("/status/{}", ingestion_id);
            let mut last_seen: Option<Vec<String>> = None;

            loop {
                let record: StatusRecord = client.get(&path).await?;
                let snapshot: Vec<String> = std::iter::once(record.status.clone())
                    .chain(record.batches.iter().map(|b| b.status.clone()))
                    .collect();

                if last_seen.as_ref() != Some(&snapshot) {
                    print_record(&record);
                    println!();
                    last_seen = Some(snapshot);
                }

                if record.status == "completed" {
                    println!("{}", "✓ Ingestion completed".green().bold());
                    break;
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }

        Commands::Stats => {
            println!("{}", "ingestq Status".cyan().bold());
            println!();

            match client.get::<serde_json::Value>("/stats").await {
                Ok(stats) => {
                    println!("  {} {}", "URL:".bold(), cli.url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Queued Jobs:".bold(), stats["queued_jobs"]);
                    println!("  {} {}", "Ingestions:".bold(), stats["total_ingestions"]);
                    println!("  {} {}", "Yet to start:".bold(), stats["yet_to_start"]);
                    println!("  {} {}", "Triggered:".bold(), stats["triggered"]);
                    println!("  {} {}", "Completed:".bold(), stats["completed"]);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
