mod catalog;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::StatusCode;

use catalog::{scan, Kind};

/// Import catalog files (destinations, packages, blog posts) into Wayfarer.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory scanned recursively for .json/.yaml/.yml catalog files
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Base URL of the Wayfarer server
    #[arg(long, env = "WAYFARER_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Parse and report without sending anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// Dry run: the entry would be sent.
    Planned,
    Created,
    Skipped,
    Failed(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    planned: usize,
    created: usize,
    skipped: usize,
    failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Planned => self.planned += 1,
            Outcome::Created => self.created += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Map an API response to an import outcome. A conflict means the entry is
/// already there.
fn classify(status: StatusCode, body: &serde_json::Value) -> Outcome {
    match status {
        StatusCode::CREATED => Outcome::Created,
        StatusCode::CONFLICT => Outcome::Skipped,
        _ => {
            let mut message = body["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}"));
            if let Some(details) = body["details"].as_array() {
                let details: Vec<&str> = details.iter().filter_map(|d| d.as_str()).collect();
                if !details.is_empty() {
                    message = format!("{message}: {}", details.join("; "));
                }
            }
            Outcome::Failed(message)
        }
    }
}

async fn import_entry(
    client: &reqwest::Client,
    base_url: &str,
    kind: Kind,
    entry: &serde_json::Value,
) -> Outcome {
    let url = format!("{}{}", base_url.trim_end_matches('/'), kind.endpoint());
    let response = match client.post(&url).json(entry).send().await {
        Ok(response) => response,
        Err(e) => return Outcome::Failed(format!("request failed: {e}")),
    };

    let status = response.status();
    let body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    classify(status, &body)
}

async fn run(args: Args) -> Result<Summary> {
    let files = scan(&args.dir)
        .with_context(|| format!("Failed to scan {}", args.dir.display()))?;
    let client = reqwest::Client::new();
    let mut summary = Summary::default();

    for file in files {
        println!(
            "{} ({:?}, {} entries)",
            file.path.display(),
            file.catalog.kind,
            file.catalog.entries.len()
        );

        let kind = file.catalog.kind;
        for (idx, entry) in file.catalog.entries.iter().enumerate() {
            let outcome = if let Some(field) = kind.missing_field(entry) {
                Outcome::Failed(format!("Missing required field: {field}"))
            } else if args.dry_run {
                Outcome::Planned
            } else {
                import_entry(&client, &args.url, kind, entry).await
            };
            match &outcome {
                Outcome::Planned => println!(
                    "  [{idx}] would POST {}{}",
                    args.url.trim_end_matches('/'),
                    kind.endpoint()
                ),
                Outcome::Created => println!("  [{idx}] created"),
                Outcome::Skipped => println!("  [{idx}] skipped (already exists)"),
                Outcome::Failed(reason) => eprintln!("  [{idx}] failed: {reason}"),
            }
            summary.record(&outcome);
        }
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let dry_run = args.dry_run;

    match run(args).await {
        Ok(summary) => {
            if dry_run {
                println!(
                    "Dry run: {} to send, {} invalid. Nothing was sent.",
                    summary.planned, summary.failed
                );
            } else {
                println!(
                    "Created: {}, skipped: {}, failed: {}",
                    summary.created, summary.skipped, summary.failed
                );
            }
            if summary.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_created_and_conflict() {
        assert_eq!(classify(StatusCode::CREATED, &json!({})), Outcome::Created);
        assert_eq!(
            classify(StatusCode::CONFLICT, &json!({ "error": "exists" })),
            Outcome::Skipped
        );
    }

    #[test]
    fn test_classify_failure_includes_details() {
        let body = json!({
            "success": false,
            "error": "Validation failed",
            "details": ["price must be >= 0", "rating must be between 0 and 5"]
        });
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, &body),
            Outcome::Failed(
                "Validation failed: price must be >= 0; rating must be between 0 and 5".into()
            )
        );

        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, &serde_json::Value::Null),
            Outcome::Failed("HTTP 502 Bad Gateway".into())
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        for outcome in [
            Outcome::Created,
            Outcome::Created,
            Outcome::Skipped,
            Outcome::Failed("x".into()),
        ] {
            summary.record(&outcome);
        }
        assert_eq!(
            summary,
            Summary {
                planned: 0,
                created: 2,
                skipped: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_dry_run_validates_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("posts.json"),
            r#"{ "kind": "post", "entries": [
                { "slug": "a" },
                { "title": "T", "slug": "b", "excerpt": "E", "content": "C",
                  "author": { "name": "N" }, "category": "Tips" }
            ] }"#,
        )
        .unwrap();

        let summary = run(Args {
            dir: dir.path().to_path_buf(),
            url: "http://127.0.0.1:9".into(),
            dry_run: true,
        })
        .await
        .unwrap();

        assert_eq!(
            summary,
            Summary {
                planned: 1,
                created: 0,
                skipped: 0,
                failed: 1
            }
        );
    }
}
