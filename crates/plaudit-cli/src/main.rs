mod display;
mod import;
mod inference;
mod logging;
mod reconcile;
mod serve;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use plaudit_core::SentimentStats;
use plaudit_store::{DuckStore, FeedbackStore};
use tracing::{error, info};

use crate::inference::InferenceArgs;
use crate::reconcile::Reconciler;

/// Run completed but some records or passes failed.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "plaudit", version)]
#[command(about = "Feedback sentiment reconciliation")]
struct Cli {
    /// DuckDB database file holding feedback records
    #[arg(long, env = "PLAUDIT_DB", default_value = "plaudit.duckdb", global = true)]
    db: PathBuf,

    /// Log file, appended to alongside stdout
    #[arg(
        long,
        env = "PLAUDIT_LOG_FILE",
        default_value = "sentiment_processing.log",
        global = true
    )]
    log_file: PathBuf,

    #[command(flatten)]
    inference: InferenceArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fill missing sentiment and correct rating contradictions (default)
    Reconcile,
    /// Run the feedback intake server
    Serve {
        #[arg(long, env = "PLAUDIT_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
    /// Print the sentiment distribution of stored feedback
    Stats,
    /// Classify a single message
    Classify {
        text: String,
        #[arg(long)]
        rating: Option<i32>,
    },
    /// Import a Play Store review dump (JSON array) as feedback records
    Import { path: PathBuf },
    /// Measure text-only accuracy on a review dump against star ratings
    Evaluate { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_file) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }
    info!("plaudit v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command.unwrap_or(Command::Reconcile) {
        Command::Reconcile => {
            let store = open_store(&cli.db)?;
            let resolver = cli.inference.build_resolver();
            info!(db = %cli.db.display(), "starting sentiment reconciliation");
            let report = Reconciler::new(&store, &resolver).run_all();
            print!("{}", display::render_report(&report));
            if report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Command::Serve { addr } => {
            let store = open_store(&cli.db)?;
            serve::serve(Box::new(store), addr)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats => {
            let store = open_store(&cli.db)?;
            let records = store.all().context("loading feedback")?;
            print!("{}", display::render_stats(&SentimentStats::from_records(&records)));
            Ok(ExitCode::SUCCESS)
        }
        Command::Classify { text, rating } => {
            let resolver = cli.inference.build_resolver();
            let verdict = resolver.resolve(&text, rating);
            println!("{}", display::render_verdict(&verdict));
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { path } => {
            let reviews = import::load_reviews(&path)?;
            let store = open_store(&cli.db)?;
            let now = chrono::Utc::now().to_rfc3339();
            let report = import::import_reviews(&store, &reviews, &now);
            println!(
                "Imported {} reviews ({} without text skipped, {} failed)",
                report.inserted, report.skipped, report.failed
            );
            if report.failed == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Command::Evaluate { path } => {
            let reviews = import::load_reviews(&path)?;
            let resolver = cli.inference.build_resolver();
            let eval = plaudit_ai::evaluate(
                &resolver,
                reviews.iter().map(|r| (r.text(), r.score)),
            );
            print!(
                "{}",
                display::render_evaluation(&eval, resolver.provider_name())
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(path: &Path) -> anyhow::Result<DuckStore> {
    DuckStore::open_persistent(path)
        .with_context(|| format!("opening feedback store {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_reconcile() {
        let cli = Cli::try_parse_from(["plaudit"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.db, PathBuf::from("plaudit.duckdb"));
        assert_eq!(cli.inference.summarize_threshold, 512);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "plaudit",
            "classify",
            "slow refund",
            "--rating",
            "3",
            "--inference-url",
            "http://localhost:9000",
        ])
        .unwrap();
        assert_eq!(
            cli.inference.inference_url.as_deref(),
            Some("http://localhost:9000")
        );
        match cli.command {
            Some(Command::Classify { text, rating }) => {
                assert_eq!(text, "slow refund");
                assert_eq!(rating, Some(3));
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn serve_default_addr() {
        let cli = Cli::try_parse_from(["plaudit", "serve"]).unwrap();
        match cli.command {
            Some(Command::Serve { addr }) => assert_eq!(addr.port(), 8000),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn reconcile_against_persistent_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("feedback.duckdb");
        {
            let store = open_store(&db).unwrap();
            let reviews: Vec<plaudit_core::ReviewEntry> = serde_json::from_str(
                r#"[{"content": "Very slow and rude", "score": 1},
                    {"content": "good great helpful", "score": 3}]"#,
            )
            .unwrap();
            import::import_reviews(&store, &reviews, "2024-01-01T00:00:00Z");
        }

        let store = open_store(&db).unwrap();
        let report = Reconciler::new(&store, &plaudit_ai::Resolver::unavailable()).run_all();
        assert!(report.is_clean());
        assert_eq!(report.passes[0].updated, 2);

        let labels: Vec<_> = store
            .all()
            .unwrap()
            .into_iter()
            .map(|r| r.sentiment.unwrap())
            .collect();
        assert_eq!(labels, ["NEGATIVE", "POSITIVE"]);
    }
}
