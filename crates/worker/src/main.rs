use anyhow::Context;
use clap::{Parser, Subcommand};
use finoak_core::config::Settings;
use finoak_core::domain::analysis::Platform;
use finoak_core::llm::service::AnalysisService;
use finoak_core::llm::Message;
use finoak_core::market::mock::MockMarketData;
use finoak_core::market::MarketDataProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod sweep;

#[derive(Debug, Parser)]
#[command(name = "finoak_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the assistant one question and print the cleaned reply.
    Chat {
        #[arg(long)]
        message: String,
    },
    /// Sentiment score, price prediction and social report for one listed stock.
    Analyze {
        #[arg(long)]
        symbol: String,
    },
    /// Social media sentiment for a free-text query.
    Social {
        #[arg(long)]
        query: String,

        /// Comma separated subset of twitter, reddit, quora. Defaults to all.
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<Platform>,
    },
    /// Analyze every listed stock and print the results as JSON.
    Sweep {
        /// List the stocks that would be analyzed without calling the model.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = run(args.command, &settings).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    res
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    let analysis = AnalysisService::from_settings(settings)?;
    let market = MockMarketData::from_settings(settings);

    match command {
        Command::Chat { message } => {
            let reply = analysis
                .chat(&[Message::user(message)])
                .await
                .context("chat request failed")?;
            println!("{reply}");
        }
        Command::Analyze { symbol } => {
            let stock = market
                .stock_by_id(&symbol)
                .await?
                .with_context(|| format!("unknown symbol: {symbol}"))?;
            let insight = analysis
                .analyze_stock(&stock.id, &stock.name, stock.price)
                .await;
            println!("{}", serde_json::to_string_pretty(&insight)?);
        }
        Command::Social { query, platforms } => {
            let report = analysis.analyze_social_sentiment(&query, &platforms).await;
            tracing::info!(%query, source = ?report.source, "social sentiment ready");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Sweep { dry_run } => {
            let stocks = market.all_stocks().await?;
            if dry_run {
                tracing::info!(
                    dry_run = true,
                    stocks_len = stocks.len(),
                    symbols = ?stocks.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
                    "sweep (dry-run)"
                );
                return Ok(());
            }

            let outcome = sweep::analyze_all(&analysis, &stocks).await;
            tracing::info!(
                analyzed = outcome.insights.len(),
                fully_modeled = outcome.fully_modeled(),
                "sweep finished"
            );
            println!("{}", serde_json::to_string_pretty(&outcome.insights)?);
        }
    }

    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_lists() {
        let args = Args::parse_from([
            "finoak_worker",
            "social",
            "--query",
            "TSLA",
            "--platforms",
            "twitter,quora",
        ]);
        match args.command {
            Command::Social { query, platforms } => {
                assert_eq!(query, "TSLA");
                assert_eq!(platforms, vec![Platform::Twitter, Platform::Quora]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn platforms_default_to_empty() {
        let args = Args::parse_from(["finoak_worker", "social", "--query", "market"]);
        assert!(matches!(args.command, Command::Social { platforms, .. } if platforms.is_empty()));
    }

    #[test]
    fn rejects_unknown_platforms() {
        let res = Args::try_parse_from([
            "finoak_worker",
            "social",
            "--query",
            "x",
            "--platforms",
            "myspace",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn sweep_dry_run_flag() {
        let args = Args::parse_from(["finoak_worker", "sweep", "--dry-run"]);
        assert!(matches!(args.command, Command::Sweep { dry_run: true }));
    }
}
