/// CLI для аналитических операций: JSON-запрос на входе, JSON-ответ на выходе

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use hr_analytics::{AnalyticsConfig, AnalyticsFacade, AnalyticsRequest, ResultCache};

#[derive(Parser)]
#[command(name = "hr-analytics")]
#[command(about = "Predictive analytics over HR records")]
#[command(version)]
struct Cli {
    /// Файл с запросом или массивом запросов; без него читается stdin
    input: Option<PathBuf>,

    /// JSON с настройками моделей
    #[arg(long)]
    config: Option<PathBuf>,

    /// Размер кэша результатов (0 = без кэша)
    #[arg(long, default_value_t = 0)]
    cache_entries: usize,

    #[arg(long)]
    pretty: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Batch(Vec<AnalyticsRequest>),
    Single(AnalyticsRequest),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Логи в stderr, stdout только для JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalyticsConfig::from_file(path)?,
        None => AnalyticsConfig::default(),
    };

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let requests = match serde_json::from_str::<Input>(&raw).context("malformed request JSON")? {
        Input::Batch(requests) => requests,
        Input::Single(request) => vec![request],
    };
    tracing::info!("Running {} analytics requests", requests.len());

    let mut facade = AnalyticsFacade::new(config);
    if cli.cache_entries > 0 {
        facade = facade.with_cache(Arc::new(ResultCache::new(cli.cache_entries)));
    }

    let responses = Arc::new(facade).run_batch(requests).await;
    let insights = AnalyticsFacade::compose_insights(&responses);
    let output = serde_json::json!({
        "responses": responses,
        "insights": insights,
    });

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
