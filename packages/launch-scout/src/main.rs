use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launch_scout::notify::deliver_records;
use launch_scout::report::{render_records, render_summary};
use launch_scout::{
    default_queries, AzureInference, Config, DomainBlacklist, Pipeline, PipelineConfig,
    ReqwestTransport, SerpApiSearcher, SerperSearcher, WebSearcher, WebhookNotifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,launch_scout=debug,reqwest=warn,hyper=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    // Fails before any network activity
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(deployment = %config.azure.deployment, "Running AI tool discovery");

    let pipeline_config = PipelineConfig::default();
    let search = &pipeline_config.search;

    let searchers: Vec<Arc<dyn WebSearcher>> = vec![
        Arc::new(
            SerperSearcher::new(config.serper_api_key.clone())
                .with_locale(&search.country, &search.language)
                .with_timeout(search.request_timeout),
        ),
        Arc::new(
            SerpApiSearcher::new(config.serpapi_api_key.clone())
                .with_locale(&search.country, &search.language)
                .with_timeout(search.request_timeout),
        ),
    ];
    let transport = ReqwestTransport::new().context("Failed to create HTTP client")?;
    let inference = AzureInference::new(&config.azure)
        .with_timeout(pipeline_config.inference.request_timeout);
    let blacklist = DomainBlacklist::load(&config.blacklist_path).shared();

    let queries = default_queries(Utc::now(), pipeline_config.recency_window());
    let pipeline = Pipeline::new(
        searchers,
        Arc::new(transport),
        Arc::new(inference),
        blacklist,
        pipeline_config,
    );

    let output = pipeline.run(&queries).await;

    print!("{}", render_records(&output.records));
    print!("{}", render_summary(&output.summary));

    match &config.teams_webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url.clone());
            let sent = deliver_records(&notifier, &output.records).await;
            tracing::info!(sent, total = output.records.len(), "Teams notifications done");
        }
        None => tracing::info!("TEAMS_WEBHOOK_URL not set, skipping Teams notification"),
    }

    Ok(())
}
