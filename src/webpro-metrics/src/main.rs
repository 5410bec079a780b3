//! WebPro Metrics: fetch marketing KPIs from the connected platforms, build
//! cross-platform reports and run attribution models from the command line.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use webpro_connectors::{ConnectorRouter, HttpProxyTransport};
use webpro_core::{AppConfig, DateRange, Platform, RandomSource};
use webpro_reporting::attribution::model_catalog;
use webpro_reporting::{
    calculate_attribution, generate_mock_journey, AttributionModel, ReportExporter, ReportMeta,
    ReportOverview,
};

#[derive(Parser, Debug)]
#[command(name = "webpro-metrics")]
#[command(about = "Cross-platform marketing metrics, insights and attribution")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "WEBPRO_CONFIG")]
    config: Option<String>,

    /// Serve synthetic data only (overrides config)
    #[arg(long, env = "WEBPRO__USE_MOCK_DATA")]
    mock: Option<bool>,

    /// Backend proxy base URL (overrides config)
    #[arg(long, env = "WEBPRO__API__BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in milliseconds (overrides config)
    #[arg(long, env = "WEBPRO__API__TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Seed for reproducible synthetic data (overrides config)
    #[arg(long, env = "WEBPRO__MOCK__SEED")]
    seed: Option<u64>,

    /// Write a Prometheus-format snapshot of connector metrics here on exit
    #[arg(long)]
    metrics_output: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch one platform and print its metrics as JSON
    Fetch {
        /// Platform id: gmb, search_console, linkedin, x, shopify, hubspot
        #[arg(short, long)]
        platform: String,

        /// Resource id (location, site URL, organization, ...); defaults to the configured one
        #[arg(short, long)]
        resource: Option<String>,

        /// Date range: daily, weekly, monthly
        #[arg(long, default_value = "weekly")]
        range: String,
    },

    /// Fetch every configured platform and export a report
    Report {
        /// Date range: daily, weekly, monthly
        #[arg(long, default_value = "monthly")]
        range: String,

        /// Export format: csv, excel, pdf, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Client name printed in the report header
        #[arg(long, default_value = "Client")]
        client: String,

        /// Report title
        #[arg(long, default_value = "Marketing Performance Report")]
        name: String,
    },

    /// Run a synthetic customer journey through an attribution model
    Attribution {
        /// Model id: last_click, first_click, linear, time_decay, position_based, data_driven
        #[arg(short, long, default_value = "linear")]
        model: String,

        /// Comma-separated platforms the journey passes through
        #[arg(short, long, default_value = "google_ads,meta_ads,linkedin")]
        platforms: String,

        /// Revenue to distribute
        #[arg(long, default_value = "10000")]
        revenue: f64,

        /// Conversions to distribute
        #[arg(long, default_value = "10")]
        conversions: f64,
    },

    /// Show which platforms are linked and the available attribution models
    Status,

    /// List the accounts, locations, sites and organizations the linked identities can see
    Resources,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "webpro_metrics=info,webpro_connectors=info,webpro_reporting=info".into()
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(mock) = cli.mock {
        config.use_mock_data = mock;
    }
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.api.timeout_ms = timeout_ms;
    }
    if cli.seed.is_some() {
        config.mock.seed = cli.seed;
    }

    info!(
        use_mock_data = config.use_mock_data,
        base_url = %config.api.base_url,
        timeout_ms = config.api.timeout_ms,
        seed = ?config.mock.seed,
        "Configuration loaded"
    );

    let rng = Arc::new(RandomSource::from_optional_seed(config.mock.seed));
    let transport = Arc::new(HttpProxyTransport::new(&config.api)?);
    let router = ConnectorRouter::from_config(&config, transport, rng.clone());

    match cli.command {
        Commands::Fetch {
            platform,
            resource,
            range,
        } => cmd_fetch(&router, &config, &platform, resource, &range).await,
        Commands::Report {
            range,
            format,
            output,
            client,
            name,
        } => {
            cmd_report(&router, &config, &rng, &range, &format, output, client, name).await
        }
        Commands::Attribution {
            model,
            platforms,
            revenue,
            conversions,
        } => cmd_attribution(&rng, &model, &platforms, revenue, conversions),
        Commands::Status => cmd_status(&router).await,
        Commands::Resources => cmd_resources(&router).await,
    }?;

    if let Some(path) = cli.metrics_output {
        std::fs::write(&path, metrics_handle.render())
            .with_context(|| format!("writing metrics snapshot to {path}"))?;
        info!(path = %path, "metrics snapshot written");
    }
    Ok(())
}

async fn cmd_fetch(
    router: &ConnectorRouter,
    config: &AppConfig,
    platform: &str,
    resource: Option<String>,
    range: &str,
) -> anyhow::Result<()> {
    let platform: Platform = platform.parse()?;
    let range: DateRange = range.parse()?;
    let resource = resource
        .or_else(|| config.resources.resource_for(platform).map(str::to_string))
        .unwrap_or_else(|| "default".to_string());

    let data = router.fetch(platform, &resource, range).await;
    info!(platform = %platform, source = ?data.source, "fetch complete");
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_report(
    router: &ConnectorRouter,
    config: &AppConfig,
    rng: &RandomSource,
    range: &str,
    format: &str,
    output: Option<String>,
    client: String,
    name: String,
) -> anyhow::Result<()> {
    let range: DateRange = range.parse()?;
    let mut requests = config.resources.configured();
    if requests.is_empty() {
        requests = Platform::ALL
            .iter()
            .map(|p| (*p, "default".to_string()))
            .collect();
    }

    let platforms = router.fetch_all(&requests, range).await;
    let now = Utc::now();
    let overview = ReportOverview::build(platforms, range, rng, now);

    info!(
        live = overview.live_platforms.len(),
        mock = overview.mock_platforms.len(),
        missing = overview.missing_platforms.len(),
        insights = overview.insights.len(),
        "report assembled"
    );
    for insight in &overview.insights {
        info!(
            platform = %insight.platform,
            impact = ?insight.impact,
            title = %insight.title,
            "insight"
        );
    }

    let (content, extension) = if format.eq_ignore_ascii_case("json") {
        (serde_json::to_string_pretty(&overview)?, "json")
    } else {
        let meta = ReportMeta {
            report_name: name,
            client_name: client,
            date: now.format("%Y-%m-%d").to_string(),
            period: Some(range.to_string()),
        };
        let report = ReportExporter::new(config.branding.clone())
            .export_named(&meta, &overview.platforms, format, now)?;
        (report.content, report.format.file_extension())
    };

    if let Some(path) = output.map(|p| with_default_extension(p, extension)) {
        std::fs::write(&path, &content).with_context(|| format!("writing report to {path}"))?;
        info!(path = %path, format = %format, "report written");
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Appends `extension` when the output path has none.
fn with_default_extension(path: String, extension: &str) -> String {
    if Path::new(&path).extension().is_some() {
        path
    } else {
        format!("{path}.{extension}")
    }
}

fn cmd_attribution(
    rng: &RandomSource,
    model: &str,
    platforms: &str,
    revenue: f64,
    conversions: f64,
) -> anyhow::Result<()> {
    let model = AttributionModel::from_id(model);
    let platforms: Vec<String> = platforms
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let journey = generate_mock_journey(&platforms, rng, Utc::now());
    let results = calculate_attribution(&journey, model, revenue, conversions);
    info!(model = %model, touches = journey.len(), "attribution calculated");

    let body = serde_json::json!({
        "model": model.id(),
        "journey": journey,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn cmd_status(router: &ConnectorRouter) -> anyhow::Result<()> {
    let status = router.link_status().await;

    println!("Platforms:");
    for platform in Platform::ALL {
        let linked = status.get(platform.id()).copied().unwrap_or(false);
        let marker = if linked { "linked" } else { "not linked" };
        println!("  {:<16} {:<26} {marker}", platform.id(), platform.display_name());
    }
    println!();
    println!("Attribution models:");
    for model in model_catalog() {
        println!("  {:<16} {:<18} {}", model.id, model.name, model.description);
    }
    Ok(())
}

async fn cmd_resources(router: &ConnectorRouter) -> anyhow::Result<()> {
    let directory = router.discover_resources().await;
    info!(
        gmb_locations = directory.gmb_locations.len(),
        search_console_sites = directory.search_console_sites.len(),
        linkedin_organizations = directory.linkedin_organizations.len(),
        "resource discovery complete"
    );
    println!("{}", serde_json::to_string_pretty(&directory)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_gets_format_extension() {
        assert_eq!(with_default_extension("report".into(), "csv"), "report.csv");
        assert_eq!(with_default_extension("out/q3.html".into(), "tsv"), "out/q3.html");
    }

    #[test]
    fn test_cli_parses_report_flags() {
        let cli = Cli::try_parse_from([
            "webpro-metrics",
            "--mock",
            "true",
            "--metrics-output",
            "metrics.prom",
            "report",
            "--format",
            "excel",
            "-o",
            "weekly",
        ])
        .unwrap();
        assert_eq!(cli.mock, Some(true));
        assert_eq!(cli.metrics_output.as_deref(), Some("metrics.prom"));
        assert!(matches!(
            cli.command,
            Commands::Report { ref format, ref output, .. } if format == "excel" && output.as_deref() == Some("weekly")
        ));
    }
}
