//! Fetch demo binary
//!
//! Observes a URL through `UseFetch`, printing every state the controller
//! publishes. With `--then`, the inputs change mid-flight to show that the
//! superseded request never overwrites the newer one.

use anyhow::{bail, Context};
use clap::Parser;
use composable_fetch::{
    metrics::describe_fetch_metrics, FetchConfig, HttpMethod, RequestOptions, RequestState,
    ReqwestTransport, UseFetch,
};
use composable_fetch_runtime::metrics::MetricsServer;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fetch-demo", about = "Observe an HTTP resource as idle/loading/success/error")]
struct Args {
    /// URL to fetch
    url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    method: HttpMethod,

    /// Request header as `name: value` (repeatable)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// Request body
    #[arg(long)]
    body: Option<String>,

    /// Switch to this URL while the first request is in flight
    #[arg(long)]
    then: Option<String>,

    /// Delay before switching to `--then`
    #[arg(long, default_value_t = 50)]
    switch_after_ms: u64,

    /// Per-request timeout
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Abort superseded requests instead of letting them finish
    #[arg(long)]
    abort_in_flight: bool,

    /// How long to wait for the final outcome
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    metrics: bool,
}

fn request_options(args: &Args) -> anyhow::Result<Option<Arc<RequestOptions>>> {
    if args.headers.is_empty() && args.body.is_none() {
        return Ok(None);
    }

    let mut options = RequestOptions::new();
    for raw in &args.headers {
        let Some((name, value)) = raw.split_once(':') else {
            bail!("header must look like `name: value`, got `{raw}`");
        };
        options = options.with_header(name.trim(), value.trim());
    }
    if let Some(body) = &args.body {
        options = options.with_body(body.as_bytes());
    }

    Ok(Some(options.shared()))
}

fn describe(state: &RequestState<Value>) -> String {
    match state {
        RequestState::Idle => "idle".to_string(),
        RequestState::Loading => "loading".to_string(),
        RequestState::Error(error) => format!("error: {error}"),
        RequestState::Success(data) => format!("success: {data}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_demo=debug,composable_fetch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!(url = %args.url, method = %args.method, "Starting fetch demo");

    let metrics = if args.metrics {
        let mut server = MetricsServer::new("127.0.0.1:9090".parse()?);
        server.start()?;
        describe_fetch_metrics();
        Some(server)
    } else {
        None
    };

    let mut config = FetchConfig::new().with_abort_in_flight(args.abort_in_flight);
    if let Some(timeout) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout));
    }
    let options = request_options(&args)?;

    let mut fetch = UseFetch::<Value, _>::with_config(ReqwestTransport::new(), config);

    let mut states = fetch.subscribe();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let line = describe(&states.borrow_and_update());
            println!("  state -> {line}");
        }
    });

    println!("=== {} {} ===", args.method, args.url);
    let rendered = fetch.observe(&args.url, args.method, options.as_ref()).await;
    println!("render: {}", describe(&rendered));

    let mut current = args.url.as_str();
    if let Some(next) = args.then.as_deref() {
        tokio::time::sleep(Duration::from_millis(args.switch_after_ms)).await;
        println!("=== switching to {} {next} ===", args.method);
        let rendered = fetch.observe(next, args.method, options.as_ref()).await;
        println!("render: {}", describe(&rendered));
        current = next;
    }

    fetch
        .settled(Duration::from_secs(args.wait_secs))
        .await
        .context("request did not settle in time")?;
    let rendered = fetch.observe(current, args.method, options.as_ref()).await;
    println!("render: {}", describe(&rendered));

    fetch
        .shutdown(Duration::from_secs(args.wait_secs))
        .await
        .context("superseded request still running")?;
    drop(fetch);
    printer.await?;

    if let Some(text) = metrics.as_ref().and_then(MetricsServer::render) {
        println!("\n{text}");
    }

    Ok(())
}
