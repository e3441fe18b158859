//! Replay a recorded detector trace through an interview session.
//!
//! Usage: `cpilot-replay <trace.jsonl> [--metrics]`
//!
//! Every session update is printed to stdout as a JSON line. With
//! `--metrics` the Prometheus exposition is printed to stderr at the end.

use anyhow::{bail, Context};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cpilot_session::replay::{load_trace, JsonLinesConsumer};
use cpilot_session::{metrics, InterviewSession, SessionConfig};
use cpilot_vision::{LatestFrame, ScriptedDetector, VideoFrame};

struct Args {
    trace: String,
    metrics: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut trace = None;
    let mut metrics = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--metrics" => metrics = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path if trace.is_none() => trace = Some(path.to_string()),
            extra => bail!("unexpected argument {extra}"),
        }
    }
    let trace = trace.context("usage: cpilot-replay <trace.jsonl> [--metrics]")?;
    Ok(Args { trace, metrics })
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("cpilot=info".parse()?);

    // Logs go to stderr; stdout carries the update stream.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let args = parse_args()?;
    let prometheus = if args.metrics {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let steps = load_trace(&args.trace).with_context(|| format!("loading {}", args.trace))?;
    let total = steps.len() as u64;
    info!(trace = %args.trace, steps = total, "Replaying trace");

    let config = SessionConfig::from_env();
    let detector = Arc::new(ScriptedDetector::new(steps));
    let session = InterviewSession::new(config, detector).context("invalid session config")?;

    let frames = LatestFrame::new();
    frames.publish(VideoFrame::empty());

    let handle = session.start(frames.clone())?;
    let consumer = handle.attach(Arc::new(JsonLinesConsumer::stdout()));

    if total > 0 && handle.wait_for_sequence(total).await.is_none() {
        warn!("Session stopped before the trace was fully replayed");
    }

    let snapshot = handle.stop().await?;
    consumer.await.ok();

    info!(
        session_id = %snapshot.session_id,
        events = snapshot.recent.len(),
        confidence = snapshot.confidence,
        "Replay complete"
    );

    if let Some(prometheus) = prometheus {
        eprintln!("{}", prometheus.render());
    }
    Ok(())
}
