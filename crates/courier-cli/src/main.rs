use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use courier_core::app::{CourierRuntime, QueueConfig, RuntimeError};
use courier_core::domain::{RequestDescriptor, RequestStatus};
use courier_core::ports::ReachabilitySignal;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 永続キューに URL を投入し、到達可能なら送信する
#[derive(Debug, Parser)]
#[command(name = "courier", version)]
#[command(about = "Queue outbound GET requests and deliver them when the network is reachable")]
struct Cli {
    /// JSON 設定ファイル（省略時は既定値）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// GET として投入する URL
    #[arg(value_name = "URL")]
    urls: Vec<String>,
}

async fn run(args: Cli) -> Result<(), RuntimeError> {
    // (A) 設定（指定がなければ既定値）
    let config = match &args.config {
        Some(path) => QueueConfig::load(path)?,
        None => QueueConfig::default(),
    };

    // (B) store / transport / 到達性を配線して起動（中断されたレコードはここで pending に戻る）
    let runtime = CourierRuntime::from_config(&config).await?;
    let processor = runtime.processor();
    println!("network available: {}", runtime.monitor().is_available());

    // (C) URL を GET として投入。到達可能ならその場で送られる
    for url in &args.urls {
        let id = processor.enqueue(RequestDescriptor::new(url.as_str())).await?;
        println!("enqueued: {id} {url}");
    }

    // (D) 残りを drain
    let report = processor.drain(0).await?;
    println!(
        "drain: outcome={:?} passes={} sent={} failed={} discarded={}",
        report.outcome, report.passes, report.sent, report.failed, report.discarded
    );

    // (E) まだ残っているもの
    let pending = processor.records(RequestStatus::Pending).await?;
    println!("pending: {}", pending.len());
    for record in &pending {
        println!(
            "  {} {} {} created_at={}",
            record.id,
            record.method.as_deref().unwrap_or("GET"),
            record.url.as_deref().unwrap_or("<none>"),
            record.created_at
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "courier failed");
            ExitCode::FAILURE
        }
    }
}
