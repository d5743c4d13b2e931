//! Points Wallet CLI
//!
//! 积分钱包命令行入口：加载配置、初始化可观测性、执行单个子命令并以 JSON 输出结果。

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use points_shared::config::AppConfig;
use points_shared::observability;
use points_wallet::PointsWallet;
use points_wallet::cli::{Cli, CommandRunner};
use points_wallet::error::PointsError;
use serde_json::json;
use tracing::error;

const SERVICE_NAME: &str = "points-wallet";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let dump_metrics = cli.dump_metrics;

    let mut config = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    let observability = match observability::init(&config.observability) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli, &config).await;

    if dump_metrics {
        if let Some(rendered) = observability.render_metrics() {
            eprintln!("{rendered}");
        }
    }

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            let body = match e.downcast_ref::<PointsError>() {
                Some(err) => json!({
                    "error": err.error_code(),
                    "kind": format!("{:?}", err.kind()),
                    "message": err.to_string(),
                }),
                None => json!({ "error": "INTERNAL_ERROR", "message": format!("{e:#}") }),
            };
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<String> {
    let wallet = PointsWallet::open(config)
        .await
        .context("Failed to open points wallet storage")?;
    let runner = CommandRunner::new(wallet);

    let output = runner.run(cli.command).await?;
    Ok(serde_json::to_string_pretty(&output)?)
}
