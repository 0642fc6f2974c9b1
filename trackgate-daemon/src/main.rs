use anyhow::Result;
use clap::Parser;

use trackgate_core::config::TrackgateConfig;
use trackgate_core::error::{ConfigError, TrackgateError};
use trackgate_daemon::cli::DaemonCli;
use trackgate_daemon::{logging, metrics_server};
use trackgate_ingest::decoder::DecoderRouter;
use trackgate_ingest::sink::build_sinks;
use trackgate_ingest::subscriber::MqttSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    // 설정 로드. 기본 경로의 파일이 없으면 기본값으로 동작합니다.
    let (mut config, config_missing) = match TrackgateConfig::load(&args.config).await {
        Ok(config) => (config, false),
        Err(TrackgateError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = TrackgateConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            (config, true)
        }
        Err(e) => return Err(anyhow::anyhow!("failed to load configuration: {}", e)),
    };

    // CLI 오버라이드는 파일/환경변수보다 우선합니다.
    if let Some(level) = &args.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.general.log_format = format.clone();
    }
    config.validate()?;

    if args.validate {
        println!("{}", validate_summary(&args.config, config_missing));
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    if config_missing {
        tracing::warn!(
            path = %args.config.display(),
            "configuration file not found; running with defaults"
        );
    }

    tracing::info!("trackgate-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    // 싱크 팬아웃 조립 (파일 싱크는 여기서 열립니다)
    let fanout = build_sinks(&config.sinks)
        .map_err(|e| anyhow::anyhow!("failed to build sinks: {}", e))?;
    tracing::info!(sinks = fanout.len(), "sink fanout assembled");

    // 구독자 빌드
    let mut subscriber = MqttSubscriber::new(
        config.broker.clone(),
        DecoderRouter::with_defaults(),
        Box::new(fanout),
        config.sinks.pretty,
    )
    .map_err(|e| anyhow::anyhow!("failed to build mqtt subscriber: {}", e))?;

    let cancel = subscriber.cancel_token();
    let handle = tokio::spawn(async move { subscriber.run().await });

    tracing::info!("trackgate-daemon running — press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // 우아한 종료
    cancel.cancel();
    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "subscriber exited with error"),
        Err(e) => tracing::error!(error = %e, "subscriber task panicked"),
    }

    tracing::info!("trackgate-daemon shut down");
    Ok(())
}

/// `--validate` 출력 한 줄. 파일이 없어 기본값으로 검증했는지를 구분합니다.
fn validate_summary(path: &std::path::Path, file_missing: bool) -> String {
    if file_missing {
        format!(
            "configuration OK: built-in defaults ({} not found)",
            path.display()
        )
    } else {
        format!("configuration OK: {}", path.display())
    }
}
