use stock_tracker::config::{Config, INSTRUMENT_SYMBOL};
use stock_tracker::fetchers::yahoo::YahooFetcher;
use stock_tracker::scheduler::DailyScheduler;
use stock_tracker::services::data_service::DataService;
use stock_tracker::store::mongo::MongoWriter;

use log::{error, info, warn};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::init();

    // 加载配置，缺少 MONGO_URI 直接退出
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("MONGO_URI not found in environment. Please set it and try again. ({})", e);
            std::process::exit(1);
        }
    };

    let fetcher = Arc::new(YahooFetcher::new()?);
    let writer = MongoWriter::new(&config);
    let service = DataService::new(INSTRUMENT_SYMBOL, fetcher, writer);

    // 启动时先做一次全量抓取（从固定起始日期开始）
    if let Err(e) = service.run_cycle(None).await {
        warn!("Initial fetch failed, will retry on the daily schedule: {}", e);
    }

    // 每日定时任务
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let scheduler = DailyScheduler::new(service, shutdown_rx);
    let scheduler_handle = tokio::spawn(scheduler.run());

    info!("Daemon started. Press Ctrl+C to exit.");

    wait_for_shutdown().await;
    info!("Termination signal received, shutting down...");
    let _ = shutdown_tx.send(());
    let _ = scheduler_handle.await;

    info!("Daemon stopped.");
    Ok(())
}

/// 等待 SIGINT 或 SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
