use crate::services::data_service::DataService;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime};
use log::{error, info};
use std::time::Duration;
use tokio::sync::broadcast;

/// 每日任务触发时刻（本地时间 00:05）
pub const RUN_HOUR: u32 = 0;
pub const RUN_MINUTE: u32 = 5;

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopping,
}

/// 每日调度器
///
/// 在固定时刻触发一次抓取周期，其余时间阻塞等待。
/// 关闭信号通过广播通道送达，正在执行的周期不会被打断。
pub struct DailyScheduler {
    service: DataService,
    shutdown: broadcast::Receiver<()>,
    state: SchedulerState,
}

impl DailyScheduler {
    pub fn new(service: DataService, shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            service,
            shutdown,
            state: SchedulerState::Running,
        }
    }

    /// 计算下一次触发时刻
    pub fn next_run_after(now: &DateTime<Local>) -> DateTime<Local> {
        let fire_time = NaiveTime::from_hms_opt(RUN_HOUR, RUN_MINUTE, 0).unwrap();
        let mut candidate = now.date_naive().and_time(fire_time);
        if candidate <= now.naive_local() {
            candidate += ChronoDuration::days(1);
        }

        // 本地时区不存在该时刻时（夏令时跳变），退化为 24 小时后
        candidate
            .and_local_timezone(Local)
            .earliest()
            .unwrap_or_else(|| *now + ChronoDuration::days(1))
    }

    /// 距下一次触发的等待时长
    fn wait_until_next_run(now: &DateTime<Local>) -> Duration {
        let next = Self::next_run_after(now);
        (next - *now).to_std().unwrap_or(Duration::from_secs(0))
    }

    /// 运行调度循环，直到收到关闭信号
    pub async fn run(mut self) {
        info!(
            "Scheduler started, daily update at {:02}:{:02}",
            RUN_HOUR, RUN_MINUTE
        );

        while self.state == SchedulerState::Running {
            let wait = Self::wait_until_next_run(&Local::now());
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("Shutdown signal received, no further cycles will be scheduled");
                    self.state = SchedulerState::Stopping;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_daily_cycle().await;
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// 每日周期：抓取昨日以来的数据
    async fn run_daily_cycle(&self) {
        let yesterday = Local::now().date_naive() - ChronoDuration::days(1);
        match self.service.run_cycle(Some(yesterday)).await {
            Ok(count) => info!("Daily update finished, {} records stored", count),
            Err(e) => error!("Daily update failed: {}", e),
        }
    }
}
