//! 전역 큐(워커 풀) 설정

use super::env_or;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// 처리 비율의 기준값. `batch_rate == BASE_RATE` 이면 한 번의 패스에서
/// 현재 버퍼 전체를 처리합니다.
pub const BASE_RATE: u32 = 10_000;

/// 한 번의 패스가 점유할 수 있는 최대 시간 기본값
pub const DEFAULT_MAX_PASS_DURATION: Duration = Duration::from_secs(3);

/// 전역 큐 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 워커 스레드 수 (시작 시 한 번만 읽음)
    pub worker_threads: usize,
    /// 패스당 처리 비율 (BASE_RATE 기준)
    pub batch_rate: u32,
    /// 패스당 최대 처리 시간
    pub max_pass_duration: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(2),
            batch_rate: BASE_RATE,
            max_pass_duration: DEFAULT_MAX_PASS_DURATION,
        }
    }
}

impl SchedulerConfig {
    /// 지정한 워커 수로 생성 (나머지는 기본값)
    pub fn with_workers(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Default::default()
        }
    }

    /// 환경변수에서 설정 로드
    ///
    /// - `work_thread`: 워커 스레드 수
    /// - `task_batch_rate`: 패스당 처리 비율
    /// - `task_max_pass_ms`: 패스당 최대 처리 시간 (밀리초)
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let config = Self {
            worker_threads: env_or("work_thread", defaults.worker_threads)?,
            batch_rate: env_or("task_batch_rate", defaults.batch_rate)?,
            max_pass_duration: Duration::from_millis(env_or(
                "task_max_pass_ms",
                defaults.max_pass_duration.as_millis() as u64,
            )?),
        };

        config.validate()?;
        info!("전역 큐 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_threads == 0 {
            return Err(ConfigError::out_of_range(
                "worker_threads",
                self.worker_threads,
                "워커 스레드는 최소 1개 이상이어야 합니다",
            ));
        }

        if self.batch_rate == 0 || self.batch_rate > BASE_RATE {
            return Err(ConfigError::out_of_range(
                "batch_rate",
                self.batch_rate,
                "1..=10000 범위여야 합니다",
            ));
        }

        if self.max_pass_duration.is_zero() {
            return Err(ConfigError::out_of_range(
                "max_pass_duration",
                format!("{:?}", self.max_pass_duration),
                "0보다 커야 합니다",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SchedulerConfig::default();
        assert!(config.worker_threads >= 2);
        assert_eq!(config.batch_rate, BASE_RATE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SchedulerConfig::with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "worker_threads", .. })
        ));
    }

    #[test]
    fn test_batch_rate_range() {
        let mut config = SchedulerConfig::with_workers(1);
        config.batch_rate = BASE_RATE + 1;
        assert!(config.validate().is_err());

        config.batch_rate = 0;
        assert!(config.validate().is_err());

        config.batch_rate = 2_500;
        assert!(config.validate().is_ok());
    }
}
