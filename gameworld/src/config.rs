//! 게임 월드 서버 환경 설정 모듈
//!
//! .env 파일과 시스템 환경변수에서 설정을 로드합니다.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uranus_shared::config::{env_or, load_env_file};
use uranus_shared::logging::{LoggingConfig, ServiceType};
use uranus_shared::{RecyclerConfig, SchedulerConfig};

/// 패키지 풀 환경변수 접두어
pub const PACKAGE_POOL_PREFIX: &str = "package_pool";

/// 게임 월드 서버 설정 구조체
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 서버 이름
    pub server_name: String,
    /// 매니저 틱 간격
    pub tick_interval: Duration,
    /// 전역 큐 설정
    pub scheduler: SchedulerConfig,
    /// 패키지 풀 설정
    pub package_pool: RecyclerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "uranus-world".to_string(),
            tick_interval: Duration::from_millis(100),
            scheduler: SchedulerConfig::default(),
            package_pool: RecyclerConfig::default(),
            logging: LoggingConfig::for_service(ServiceType::GameWorld),
        }
    }
}

impl ServerConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 환경변수:
    /// - server_name: 서버 이름 (기본값: "uranus-world")
    /// - tick_interval_ms: 매니저 틱 간격 (기본값: 100)
    /// - work_thread, task_batch_rate, task_max_pass_ms: 전역 큐
    /// - package_pool_*: 패키지 풀
    /// - log_level, log_json: 로깅
    pub fn from_env() -> Result<Self> {
        load_env_file();

        let defaults = Self::default();
        let config = Self {
            server_name: env_or("server_name", defaults.server_name)?,
            tick_interval: Duration::from_millis(env_or(
                "tick_interval_ms",
                defaults.tick_interval.as_millis() as u64,
            )?),
            scheduler: SchedulerConfig::from_env().context("전역 큐 설정 로드 실패")?,
            package_pool: RecyclerConfig::from_env(PACKAGE_POOL_PREFIX)
                .context("패키지 풀 설정 로드 실패")?,
            logging: LoggingConfig::from_env(ServiceType::GameWorld),
        };

        info!("게임 월드 설정 로드 완료: {}", config.server_name);
        Ok(config)
    }
}

/// 설정 검증 유틸리티
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    if config.server_name.trim().is_empty() {
        anyhow::bail!("서버 이름이 비어있습니다");
    }

    if config.tick_interval.is_zero() {
        anyhow::bail!("유효하지 않은 틱 간격: {:?}", config.tick_interval);
    }

    config
        .scheduler
        .validate()
        .context("전역 큐 설정 검증 실패")?;
    config
        .package_pool
        .validate()
        .context("패키지 풀 설정 검증 실패")?;

    Ok(())
}
