//! 로깅 시스템 초기화
//!
//! `tracing` 기반 구조화 로깅을 설치합니다. `RUST_LOG` 환경변수가 있으면
//! 그 필터를 우선 사용하고, 없으면 설정의 기본 레벨을 사용합니다.
//!
//! # 사용 예시
//! ```rust,no_run
//! use uranus_shared::logging::{init_logging, LoggingConfig, ServiceType};
//!
//! let config = LoggingConfig::from_env(ServiceType::GameWorld);
//! init_logging(&config);
//! ```

pub mod config;

pub use config::{LoggingConfig, ServiceType};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 전역 tracing 구독자 설치
///
/// 이미 설치되어 있으면 아무 것도 하지 않고 `false`를 반환합니다.
/// 테스트와 바이너리가 모두 호출해도 안전합니다.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_thread_names(config.with_thread_names),
            )
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_names(config.with_thread_names),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(
            service = config.service.as_str(),
            json = config.json_format,
            "로깅 시스템 초기화 완료"
        );
    }

    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::for_service(ServiceType::Shared);
        // 다른 테스트가 먼저 설치했을 수 있으므로 두 번째 호출만 확정적으로 검사
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
