//! 로깅 설정 관리
//!
//! 로깅 시스템의 설정 파라미터와 서비스 타입 정의를 담당합니다.

use serde::{Deserialize, Serialize};

/// 서비스 타입 열거형
///
/// 로그 필드에 실리는 프로세스 구분 값입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// 게임 월드 서버
    GameWorld,
    /// 공유 라이브러리 (테스트 포함)
    Shared,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::GameWorld => "gameworld",
            ServiceType::Shared => "shared",
        }
    }
}

/// 로깅 시스템 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 서비스 타입
    pub service: ServiceType,
    /// `RUST_LOG`가 없을 때 사용할 기본 레벨 (기본값: info)
    pub level: String,
    /// JSON 형식 여부 (기본값: false)
    pub json_format: bool,
    /// 로그에 스레드 이름 표시 여부 (기본값: true)
    pub with_thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service: ServiceType::Shared,
            level: "info".to_string(),
            json_format: false,
            with_thread_names: true,
        }
    }
}

impl LoggingConfig {
    pub fn for_service(service: ServiceType) -> Self {
        Self {
            service,
            ..Default::default()
        }
    }

    /// 환경변수에서 설정 로드
    pub fn from_env(service: ServiceType) -> Self {
        let mut config = Self::for_service(service);

        if let Ok(val) = std::env::var("log_level") {
            if !val.trim().is_empty() {
                config.level = val.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("log_json") {
            if let Ok(json) = val.parse() {
                config.json_format = json;
            }
        }

        if let Ok(val) = std::env::var("log_thread_names") {
            if let Ok(names) = val.parse() {
                config.with_thread_names = names;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_str() {
        assert_eq!(ServiceType::GameWorld.as_str(), "gameworld");
        assert_eq!(ServiceType::Shared.as_str(), "shared");
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::for_service(ServiceType::GameWorld);
        assert_eq!(config.service, ServiceType::GameWorld);
        assert_eq!(config.level, "info");
        assert!(!config.json_format);
    }
}
