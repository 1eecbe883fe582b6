//! 통합 에러 타입
//!
//! 스케줄러/재활용 풀 코어에서 호출자에게 전달되는 에러만 정의합니다.
//! 초기화 전 획득, 외부 객체 반환, 제거된 큐에 대한 작업 추가 같은 경우는
//! 에러가 아니라 로그만 남기는 no-op으로 처리합니다.

use thiserror::Error;

/// 설정 값 검증 에러
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("설정 값 범위 오류: {field} = {value} ({reason})")]
    OutOfRange {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("수축 임계값({shrink})은 확장 임계값({expand})보다 작아야 합니다")]
    ThresholdOrder { shrink: f32, expand: f32 },

    #[error("환경변수 파싱 실패: {key}={value}")]
    Parse { key: String, value: String },
}

/// 전역 큐(워커 풀) 에러
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("워커 스레드 생성 실패: {name}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("전역 큐가 이미 시작되었습니다")]
    AlreadyStarted,

    #[error("종료된 전역 큐는 다시 시작할 수 없습니다")]
    ShutDown,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 재활용 풀 생성 에러
#[derive(Error, Debug)]
pub enum RecyclerError {
    #[error("tokio 런타임 컨텍스트 밖에서 재활용 풀을 생성할 수 없습니다")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type SchedulerResult<T> = Result<T, SchedulerError>;
pub type RecyclerResult<T> = Result<T, RecyclerError>;

impl ConfigError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl ToString,
        reason: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_order_message() {
        let err = ConfigError::ThresholdOrder {
            shrink: 0.8,
            expand: 0.75,
        };
        let message = err.to_string();
        assert!(message.contains("0.8"));
        assert!(message.contains("0.75"));
    }

    #[test]
    fn test_config_error_into_scheduler_error() {
        let err: SchedulerError = ConfigError::out_of_range("worker_threads", 0, "must be > 0").into();
        assert!(matches!(err, SchedulerError::Config(ConfigError::OutOfRange { .. })));
    }
}
