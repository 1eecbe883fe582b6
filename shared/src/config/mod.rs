//! 코어 설정 모듈
//!
//! 설정 문서 파싱 자체는 외부 책임이며, 여기서는 `.env` 파일과
//! 시스템 환경변수에서 스케줄러/재활용 풀 설정 값을 읽어옵니다.

pub mod recycler;
pub mod scheduler;

pub use recycler::RecyclerConfig;
pub use scheduler::SchedulerConfig;

use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// `.env` 파일을 로드합니다.
///
/// 로드 순서:
/// 1. 상위 디렉토리의 .env 파일
/// 2. 현재 디렉토리의 .env 파일
/// 3. 상위의 상위 디렉토리 (프로젝트 루트)
///
/// 파일이 하나도 없으면 시스템 환경변수와 기본값만 사용합니다.
pub fn load_env_file() -> bool {
    let env_paths = ["../.env", ".env", "../../.env"];

    for path in env_paths {
        if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
            info!(".env 파일 로드 성공: {}", path);
            return true;
        }
    }

    debug!(".env 파일 없음, 기본값과 시스템 환경변수를 사용합니다");
    false
}

/// 환경변수 값을 읽어 파싱합니다. 값이 없으면 기본값을 반환합니다.
pub fn env_or<T: FromStr>(key: &str, default: T) -> ConfigResult<T> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Parse {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
