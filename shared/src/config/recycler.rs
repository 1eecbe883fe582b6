//! 재활용 풀 설정
//!
//! 확장/수축 임계값과 비율을 정의합니다. 수축 임계값은 확장 임계값보다
//! 반드시 낮아야 하며, 그 간격만큼 작은 사용량 변동에서 확장/수축이
//! 반복되지 않습니다.

use super::env_or;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// 재활용 풀 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclerConfig {
    /// `init` 기본 용량
    pub default_capacity: usize,
    /// 최소 용량 (수축 시 이 값 아래로 내려가지 않음)
    pub minimum_capacity: usize,
    /// 사용률이 이 값 이상이면 확장
    pub expand_threshold: f32,
    /// 확장 배수 (현재 용량 대비)
    pub expand_scale: f32,
    /// 사용률이 이 값 미만이면 수축
    pub shrink_threshold: f32,
    /// 수축 비율 (현재 용량 대비)
    pub shrink_scale: f32,
    /// 반환 후 수축 검사까지의 지연
    pub shrink_delay: Duration,
}

impl Default for RecyclerConfig {
    fn default() -> Self {
        Self {
            default_capacity: 64,
            minimum_capacity: 16,
            expand_threshold: 0.75,
            expand_scale: 1.0,
            shrink_threshold: 0.3,
            shrink_scale: 0.5,
            shrink_delay: Duration::from_secs(1),
        }
    }
}

impl RecyclerConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `prefix`가 `package_pool`이면 `package_pool_default_capacity`,
    /// `package_pool_expand_threshold` 등의 키를 읽습니다.
    pub fn from_env(prefix: &str) -> ConfigResult<Self> {
        let defaults = Self::default();
        let key = |name: &str| format!("{}_{}", prefix, name);

        let config = Self {
            default_capacity: env_or(&key("default_capacity"), defaults.default_capacity)?,
            minimum_capacity: env_or(&key("minimum_capacity"), defaults.minimum_capacity)?,
            expand_threshold: env_or(&key("expand_threshold"), defaults.expand_threshold)?,
            expand_scale: env_or(&key("expand_scale"), defaults.expand_scale)?,
            shrink_threshold: env_or(&key("shrink_threshold"), defaults.shrink_threshold)?,
            shrink_scale: env_or(&key("shrink_scale"), defaults.shrink_scale)?,
            shrink_delay: Duration::from_millis(env_or(
                &key("shrink_delay_ms"),
                defaults.shrink_delay.as_millis() as u64,
            )?),
        };

        config.validate()?;
        info!("재활용 풀 설정 로드 완료 [{}]: {:?}", prefix, config);
        Ok(config)
    }

    /// 설정 검증
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.expand_threshold > 0.0 && self.expand_threshold <= 1.0) {
            return Err(ConfigError::out_of_range(
                "expand_threshold",
                self.expand_threshold,
                "(0, 1] 범위여야 합니다",
            ));
        }

        if !(self.shrink_threshold >= 0.0 && self.shrink_threshold < 1.0) {
            return Err(ConfigError::out_of_range(
                "shrink_threshold",
                self.shrink_threshold,
                "[0, 1) 범위여야 합니다",
            ));
        }

        if self.shrink_threshold >= self.expand_threshold {
            return Err(ConfigError::ThresholdOrder {
                shrink: self.shrink_threshold,
                expand: self.expand_threshold,
            });
        }

        if !(self.expand_scale > 0.0) {
            return Err(ConfigError::out_of_range(
                "expand_scale",
                self.expand_scale,
                "0보다 커야 합니다",
            ));
        }

        if !(self.shrink_scale >= 0.0 && self.shrink_scale < 1.0) {
            return Err(ConfigError::out_of_range(
                "shrink_scale",
                self.shrink_scale,
                "[0, 1) 범위여야 합니다",
            ));
        }

        if self.minimum_capacity > self.default_capacity {
            return Err(ConfigError::out_of_range(
                "minimum_capacity",
                self.minimum_capacity,
                "default_capacity 이하여야 합니다",
            ));
        }

        Ok(())
    }
}
