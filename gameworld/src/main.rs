//! 게임 월드 서버 메인 진입점
//!
//! 환경 설정은 .env 파일과 시스템 환경변수에서 로드됩니다.

use anyhow::{Context, Result};
use gameworld::{GameWorld, ServerConfig};
use tokio::runtime::Handle;
use tracing::{error, info};
use uranus_shared::config::load_env_file;
use uranus_shared::logging::{init_logging, LoggingConfig, ServiceType};

#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 설정
    load_env_file();
    init_logging(&LoggingConfig::from_env(ServiceType::GameWorld));

    // 환경 설정 로드
    let config = ServerConfig::from_env()?;

    info!("=== 게임 월드 설정 ===");
    info!("서버 이름: {}", config.server_name);
    info!("워커 스레드: {}", config.scheduler.worker_threads);
    info!("틱 간격: {:?}", config.tick_interval);
    info!("패키지 풀 기본 용량: {}", config.package_pool.default_capacity);
    info!("====================");

    let mut world = GameWorld::new(config, Handle::current())?;
    world.start()?;

    // 종료 시그널 대기
    tokio::signal::ctrl_c()
        .await
        .context("종료 시그널 대기 실패")?;
    info!("종료 시그널 수신, 서버를 중지합니다...");

    match serde_json::to_string(&world.stats()) {
        Ok(json) => info!("최종 통계: {}", json),
        Err(e) => error!("통계 직렬화 실패: {}", e),
    }

    world.shutdown();
    Ok(())
}
