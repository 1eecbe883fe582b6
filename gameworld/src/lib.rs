//! 게임 월드 서버 라이브러리
//!
//! 공유 코어(전역 큐, 재활용 풀)를 묶어 하나의 월드 프로세스를 구성합니다.
//!
//! # 아키텍처
//!
//! ```text
//! GameWorld
//! ├── GlobalQueue (워커 스레드 풀)
//! ├── Recycler<Package> (패키지 풀)
//! └── ManagerSystem (타입별 매니저 + 틱 루프)
//!     └── PlayerManager
//! ```

pub mod config;
pub mod manager;
pub mod world;

pub use config::{validate_config, ServerConfig};
pub use manager::{DayTracker, Manager, ManagerSystem, PlayerManager};
pub use world::{GameWorld, WorldStats};
