//! Uranus 서버 공유 코어
//!
//! 게임 월드 서버의 모든 상위 시스템(매니저, 플레이어 에이전트 등)이 사용하는
//! 동시성 및 자원 수명 관리 코어입니다.
//!
//! # 구성
//!
//! ```text
//! uranus-shared
//! ├── reactor   (액터 방식 작업 스케줄러)
//! │   ├── Reactor / ReactorHandle / TaskQueueRef
//! │   ├── TaskQueue (리액터별 메일박스)
//! │   └── GlobalQueue (워커 스레드 풀)
//! ├── recycler  (적응형 객체 재활용 풀)
//! │   ├── Recyclable / Recycler / Pooled
//! │   └── Package (네트워크 패키지 버퍼)
//! ├── config    (.env + 환경변수 설정)
//! ├── logging   (tracing 초기화)
//! └── error     (에러 타입)
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod reactor;
pub mod recycler;

pub use config::{RecyclerConfig, SchedulerConfig};
pub use error::{
    ConfigError, ConfigResult, RecyclerError, RecyclerResult, SchedulerError, SchedulerResult,
};
pub use reactor::{GlobalQueue, QueueId, QueueState, Reactor, ReactorHandle, TaskQueueRef};
pub use recycler::{Package, Pooled, Recyclable, Recycler, RecyclerStats};
