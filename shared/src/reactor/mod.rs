//! 액터 방식 작업 스케줄러
//!
//! - [`Reactor`]: 직렬 실행 단위
//! - [`ReactorHandle`] / [`TaskQueueRef`]: 소유/비소유 작업 큐 핸들
//! - [`GlobalQueue`]: 준비된 작업 큐를 처리하는 워커 스레드 풀

pub mod global_queue;
#[allow(clippy::module_inception)]
pub mod reactor;
mod ready_queue;
pub mod task_queue;

pub use global_queue::{GlobalQueue, SchedulerStats};
pub use reactor::{Reactor, ReactorHandle, TaskQueueRef};
pub use task_queue::{QueueId, QueueState, Task, TaskQueue};
