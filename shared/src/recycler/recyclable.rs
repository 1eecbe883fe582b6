//! 재활용 가능 객체 계약
//!
//! 재활용 풀이 정해진 시점에 호출하는 세 가지 훅을 정의합니다.
//! - `on_create`: 풀이 객체를 새로 만들었을 때 한 번
//! - `initial`: 풀에서 꺼낼 때마다
//! - `reset`: 풀로 반환될 때마다

use serde::{Deserialize, Serialize};

/// 재활용 풀이 관리하는 객체
pub trait Recyclable: Send + 'static {
    /// 풀이 객체를 생성한 직후 한 번 호출
    fn on_create(&mut self) {}

    /// `Recycler::acquire` 시 호출
    fn initial(&mut self);

    /// `Recycler::recycle` 시 호출
    fn reset(&mut self);
}

/// 풀에서 꺼낸 객체의 생애 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecycleState {
    /// 획득 직후, 아직 값이 쓰이지 않음
    Unused,
    /// 값이 기록되어 사용 중
    InUse,
}

impl RecycleState {
    pub fn is_unused(&self) -> bool {
        matches!(self, RecycleState::Unused)
    }
}
