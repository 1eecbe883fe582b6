//! 적응형 객체 재활용
//!
//! - [`Recyclable`]: 풀 객체의 생애 훅
//! - [`Recycler`]: 사용률 기반으로 확장/수축하는 풀
//! - [`Pooled`]: drop 시 자동 반환되는 핸들
//! - [`Package`]: 네트워크 패키지 버퍼

pub mod package;
pub mod recyclable;
#[allow(clippy::module_inception)]
pub mod recycler;

pub use package::{CodecMethod, Package, PackageHeader};
pub use recyclable::{RecycleState, Recyclable};
pub use recycler::{Pooled, Recycler, RecyclerStats};
