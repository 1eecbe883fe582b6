//! 네트워크 패키지 버퍼
//!
//! 재활용 풀에 담기는 대표 객체입니다. 헤더 필드와 페이로드만 보관하며
//! 와이어 포맷 인코딩/디코딩은 코덱 계층의 책임입니다.

use super::recyclable::Recyclable;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 유효한 패키지 id 범위
pub const MINIMUM_PACKAGE_ID: u32 = 1001;
pub const MAXIMUM_PACKAGE_ID: u32 = 999_999;

pub const DEFAULT_PACKAGE_MAGIC: u32 = 20_250_122;
pub const DEFAULT_PACKAGE_VERSION: u32 = 1001;

/// 페이로드 코덱 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CodecMethod {
    LineBased,
    #[default]
    Protobuf,
}

impl CodecMethod {
    pub fn as_u16(&self) -> u16 {
        match self {
            CodecMethod::LineBased => 0,
            CodecMethod::Protobuf => 1,
        }
    }
}

/// 새 패키지 헤더에 채워질 기본값
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHeader {
    pub magic: u32,
    pub version: u32,
    pub method: CodecMethod,
}

impl Default for PackageHeader {
    fn default() -> Self {
        Self {
            magic: DEFAULT_PACKAGE_MAGIC,
            version: DEFAULT_PACKAGE_VERSION,
            method: CodecMethod::default(),
        }
    }
}

/// 네트워크 패키지
#[derive(Clone, Default)]
pub struct Package {
    id: u32,
    header: PackageHeader,
    defaults: PackageHeader,
    data: BytesMut,
}

impl Package {
    /// 헤더 기본값을 지정해 생성
    pub fn with_header(defaults: PackageHeader) -> Self {
        Self {
            id: 0,
            header: defaults,
            defaults,
            data: BytesMut::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) -> &mut Self {
        self.id = id;
        self
    }

    pub fn magic(&self) -> u32 {
        self.header.magic
    }

    pub fn set_magic(&mut self, magic: u32) -> &mut Self {
        self.header.magic = magic;
        self
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn set_version(&mut self, version: u32) -> &mut Self {
        self.header.version = version;
        self
    }

    pub fn method(&self) -> CodecMethod {
        self.header.method
    }

    pub fn set_method(&mut self, method: CodecMethod) -> &mut Self {
        self.header.method = method;
        self
    }

    /// 페이로드를 `data`로 교체
    pub fn set_data(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.data.clear();
        self.data.extend_from_slice(data.as_ref());
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// 페이로드를 복사해 불변 버퍼로 반환
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }

    /// id가 유효 범위 안에 있는지
    pub fn has_valid_id(&self) -> bool {
        (MINIMUM_PACKAGE_ID..=MAXIMUM_PACKAGE_ID).contains(&self.id)
    }

    /// 유효 범위 밖의 id로 표시
    pub fn invalidate(&mut self) {
        self.id = MINIMUM_PACKAGE_ID - 1;
    }

    /// 다른 패키지의 헤더와 페이로드 복사
    pub fn copy_from(&mut self, other: &Package) {
        self.id = other.id;
        self.header = other.header;
        self.set_data(&other.data);
    }
}

impl Recyclable for Package {
    fn initial(&mut self) {
        self.header = self.defaults;
        self.data.clear();
    }

    fn reset(&mut self) {
        self.data.clear();
        self.invalidate();
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("id", &self.id)
            .field("magic", &self.header.magic)
            .field("version", &self.header.version)
            .field("method", &self.header.method)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_applies_header_defaults() {
        let mut pkg = Package::with_header(PackageHeader {
            magic: 7,
            version: 2,
            method: CodecMethod::LineBased,
        });
        pkg.set_magic(1).set_method(CodecMethod::Protobuf).set_data(b"abc");

        pkg.initial();
        assert_eq!(pkg.magic(), 7);
        assert_eq!(pkg.version(), 2);
        assert_eq!(pkg.method(), CodecMethod::LineBased);
        assert_eq!(pkg.data_len(), 0);
    }

    #[test]
    fn test_reset_invalidates() {
        let mut pkg = Package::default();
        pkg.set_id(MINIMUM_PACKAGE_ID).set_data("hello");
        assert!(pkg.has_valid_id());

        pkg.reset();
        assert!(!pkg.has_valid_id());
        assert!(pkg.data().is_empty());
    }

    #[test]
    fn test_copy_from() {
        let mut src = Package::default();
        src.set_id(2001).set_version(9).set_data("payload");

        let mut dst = Package::default();
        dst.copy_from(&src);
        assert_eq!(dst.id(), 2001);
        assert_eq!(dst.version(), 9);
        assert_eq!(dst.data(), b"payload");
        assert_eq!(dst.to_bytes(), Bytes::from_static(b"payload"));
    }
}
