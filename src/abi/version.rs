//! 版本信息记录

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use super::{read_record, write_record, LayoutResult};

/// 原生 `CVersionInfo` 布局
///
/// 4 个 u16 加 1 个 u8，原生编译器在末尾补 1 字节对齐到 2。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CVersionInfo {
    pub major_version: u16,
    pub minor_version: u16,
    pub major_build: u16,
    pub minor_build: u16,
    pub platform: u8,
    pub _pad: u8,
}

const _: () = assert!(std::mem::size_of::<CVersionInfo>() == 10);

/// 版本记录
///
/// 每次查询新建，由原生调用填充，之后不可变。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct VersionRecord {
    pub major_version: u16,
    pub minor_version: u16,
    pub major_build: u16,
    pub minor_build: u16,
    pub platform: u8,
}

impl VersionRecord {
    /// 编码后的字节长度
    pub const ENCODED_LEN: usize = std::mem::size_of::<CVersionInfo>();

    pub fn new(
        major_version: u16,
        minor_version: u16,
        major_build: u16,
        minor_build: u16,
        platform: u8,
    ) -> Self {
        Self {
            major_version,
            minor_version,
            major_build,
            minor_build,
            platform,
        }
    }

    pub fn to_native(&self) -> CVersionInfo {
        CVersionInfo {
            major_version: self.major_version,
            minor_version: self.minor_version,
            major_build: self.major_build,
            minor_build: self.minor_build,
            platform: self.platform,
            _pad: 0,
        }
    }

    pub fn from_native(raw: &CVersionInfo) -> Self {
        Self::new(
            raw.major_version,
            raw.minor_version,
            raw.major_build,
            raw.minor_build,
            raw.platform,
        )
    }

    pub fn encode(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.to_native()).to_vec()
    }

    /// 写入调用方提供的镜像（供原生侧模拟使用）
    pub fn encode_into(&self, out: &mut [u8]) -> LayoutResult<()> {
        write_record("CVersionInfo", &self.to_native(), out)
    }

    pub fn decode(bytes: &[u8]) -> LayoutResult<Self> {
        let raw: CVersionInfo = read_record("CVersionInfo", bytes)?;
        Ok(Self::from_native(&raw))
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major_version, self.minor_version, self.major_build, self.minor_build
        )
    }
}
