//! 二进制结构描述
//!
//! 定义与原生模块交换的两个定长记录（版本信息、初始化选项）以及宽字符输出缓冲区。
//! 所有记录都以字节镜像的形式跨越调用边界：`encode` 产生与原生布局逐字节一致的镜像，
//! `decode` 从镜像还原记录。尺寸不符视为描述符缺陷，返回 [`LayoutError`]，绝不静默截断。

use bytemuck::Pod;
use thiserror::Error;

pub mod init_options;
pub mod text;
pub mod version;


pub use init_options::{ApiInitOptions, InitOptions, NativeBool};
pub use text::{WideBuffer, WideChar, LANGUAGE_CAPACITY, PATH_CAPACITY};
pub use version::{CVersionInfo, VersionRecord};

/// 布局/编组错误
///
/// 出现即表示本层的描述符或编组逻辑有缺陷，对当前操作是致命的，但不影响进程。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout size mismatch for {record}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Text for {field} is {length} characters, capacity is {capacity}")]
    TextOverflow {
        field: &'static str,
        capacity: usize,
        length: usize,
    },

    #[error("Character {character:?} in {field} has no single-byte encoding")]
    Unencodable {
        field: &'static str,
        character: char,
    },

    #[error("Text for {field} contains an interior NUL")]
    InteriorNul { field: &'static str },
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// 从字节镜像读取一个 `#[repr(C)]` 记录（不要求对齐）
pub(crate) fn read_record<T: Pod>(record: &'static str, bytes: &[u8]) -> LayoutResult<T> {
    bytemuck::try_pod_read_unaligned(bytes).map_err(|_| LayoutError::SizeMismatch {
        record,
        expected: std::mem::size_of::<T>(),
        actual: bytes.len(),
    })
}

/// 把记录写回调用方提供的字节镜像
pub(crate) fn write_record<T: Pod>(record: &'static str, value: &T, out: &mut [u8]) -> LayoutResult<()> {
    let bytes = bytemuck::bytes_of(value);
    if out.len() != bytes.len() {
        return Err(LayoutError::SizeMismatch {
            record,
            expected: bytes.len(),
            actual: out.len(),
        });
    }
    out.copy_from_slice(bytes);
    Ok(())
}
