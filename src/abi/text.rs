//! 定长文本缓冲区
//!
//! 两种文本表示：
//! - 单字节定长缓冲区（初始化选项中的语言、地图路径、配置名），每字符一个字节（Latin-1），空字节填充；
//! - 宽字符输出缓冲区（安装路径、当前语言），单元宽度与平台 `wchar_t` 一致。
//!
//! 解码都在第一个空单元处截断；恰好填满容量、没有结尾空字节的文本是合法的。

use std::ffi::CString;

use super::{LayoutError, LayoutResult};

/// 平台 `wchar_t`：Windows 上为 UTF-16 单元
#[cfg(windows)]
pub type WideChar = u16;

/// 平台 `wchar_t`：其他平台上为 UTF-32 单元
#[cfg(not(windows))]
pub type WideChar = u32;

/// `GetAmPath` 输出缓冲区容量（宽字符）
pub const PATH_CAPACITY: usize = 512;

/// `GetAmCurrentLanguage` 输出缓冲区容量（宽字符）
pub const LANGUAGE_CAPACITY: usize = 16;

fn single_byte(field: &'static str, ch: char) -> LayoutResult<u8> {
    match ch as u32 {
        0 => Err(LayoutError::InteriorNul { field }),
        code @ 1..=0xFF => Ok(code as u8),
        _ => Err(LayoutError::Unencodable { field, character: ch }),
    }
}

/// 编码为空字节填充的定长缓冲区
pub fn encode_fixed<const N: usize>(field: &'static str, text: &str) -> LayoutResult<[u8; N]> {
    let length = text.chars().count();
    if length > N {
        return Err(LayoutError::TextOverflow {
            field,
            capacity: N,
            length,
        });
    }

    let mut buf = [0u8; N];
    for (slot, ch) in buf.iter_mut().zip(text.chars()) {
        *slot = single_byte(field, ch)?;
    }
    Ok(buf)
}

/// 解码定长缓冲区，在第一个空字节处截断
pub fn decode_fixed(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// 编码为以空字节结尾的单字节 C 字符串（命令文本按原样传递，不做任何替换）
pub fn encode_c_string(field: &'static str, text: &str) -> LayoutResult<CString> {
    let bytes = text
        .chars()
        .map(|ch| single_byte(field, ch))
        .collect::<LayoutResult<Vec<u8>>>()?;
    CString::new(bytes).map_err(|_| LayoutError::InteriorNul { field })
}

/// 宽字符输出缓冲区
///
/// 由调用方分配，原生侧写入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideBuffer {
    units: Vec<WideChar>,
}

impl WideBuffer {
    /// 分配全零缓冲区
    pub fn zeroed(capacity: usize) -> Self {
        Self {
            units: vec![0; capacity],
        }
    }

    /// 按平台宽度编码文本，空单元填充到 `capacity`
    pub fn encode(field: &'static str, text: &str, capacity: usize) -> LayoutResult<Self> {
        let mut units = encode_wide(text);
        if units.len() > capacity {
            return Err(LayoutError::TextOverflow {
                field,
                capacity,
                length: units.len(),
            });
        }
        if units.contains(&0) {
            return Err(LayoutError::InteriorNul { field });
        }
        units.resize(capacity, 0);
        Ok(Self { units })
    }

    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    pub fn as_slice(&self) -> &[WideChar] {
        &self.units
    }

    pub fn as_mut_slice(&mut self) -> &mut [WideChar] {
        &mut self.units
    }

    /// 解码到第一个空单元；非法单元替换为 U+FFFD
    pub fn decode(&self) -> String {
        let end = self
            .units
            .iter()
            .position(|&u| u == 0)
            .unwrap_or(self.units.len());
        decode_wide(&self.units[..end])
    }
}

#[cfg(windows)]
fn encode_wide(text: &str) -> Vec<WideChar> {
    text.encode_utf16().collect()
}

#[cfg(not(windows))]
fn encode_wide(text: &str) -> Vec<WideChar> {
    text.chars().map(|c| c as u32).collect()
}

#[cfg(windows)]
fn decode_wide(units: &[WideChar]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(not(windows))]
fn decode_wide(units: &[WideChar]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
