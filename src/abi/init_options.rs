//! 初始化选项记录
//!
//! 字段顺序与宽度必须与原生 `ApiInitOptions` 完全一致，任何一个字段的重排或改宽都会
//! 让其后所有字段错位。布尔字段是 Win32 `BOOL`（4 字节），进程创建标志槽是指针宽度。

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::text::{decode_fixed, encode_fixed};
use super::{read_record, LayoutResult};

/// Win32 `BOOL`
pub type NativeBool = i32;

/// 语言标签缓冲区容量（字节）
pub const INIT_LANG_CAPACITY: usize = 16;
/// 地图数据路径缓冲区容量（字节）
pub const MAP_PATH_CAPACITY: usize = 512;
/// 配置名缓冲区容量（字节）
pub const PROFILE_CAPACITY: usize = 256;

/// 默认会话超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u32 = 60_000;

pub(crate) fn to_native_bool(value: bool) -> NativeBool {
    value as NativeBool
}

/// 原生 `ApiInitOptions` 布局
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ApiInitOptions {
    pub start_if_not_running: NativeBool,
    pub timeout_ms: u32,
    /// `BOOL*` 输出槽，镜像中以地址值存放，调用之外恒为 0
    pub process_created: usize,
    pub fast_start: NativeBool,
    pub keep_in_back: NativeBool,
    pub init_lang: [u8; INIT_LANG_CAPACITY],
    pub map_path: [u8; MAP_PATH_CAPACITY],
    pub profile: [u8; PROFILE_CAPACITY],
}

#[cfg(target_pointer_width = "64")]
const _: () = assert!(std::mem::size_of::<ApiInitOptions>() == 808);
#[cfg(target_pointer_width = "32")]
const _: () = assert!(std::mem::size_of::<ApiInitOptions>() == 804);

impl ApiInitOptions {
    /// 让输出槽指向调用方持有的 `BOOL`
    ///
    /// 槽只在本次原生调用期间有效，调用返回后必须清零。
    pub fn attach_process_created(&mut self, slot: &mut NativeBool) {
        self.process_created = slot as *mut NativeBool as usize;
    }

    pub fn detach_process_created(&mut self) {
        self.process_created = 0;
    }
}

/// 会话初始化选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitOptions {
    /// AutoMapa 未运行时是否自动启动
    pub start_if_not_running: bool,
    /// 超时（毫秒）
    pub timeout_ms: u32,
    /// 快速启动模式
    pub fast_start: bool,
    /// 保持在后台
    pub keep_in_back: bool,
    /// 语言标签
    pub language: String,
    /// 地图数据路径
    pub map_path: String,
    /// 配置名
    pub profile: String,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            start_if_not_running: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fast_start: false,
            keep_in_back: false,
            language: String::new(),
            map_path: String::new(),
            profile: String::new(),
        }
    }
}

impl InitOptions {
    /// 编码后的字节长度（取决于指针宽度）
    pub const ENCODED_LEN: usize = std::mem::size_of::<ApiInitOptions>();

    pub fn to_native(&self) -> LayoutResult<ApiInitOptions> {
        Ok(ApiInitOptions {
            start_if_not_running: to_native_bool(self.start_if_not_running),
            timeout_ms: self.timeout_ms,
            process_created: 0,
            fast_start: to_native_bool(self.fast_start),
            keep_in_back: to_native_bool(self.keep_in_back),
            init_lang: encode_fixed("szInitLang", &self.language)?,
            map_path: encode_fixed("szMapPath", &self.map_path)?,
            profile: encode_fixed("szProfile", &self.profile)?,
        })
    }

    pub fn from_native(raw: &ApiInitOptions) -> Self {
        Self {
            start_if_not_running: raw.start_if_not_running != 0,
            timeout_ms: raw.timeout_ms,
            fast_start: raw.fast_start != 0,
            keep_in_back: raw.keep_in_back != 0,
            language: decode_fixed(&raw.init_lang),
            map_path: decode_fixed(&raw.map_path),
            profile: decode_fixed(&raw.profile),
        }
    }

    pub fn encode(&self) -> LayoutResult<Vec<u8>> {
        let raw = self.to_native()?;
        Ok(bytemuck::bytes_of(&raw).to_vec())
    }

    /// 解码镜像；输出槽的地址值不属于记录内容，被忽略
    pub fn decode(bytes: &[u8]) -> LayoutResult<Self> {
        let raw: ApiInitOptions = read_record("ApiInitOptions", bytes)?;
        Ok(Self::from_native(&raw))
    }
}
