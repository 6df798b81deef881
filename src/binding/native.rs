//! 原生模块接口
//!
//! [`NativeApi`] 是已解析入口点的调用面，所有结构参数都以字节镜像传递；
//! [`ModuleLoader`] 把模块路径打开为 [`NativeApi`]。绑定管理器只依赖这两个 trait，
//! 真实的动态库实现见 [`super::dylib`]。

use std::ffi::CStr;
use std::path::Path;
use std::sync::Arc;

use crate::abi::{LayoutResult, WideChar};

/// 一个入口点的描述：操作名、导出符号、C 签名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPointInfo {
    pub operation: &'static str,
    pub symbol: &'static str,
    pub signature: &'static str,
}

/// 模块必须导出的全部入口点（cdecl）
pub const ENTRY_POINTS: [EntryPointInfo; 11] = [
    EntryPointInfo { operation: "getApiVersion", symbol: "GetAmApiVersion", signature: "void (CVersionInfo*)" },
    EntryPointInfo { operation: "getInstalledVersion", symbol: "GetAmVersion", signature: "BOOL (CVersionInfo*)" },
    EntryPointInfo { operation: "getInstallPath", symbol: "GetAmPath", signature: "BOOL (wchar_t[512])" },
    EntryPointInfo { operation: "setReceiveTimeout", symbol: "SetAmApiRecieveTimeout", signature: "void (int)" },
    EntryPointInfo { operation: "initSession", symbol: "AmApiInit", signature: "BOOL (ApiInitOptions*)" },
    EntryPointInfo { operation: "endSession", symbol: "AmApiDone", signature: "void ()" },
    EntryPointInfo { operation: "isReady", symbol: "IsAmAndApiReady", signature: "BOOL ()" },
    EntryPointInfo { operation: "getCurrentLanguage", symbol: "GetAmCurrentLanguage", signature: "BOOL (wchar_t[16])" },
    EntryPointInfo { operation: "postCommand", symbol: "PostCommandToAm", signature: "BOOL (const char*, BOOL)" },
    EntryPointInfo { operation: "closeApplication", symbol: "CloseAm", signature: "BOOL (BOOL)" },
    EntryPointInfo { operation: "metersToScale", symbol: "AmMetersToScale", signature: "double (int)" },
];

/// 已绑定模块的调用面
///
/// 实现方负责在调用前后校验镜像尺寸，尺寸不符返回 `LayoutError`，不得发起原生调用。
pub trait NativeApi: Send + Sync {
    /// `GetAmApiVersion`：写入 `CVersionInfo` 镜像
    fn api_version(&self, record: &mut [u8]) -> LayoutResult<()>;

    /// `GetAmVersion`
    fn installed_version(&self, record: &mut [u8]) -> LayoutResult<bool>;

    /// `GetAmPath`：缓冲区容量必须是 `PATH_CAPACITY`
    fn install_path(&self, buffer: &mut [WideChar]) -> LayoutResult<bool>;

    /// `SetAmApiRecieveTimeout`
    fn set_receive_timeout(&self, timeout_ms: i32);

    /// `AmApiInit`：`options` 是 `ApiInitOptions` 镜像，`process_created` 接收原生侧写入的标志
    fn init(&self, options: &[u8], process_created: &mut bool) -> LayoutResult<bool>;

    /// `AmApiDone`
    fn done(&self);

    /// `IsAmAndApiReady`
    fn is_ready(&self) -> bool;

    /// `GetAmCurrentLanguage`：缓冲区容量必须是 `LANGUAGE_CAPACITY`
    fn current_language(&self, buffer: &mut [WideChar]) -> LayoutResult<bool>;

    /// `PostCommandToAm`
    fn post_command(&self, command: &CStr, beep: bool) -> bool;

    /// `CloseAm`
    fn close(&self, kill_if_not_responding: bool) -> bool;

    /// `AmMetersToScale`
    fn meters_to_scale(&self, meters: i32) -> f64;
}

/// 模块加载器
pub trait ModuleLoader: Send + Sync {
    /// 打开模块并解析全部入口点；失败时返回人类可读的原因
    fn open(&self, path: &Path) -> Result<Arc<dyn NativeApi>, String>;
}
