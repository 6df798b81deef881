//! 原生绑定管理
//!
//! 管理外部模块的加载/卸载生命周期，并为每个文档化入口点提供带类型的调用包装。
//!
//! 状态机只有两个状态：
//! - **Unbound**（初始）：不持有句柄，所有调用包装直接返回 `NotBound`，不会尝试原生调用；
//! - **Bound**：持有句柄，调用包装转发到原生模块。
//!
//! `load` 总是先释放现有句柄再尝试新路径，失败时停留在 Unbound，绝不保留旧句柄。
//! 状态转换由写锁串行化；调用包装只在读锁内克隆一份模块引用，因此正在进行的调用
//! 会让模块保持映射，直到调用返回。

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::abi::{
    text::encode_c_string, InitOptions, VersionRecord, WideBuffer, LANGUAGE_CAPACITY,
    PATH_CAPACITY,
};
use crate::error::{BindingError, BindingResult};

pub mod dylib;
pub mod native;


pub use dylib::{DylibLoader, DylibModule};
pub use native::{EntryPointInfo, ModuleLoader, NativeApi, ENTRY_POINTS};

/// 默认模块文件名
pub const DEFAULT_MODULE_PATH: &str = "tpcAmApi.dll";

/// `AmApiInit` 成功后的输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStart {
    /// 原生侧是否为本次会话新建了 AutoMapa 进程
    pub process_created: bool,
}

/// 绑定状态
///
/// 由 [`BindingManager`] 独占持有，只在 `load`/`unload` 中修改。
pub struct BindingState {
    module_path: PathBuf,
    module: Option<Arc<dyn NativeApi>>,
    last_error: Option<String>,
}

impl BindingState {
    fn new(module_path: PathBuf) -> Self {
        Self {
            module_path,
            module: None,
            last_error: None,
        }
    }

    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    pub fn is_bound(&self) -> bool {
        self.module.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// 原生绑定管理器
pub struct BindingManager {
    loader: Box<dyn ModuleLoader>,
    state: RwLock<BindingState>,
}

impl BindingManager {
    /// 使用动态库加载器和默认模块路径创建（未绑定）
    pub fn new() -> Self {
        Self::with_loader(DylibLoader)
    }

    pub fn with_loader(loader: impl ModuleLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: RwLock::new(BindingState::new(PathBuf::from(DEFAULT_MODULE_PATH))),
        }
    }

    // 锁内的状态在任何时刻都是一致的，中毒后直接取回
    fn read_state(&self) -> RwLockReadGuard<'_, BindingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BindingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 加载模块
    ///
    /// 已绑定时先释放现有句柄；新模块加载失败则停留在 Unbound 并记录失败原因。
    pub fn load(&self, path: impl AsRef<Path>) -> BindingResult<()> {
        let path = path.as_ref();
        let mut state = self.write_state();

        if let Some(previous) = state.module.take() {
            tracing::info!(target: "binding", path = %state.module_path.display(), "Unloading native module before reload");
            drop(previous);
        }
        state.module_path = path.to_path_buf();

        match self.loader.open(path) {
            Ok(module) => {
                state.module = Some(module);
                state.last_error = None;
                tracing::info!(target: "binding", path = %path.display(), "Native module loaded");
                Ok(())
            }
            Err(reason) => {
                tracing::warn!(target: "binding", path = %path.display(), %reason, "Failed to load native module");
                state.last_error = Some(reason.clone());
                Err(BindingError::Load {
                    path: path.to_path_buf(),
                    reason,
                })
            }
        }
    }

    /// 重新加载当前配置的模块路径
    pub fn reload(&self) -> BindingResult<()> {
        let path = self.module_path();
        self.load(path)
    }

    /// 卸载模块；未绑定时为空操作
    pub fn unload(&self) {
        let mut state = self.write_state();
        if state.module.take().is_some() {
            tracing::info!(target: "binding", path = %state.module_path.display(), "Native module unloaded");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.read_state().is_bound()
    }

    pub fn module_path(&self) -> PathBuf {
        self.read_state().module_path().to_path_buf()
    }

    /// 最近一次加载失败的原因；成功加载后清空
    pub fn last_error(&self) -> Option<String> {
        self.read_state().last_error().map(str::to_owned)
    }

    fn module(&self, operation: &'static str) -> BindingResult<Arc<dyn NativeApi>> {
        self.read_state().module.clone().ok_or_else(|| {
            tracing::debug!(target: "binding", operation, "Call rejected: module not loaded");
            BindingError::NotBound { operation }
        })
    }

    /// 绑定层自身的版本，绑定后总是成功
    pub fn api_version(&self) -> BindingResult<VersionRecord> {
        let module = self.module("GetAmApiVersion")?;
        let mut image = VersionRecord::default().encode();
        module.api_version(&mut image)?;
        Ok(VersionRecord::decode(&image)?)
    }

    /// 已安装的 AutoMapa 版本
    pub fn installed_version(&self) -> BindingResult<VersionRecord> {
        let module = self.module("GetAmVersion")?;
        let mut image = VersionRecord::default().encode();
        if !module.installed_version(&mut image)? {
            return Err(BindingError::QueryFailed {
                operation: "GetAmVersion",
            });
        }
        Ok(VersionRecord::decode(&image)?)
    }

    /// AutoMapa 安装路径
    pub fn install_path(&self) -> BindingResult<String> {
        let module = self.module("GetAmPath")?;
        let mut buffer = WideBuffer::zeroed(PATH_CAPACITY);
        if !module.install_path(buffer.as_mut_slice())? {
            return Err(BindingError::QueryFailed {
                operation: "GetAmPath",
            });
        }
        Ok(buffer.decode())
    }

    /// 设置后续调用的接收超时（由原生侧执行）
    pub fn set_receive_timeout(&self, timeout_ms: u32) -> BindingResult<()> {
        let module = self.module("SetAmApiRecieveTimeout")?;
        let timeout = i32::try_from(timeout_ms)
            .ok()
            .filter(|&t| t > 0)
            .ok_or_else(|| {
                BindingError::InvalidArgument(format!(
                    "receive timeout must be between 1 and {} ms, got {}",
                    i32::MAX,
                    timeout_ms
                ))
            })?;
        module.set_receive_timeout(timeout);
        tracing::debug!(target: "binding", timeout_ms, "Receive timeout configured");
        Ok(())
    }

    /// 启动会话
    pub fn init_session(&self, options: &InitOptions) -> BindingResult<SessionStart> {
        let module = self.module("AmApiInit")?;
        let image = options.encode()?;
        let mut process_created = false;
        if !module.init(&image, &mut process_created)? {
            tracing::warn!(target: "binding", "AmApiInit returned FALSE");
            return Err(BindingError::InitFailed);
        }
        tracing::info!(target: "binding", process_created, "Session initialized");
        Ok(SessionStart { process_created })
    }

    /// 结束会话；只要已绑定就一定会发起调用
    pub fn end_session(&self) -> BindingResult<()> {
        let module = self.module("AmApiDone")?;
        module.done();
        tracing::info!(target: "binding", "Session ended");
        Ok(())
    }

    pub fn is_ready(&self) -> BindingResult<bool> {
        let module = self.module("IsAmAndApiReady")?;
        Ok(module.is_ready())
    }

    /// 当前界面语言
    pub fn current_language(&self) -> BindingResult<String> {
        let module = self.module("GetAmCurrentLanguage")?;
        let mut buffer = WideBuffer::zeroed(LANGUAGE_CAPACITY);
        if !module.current_language(buffer.as_mut_slice())? {
            return Err(BindingError::QueryFailed {
                operation: "GetAmCurrentLanguage",
            });
        }
        Ok(buffer.decode())
    }

    /// 发送命令
    ///
    /// 命令文本原样传递，`%lat`/`%lon` 之类的占位符由原生侧解释，这里不做替换。
    pub fn post_command(&self, command: &str, beep: bool) -> BindingResult<bool> {
        let module = self.module("PostCommandToAm")?;
        let command_c = encode_c_string("command", command)?;
        let ok = module.post_command(&command_c, beep);
        tracing::debug!(target: "binding", command, beep, ok, "PostCommandToAm");
        Ok(ok)
    }

    pub fn close_application(&self, kill_if_not_responding: bool) -> BindingResult<bool> {
        let module = self.module("CloseAm")?;
        Ok(module.close(kill_if_not_responding))
    }

    /// 米数换算为地图比例；不做校验或截断
    pub fn meters_to_scale(&self, meters: i32) -> BindingResult<f64> {
        let module = self.module("AmMetersToScale")?;
        Ok(module.meters_to_scale(meters))
    }
}

impl Default for BindingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BindingManager {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.module.take().is_some() {
            tracing::debug!(target: "binding", path = %state.module_path.display(), "Releasing native module on shutdown");
        }
    }
}
