//! 诊断命令接口
//!
//! 表示层通过这里的入口点调用核心，不直接接触绑定状态。
//! [`Harness::run_sweep`] 按固定顺序执行全部探测并生成 [`DiagnosticReport`]。

use std::path::Path;

use crate::abi::{InitOptions, VersionRecord};
use crate::binding::{BindingManager, ModuleLoader};
use crate::config::HarnessConfig;
use crate::error::{BindingError, BindingResult};

pub mod report;


pub use report::{DiagnosticReport, ReportEntry, RuntimeInfo};

/// 模块选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub ok: bool,
    pub message: Option<String>,
}

/// 缩放命令；`%lat`/`%lon` 由 AutoMapa 替换为当前位置
pub fn zoom_command(meters: i32) -> String {
    format!("showmap %lat %lon {}", meters)
}

/// 诊断入口
pub struct Harness {
    manager: BindingManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_manager(BindingManager::new())
    }

    pub fn with_loader(loader: impl ModuleLoader + 'static) -> Self {
        Self::with_manager(BindingManager::with_loader(loader))
    }

    pub fn with_manager(manager: BindingManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &BindingManager {
        &self.manager
    }

    /// 选择并加载模块
    pub fn select_module(&self, path: impl AsRef<Path>) -> LoadResult {
        let path = path.as_ref();
        match self.manager.load(path) {
            Ok(()) => LoadResult {
                ok: true,
                message: Some(format!("Module path set to: {}", path.display())),
            },
            Err(err) => LoadResult {
                ok: false,
                message: Some(err.to_string()),
            },
        }
    }

    pub fn is_bound(&self) -> bool {
        self.manager.is_bound()
    }

    pub fn runtime_info(&self) -> RuntimeInfo {
        RuntimeInfo::current()
    }

    pub fn query_api_version(&self) -> BindingResult<VersionRecord> {
        self.manager.api_version()
    }

    pub fn query_installed_version(&self) -> BindingResult<VersionRecord> {
        self.manager.installed_version()
    }

    pub fn query_install_path(&self) -> BindingResult<String> {
        self.manager.install_path()
    }

    pub fn query_language(&self) -> BindingResult<String> {
        self.manager.current_language()
    }

    pub fn set_receive_timeout(&self, timeout_ms: u32) -> BindingResult<()> {
        self.manager.set_receive_timeout(timeout_ms)
    }

    /// 初始化会话；原生侧返回 FALSE 时为 `Ok(false)`
    pub fn initialize(&self, options: &InitOptions) -> BindingResult<bool> {
        match self.manager.init_session(options) {
            Ok(_) => Ok(true),
            Err(BindingError::InitFailed) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn teardown(&self) -> BindingResult<()> {
        self.manager.end_session()
    }

    pub fn is_ready(&self) -> BindingResult<bool> {
        self.manager.is_ready()
    }

    pub fn send_command(&self, text: &str, beep: bool) -> BindingResult<bool> {
        self.manager.post_command(text, beep)
    }

    pub fn zoom_to(&self, meters: i32, beep: bool) -> BindingResult<bool> {
        self.send_command(&zoom_command(meters), beep)
    }

    pub fn close_external_app(&self, force: bool) -> BindingResult<bool> {
        self.manager.close_application(force)
    }

    pub fn scale_for_distance(&self, meters: i32) -> BindingResult<f64> {
        self.manager.meters_to_scale(meters)
    }

    /// 执行全部探测
    ///
    /// 只读探测总是执行；会话探测和关闭 AutoMapa 由 `config.probe` 控制。
    /// 单个探测失败不会中断后续探测。
    pub fn run_sweep(&self, config: &HarnessConfig) -> DiagnosticReport {
        let probe = &config.probe;
        let mut report = DiagnosticReport::new(
            self.manager.module_path().display().to_string(),
            self.is_bound(),
        );

        if !self.is_bound() {
            let reason = self
                .manager
                .last_error()
                .unwrap_or_else(|| "no module selected".to_string());
            report.fail("selectModule", format!("Module not loaded: {}", reason));
            return report;
        }

        if let Some(timeout_ms) = config.module.receive_timeout_ms {
            match self.set_receive_timeout(timeout_ms) {
                Ok(()) => report.pass("setReceiveTimeout", format!("Receive timeout: {} ms", timeout_ms)),
                Err(err) => report.fail("setReceiveTimeout", err.to_string()),
            }
        }

        match self.query_api_version() {
            Ok(v) => report.pass("getApiVersion", format!("API version: {} (platform={})", v, v.platform)),
            Err(err) => report.fail("getApiVersion", err.to_string()),
        }

        match self.query_installed_version() {
            Ok(v) => report.pass("getInstalledVersion", format!("AutoMapa version: {}", v)),
            Err(err) => report.fail(
                "getInstalledVersion",
                describe(err, "AutoMapa not installed or call failed."),
            ),
        }

        match self.query_install_path() {
            Ok(path) => report.pass("getInstallPath", format!("AutoMapa path: {}", path)),
            Err(err) => report.fail("getInstallPath", describe(err, "Failed to get path.")),
        }

        match self.query_language() {
            Ok(lang) => report.pass("getCurrentLanguage", format!("Language: {}", lang)),
            Err(err) => report.fail("getCurrentLanguage", describe(err, "Failed to get language.")),
        }

        match self.is_ready() {
            Ok(ready) => report.pass("isReady", format!("API ready: {}", ready)),
            Err(err) => report.fail("isReady", err.to_string()),
        }

        match self.scale_for_distance(probe.scale_probe_meters) {
            Ok(scale) => report.pass(
                "metersToScale",
                format!("Scale for {} m: {}", probe.scale_probe_meters, scale),
            ),
            Err(err) => report.fail("metersToScale", err.to_string()),
        }

        if probe.include_session {
            self.sweep_session(config, &mut report);
        }

        if probe.close_application {
            match self.close_external_app(probe.kill_if_unresponsive) {
                Ok(closed) => report.pass("closeApplication", format!("CloseAm: {}", closed)),
                Err(err) => report.fail("closeApplication", err.to_string()),
            }
        }

        tracing::info!(
            target: "harness",
            probes = report.entries.len(),
            failures = report.failures(),
            "Diagnostic sweep finished"
        );
        report
    }

    fn sweep_session(&self, config: &HarnessConfig, report: &mut DiagnosticReport) {
        let probe = &config.probe;

        match self.manager.init_session(&config.session) {
            Ok(start) => report.pass(
                "initSession",
                format!("API initialized (process created: {}).", start.process_created),
            ),
            Err(err) => {
                report.fail("initSession", describe(err, "API init failed."));
                return;
            }
        }

        match self.is_ready() {
            Ok(ready) => report.pass("isReady (session)", format!("API ready: {}", ready)),
            Err(err) => report.fail("isReady (session)", err.to_string()),
        }

        match self.zoom_to(probe.zoom_meters, probe.beep) {
            Ok(sent) => report.pass("postCommand", format!("PostCommand: {}", sent)),
            Err(err) => report.fail("postCommand", err.to_string()),
        }

        match self.teardown() {
            Ok(()) => report.pass("endSession", "API done."),
            Err(err) => report.fail("endSession", err.to_string()),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

// 原生侧报告失败时给出固定措辞，其他错误给出原因
fn describe(err: BindingError, fallback: &str) -> String {
    match err {
        BindingError::QueryFailed { .. } | BindingError::InitFailed => fallback.to_string(),
        other => other.to_string(),
    }
}
