//! 统一配置系统
//!
//! 提供TOML/JSON配置文件、环境变量覆盖和校验

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::abi::InitOptions;
use crate::binding::DEFAULT_MODULE_PATH;

pub mod probe;

pub use probe::{ProbeConfig, ReportFormat};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// 原生模块
    #[serde(default)]
    pub module: ModuleConfig,

    /// 会话初始化选项
    #[serde(default)]
    pub session: InitOptions,

    /// 诊断探测
    #[serde(default)]
    pub probe: ProbeConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Default => write!(f, "built-in defaults"),
        }
    }
}

impl HarnessConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 用任意键值来源覆盖配置，无法解析的值被忽略
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // 模块
        if let Some(val) = lookup("AMAPI_MODULE_PATH") {
            self.module.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("AMAPI_RECEIVE_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.module.receive_timeout_ms = Some(timeout);
            }
        }

        // 会话
        if let Some(val) = lookup("AMAPI_LANGUAGE") {
            self.session.language = val;
        }
        if let Some(val) = lookup("AMAPI_MAP_PATH") {
            self.session.map_path = val;
        }
        if let Some(val) = lookup("AMAPI_PROFILE") {
            self.session.profile = val;
        }

        // 日志
        if let Some(val) = lookup("AMAPI_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.module.validate()?;
        self.session
            .to_native()
            .map_err(|e| ConfigError::ValidationError(format!("session: {}", e)))?;
        self.probe.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./amapi.toml
    /// 2. ./amapi.json
    /// 3. <用户配置目录>/amapi_bridge/config.toml
    /// 4. 使用默认配置
    ///
    /// 只有文件不存在时才继续查找；存在但无法读取或解析的文件直接报错。
    pub fn load_or_default() -> ConfigResult<(Self, ConfigSource)> {
        let mut candidates = vec![PathBuf::from("amapi.toml"), PathBuf::from("amapi.json")];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("amapi_bridge").join("config.toml"));
        }
        Self::load_first(candidates)
    }

    /// 按顺序加载第一个存在的候选文件，`.json` 按 JSON 解析，其余按 TOML
    pub fn load_first<I>(candidates: I) -> ConfigResult<(Self, ConfigSource)>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in candidates {
            let loaded = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Self::from_json_file(&path),
                _ => Self::from_toml_file(&path),
            };
            match loaded {
                Ok(config) => return Ok((config, ConfigSource::File(path))),
                Err(ConfigError::FileError(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(ConfigError::ParseError(msg)) => {
                    tracing::warn!(target: "config", path = %path.display(), "Malformed configuration file");
                    return Err(ConfigError::ParseError(format!("{}: {}", path.display(), msg)));
                }
                Err(e) => {
                    tracing::warn!(target: "config", path = %path.display(), error = %e, "Failed to read configuration file");
                    return Err(e);
                }
            }
        }

        Ok((Self::default(), ConfigSource::Default))
    }
}

/// 原生模块配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// 模块路径
    pub path: PathBuf,

    /// 加载后设置的接收超时（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_timeout_ms: Option<u32>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODULE_PATH),
            receive_timeout_ms: None,
        }
    }
}

impl ModuleConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("Module path is empty".to_string()));
        }
        if let Some(timeout) = self.receive_timeout_ms {
            if timeout == 0 || timeout > i32::MAX as u32 {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid receive timeout: {} ms",
                    timeout
                )));
            }
        }
        Ok(())
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到文件
    pub log_to_file: bool,

    /// 日志文件路径
    pub log_file_path: String,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_to_file: false,
            log_file_path: "amapi_bridge.log".to_string(),
            log_to_console: true,
        }
    }
}

impl LoggingConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.log_to_file && self.log_file_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "log_to_file is set but log_file_path is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// `EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("Unknown log level: {}", other))),
        }
    }
}
