//! 日志初始化
//!
//! 配置tracing日志框架。`RUST_LOG` 环境变量优先，否则使用配置中的级别。

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ConfigResult, LoggingConfig};

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
}

/// 安装全局日志订阅者
///
/// 重复调用不会报错，已安装的订阅者保持不变。
/// 文件输出优先于控制台输出；两者都关闭时不安装订阅者。
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    if config.log_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file_path)
            .map_err(ConfigError::FileError)?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(config))
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    } else if config.log_to_console {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(config))
            .with_writer(std::io::stderr)
            .try_init();
    }

    tracing::debug!(target: "harness", level = config.level.as_directive(), "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_init_logging_twice() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_init_logging_bad_file() {
        let config = LoggingConfig {
            log_to_file: true,
            log_file_path: "/nonexistent/dir/amapi_bridge.log".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(ConfigError::FileError(_))));
    }
}
