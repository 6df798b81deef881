//! 诊断探测配置

use serde::{Deserialize, Serialize};
use super::{ConfigResult, ConfigError};

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// 逐行文本
    Text,
    /// JSON
    Json,
}

/// 诊断探测配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// 是否执行会话探测（初始化、就绪检查、缩放命令、结束会话）
    pub include_session: bool,

    /// 缩放命令的距离（米），命令为 `showmap %lat %lon <距离>`
    pub zoom_meters: i32,

    /// 发送命令时是否蜂鸣
    pub beep: bool,

    /// 比例换算探测的距离（米）
    pub scale_probe_meters: i32,

    /// 探测结束后是否关闭 AutoMapa
    pub close_application: bool,

    /// 关闭时若无响应是否强制结束
    pub kill_if_unresponsive: bool,

    /// 报告格式
    pub report_format: ReportFormat,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            include_session: false,
            zoom_meters: 1000,
            beep: false,
            scale_probe_meters: 2000,
            close_application: false,
            kill_if_unresponsive: true,
            report_format: ReportFormat::Text,
        }
    }
}

impl ProbeConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.zoom_meters <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid zoom distance: {} m",
                self.zoom_meters
            )));
        }
        Ok(())
    }
}
