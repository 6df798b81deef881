//! 统一错误处理模块
//!
//! ## 错误类型分层
//!
//! - **结构描述层** (`abi::LayoutError`): 编组缺陷，对当前操作致命
//! - **绑定层** (`BindingError`): 加载失败、未绑定、原生调用报告失败
//!
//! 所有错误都以值的形式返回给调用方，核心从不终止进程。

use std::path::PathBuf;

use thiserror::Error;

use crate::abi::LayoutError;

/// 原生绑定错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    /// 模块不存在、架构不符或缺少入口点；换一个模块路径即可恢复
    #[error("Failed to load native module {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// 未绑定时发起调用；先加载即可恢复
    #[error("Native module is not loaded, cannot call {operation}")]
    NotBound { operation: &'static str },

    /// 原生调用已执行，但报告失败或没有数据
    #[error("{operation} reported failure or no data")]
    QueryFailed { operation: &'static str },

    #[error("AmApiInit reported failure")]
    InitFailed,

    /// 参数在发起原生调用之前被拒绝
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Marshaling error: {0}")]
    Layout(#[from] LayoutError),
}

impl BindingError {
    /// 换一个模块或先加载模块能否恢复
    pub fn requires_module(&self) -> bool {
        matches!(self, BindingError::Load { .. } | BindingError::NotBound { .. })
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
