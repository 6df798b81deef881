//! 诊断报告

use std::fmt;

use serde::Serialize;

/// 运行时信息
///
/// 原生模块必须与进程架构一致，加载失败时首先比对这里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    pub pointer_width: u32,
    pub os: &'static str,
    pub arch: &'static str,
}

impl RuntimeInfo {
    pub fn current() -> Self {
        Self {
            pointer_width: usize::BITS,
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }
}

impl fmt::Display for RuntimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Running under {}-bit process ({}/{})",
            self.pointer_width, self.os, self.arch
        )
    }
}

/// 一次探测的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub operation: &'static str,
    pub ok: bool,
    pub detail: String,
}

/// 诊断报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub runtime: RuntimeInfo,
    pub module_path: String,
    pub bound: bool,
    pub entries: Vec<ReportEntry>,
}

impl DiagnosticReport {
    pub fn new(module_path: String, bound: bool) -> Self {
        Self {
            runtime: RuntimeInfo::current(),
            module_path,
            bound,
            entries: Vec::new(),
        }
    }

    pub fn pass(&mut self, operation: &'static str, detail: impl Into<String>) {
        self.entries.push(ReportEntry {
            operation,
            ok: true,
            detail: detail.into(),
        });
    }

    pub fn fail(&mut self, operation: &'static str, detail: impl Into<String>) {
        self.entries.push(ReportEntry {
            operation,
            ok: false,
            detail: detail.into(),
        });
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.ok).count()
    }

    pub fn entry(&self, operation: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.operation == operation)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.runtime)?;
        writeln!(
            f,
            "Module: {} ({})",
            self.module_path,
            if self.bound { "loaded" } else { "not loaded" }
        )?;
        for entry in &self.entries {
            writeln!(f, "{}", entry.detail)?;
        }
        Ok(())
    }
}
