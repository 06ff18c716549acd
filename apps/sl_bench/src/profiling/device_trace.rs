// apps/sl_bench/src/profiling/device_trace.rs

//! 设备剖析记录
//!
//! GPU 设备上不生成火焰图，改为写出按 span 栈汇总的耗时表 `profiling.txt`。

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

use super::FoldedStacks;
use crate::error::{BenchError, BenchResult};

/// 设备剖析记录文件名
pub const DEVICE_TRACE_FILE: &str = "profiling.txt";

/// 格式化耗时表，按自身耗时降序
pub fn format_trace(stacks: &FoldedStacks) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# SnowyLand 设备剖析记录");
    let _ = writeln!(out, "# 生成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    if stacks.is_empty() {
        let _ = writeln!(out, "no samples");
        return out;
    }

    let total = stacks.total().max(1) as f64;
    let mut rows: Vec<(&str, u64)> = stacks.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let _ = writeln!(out, "{:>12}  {:>6}  stack", "self [ms]", "%");
    for (stack, nanos) in rows {
        let _ = writeln!(
            out,
            "{:>12.3}  {:>6.2}  {}",
            nanos as f64 * 1e-6,
            100.0 * nanos as f64 / total,
            stack
        );
    }
    out
}

/// 写出设备剖析记录
pub fn write_device_trace(stacks: &FoldedStacks, path: &Path) -> BenchResult<()> {
    fs::write(path, format_trace(stacks))
        .map_err(|e| BenchError::profiling(format!("{}: {}", path.display(), e)))?;
    info!("设备剖析记录已写入: {}", path.display());
    Ok(())
}
