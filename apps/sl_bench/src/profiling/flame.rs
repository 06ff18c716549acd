// apps/sl_bench/src/profiling/flame.rs

//! 火焰图渲染
//!
//! 用 `inferno` 把折叠栈渲染为 SVG，并嵌入单文件 HTML。

use inferno::flamegraph::{self, Options};
use std::fs;
use std::path::Path;
use tracing::info;

use super::FoldedStacks;
use crate::error::{BenchError, BenchResult};

/// 计算耗时火焰图文件名模板
pub const COMPUTE_FLAME_PREFIX: &str = "flame";
/// 分配火焰图文件名模板
pub const ALLOC_FLAME_PREFIX: &str = "alloc_flame";

/// 火焰图文件名，如 `flame_cpu.html`
pub fn artifact_name(prefix: &str, device: &str) -> String {
    format!("{}_{}.html", prefix, device)
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        title, body
    )
}

/// 把折叠栈渲染为 HTML 火焰图
///
/// 没有任何栈时写入说明页面而不是报错。
pub fn write_flamegraph(stacks: &FoldedStacks, title: &str, count_name: &str, path: &Path) -> BenchResult<()> {
    let page = if stacks.is_empty() {
        html_page(title, "<p>no samples</p>")
    } else {
        let lines = stacks.lines();
        let mut options = Options::default();
        options.title = title.to_string();
        options.count_name = count_name.to_string();

        let mut svg = Vec::new();
        flamegraph::from_lines(&mut options, lines.iter().map(String::as_str), &mut svg)
            .map_err(|e| BenchError::profiling(format!("{}: {}", path.display(), e)))?;
        let svg = String::from_utf8(svg).map_err(|e| BenchError::profiling(e.to_string()))?;
        // 去掉 XML 声明与 DOCTYPE，内联到 HTML
        let start = svg.find("<svg").unwrap_or(0);
        html_page(title, &svg[start..])
    };

    fs::write(path, page)?;
    info!("火焰图已写入: {} ({} 个栈)", path.display(), stacks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name(COMPUTE_FLAME_PREFIX, "cpu"), "flame_cpu.html");
        assert_eq!(artifact_name(ALLOC_FLAME_PREFIX, "cpu"), "alloc_flame_cpu.html");
    }

    #[test]
    fn test_empty_stacks_write_placeholder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flame_cpu.html");
        write_flamegraph(&FoldedStacks::default(), "compute", "ns", &path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("no samples"));
    }

    #[test]
    fn test_render_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flame_cpu.html");
        let mut stacks = FoldedStacks::default();
        stacks.add("solve;step".to_string(), 100);
        stacks.add("solve".to_string(), 10);
        write_flamegraph(&stacks, "compute", "ns", &path).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("step"));
    }
}
