// apps/sl_bench/src/profiling/mod.rs

//! 基于 span 的剖析器
//!
//! [`SpanProfilerLayer`] 作为 `tracing_subscriber` 层安装，在 span 进出时
//! 记录墙钟时间与线程分配字节数，扣除子 span 后按 span 栈折叠：
//!
//! ```text
//! benchmark_cycle;solve;step;newton;jacobian 152340
//! ```
//!
//! 折叠栈交给 [`flame`] 渲染火焰图，或交给 [`device_trace`] 写设备剖析记录。
//! 只有 [`SpanProfiler::start`] 与 [`SpanProfiler::stop`] 之间的 span 被记录。

pub mod alloc;
pub mod device_trace;
pub mod flame;

use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::span::Id;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

pub use alloc::{thread_allocated_bytes, CountingAllocator};

/// 折叠栈：`a;b;c` → 计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldedStacks {
    entries: BTreeMap<String, u64>,
}

impl FoldedStacks {
    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 栈数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 计数总和
    pub fn total(&self) -> u64 {
        self.entries.values().sum()
    }

    /// 某个栈的计数
    pub fn get(&self, stack: &str) -> Option<u64> {
        self.entries.get(stack).copied()
    }

    /// 迭代 `(栈, 计数)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// 折叠格式行
    pub fn lines(&self) -> Vec<String> {
        self.iter().map(|(stack, count)| format!("{} {}", stack, count)).collect()
    }

    fn add(&mut self, stack: String, count: u64) {
        if count > 0 {
            *self.entries.entry(stack).or_insert(0) += count;
        }
    }
}

/// 一次剖析的结果
#[derive(Debug, Clone, Default)]
pub struct Profile {
    /// 自身耗时 [ns]
    pub time: FoldedStacks,
    /// 自身分配量 [bytes]
    pub alloc: FoldedStacks,
}

#[derive(Debug, Default)]
struct Shared {
    active: AtomicBool,
    profile: Mutex<Profile>,
}

/// 剖析器句柄
#[derive(Debug, Clone, Default)]
pub struct SpanProfiler {
    shared: Arc<Shared>,
}

impl SpanProfiler {
    /// 创建剖析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建绑定到本句柄的订阅层
    pub fn layer(&self) -> SpanProfilerLayer {
        SpanProfilerLayer {
            shared: Arc::clone(&self.shared),
        }
    }

    /// 清空并开始记录
    pub fn start(&self) {
        *self.shared.profile.lock() = Profile::default();
        self.shared.active.store(true, Ordering::SeqCst);
    }

    /// 停止记录并取出结果
    pub fn stop(&self) -> Profile {
        self.shared.active.store(false, Ordering::SeqCst);
        std::mem::take(&mut *self.shared.profile.lock())
    }

    /// 是否正在记录
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }
}

struct Frame {
    id: Id,
    name: &'static str,
    start: Instant,
    alloc_start: u64,
    child_nanos: u64,
    child_bytes: u64,
}

thread_local! {
    static STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// 记录 span 栈耗时与分配量的订阅层
#[derive(Debug)]
pub struct SpanProfilerLayer {
    shared: Arc<Shared>,
}

impl<S> Layer<S> for SpanProfilerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if !self.shared.active.load(Ordering::Relaxed) {
            return;
        }
        let name = ctx.span(id).map(|span| span.metadata().name()).unwrap_or("unknown");
        STACK.with(|stack| {
            stack.borrow_mut().push(Frame {
                id: id.clone(),
                name,
                start: Instant::now(),
                alloc_start: thread_allocated_bytes(),
                child_nanos: 0,
                child_bytes: 0,
            })
        });
    }

    fn on_exit(&self, id: &Id, _ctx: Context<'_, S>) {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            // 记录开始之前进入的 span 不在栈上
            if stack.last().map(|frame| &frame.id) != Some(id) {
                return;
            }
            let Some(frame) = stack.pop() else {
                return;
            };
            let elapsed = frame.start.elapsed().as_nanos() as u64;
            let mut bytes = thread_allocated_bytes().saturating_sub(frame.alloc_start);

            if self.shared.active.load(Ordering::Relaxed) {
                let overhead_start = thread_allocated_bytes();
                let mut key = String::new();
                for parent in stack.iter() {
                    key.push_str(parent.name);
                    key.push(';');
                }
                key.push_str(frame.name);

                let mut profile = self.shared.profile.lock();
                profile.time.add(key.clone(), elapsed.saturating_sub(frame.child_nanos));
                profile.alloc.add(key, bytes.saturating_sub(frame.child_bytes));
                drop(profile);

                // 剖析器自身的分配不计入父 span
                bytes += thread_allocated_bytes().saturating_sub(overhead_start);
            }

            if let Some(parent) = stack.last_mut() {
                parent.child_nanos += elapsed;
                parent.child_bytes += bytes;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn profiled<F: FnOnce()>(profiler: &SpanProfiler, f: F) -> Profile {
        let subscriber = Registry::default().with(profiler.layer());
        tracing::subscriber::with_default(subscriber, || {
            profiler.start();
            f();
            profiler.stop()
        })
    }

    #[test]
    fn test_nested_spans_are_folded() {
        let profiler = SpanProfiler::new();
        let profile = profiled(&profiler, || {
            let _outer = tracing::debug_span!("outer").entered();
            for _ in 0..3 {
                let _inner = tracing::debug_span!("inner").entered();
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        });
        assert!(profile.time.get("outer;inner").unwrap() >= 3_000_000);
        assert!(profile.time.iter().all(|(stack, _)| stack.starts_with("outer")));
    }

    #[test]
    fn test_inactive_profiler_records_nothing() {
        let profiler = SpanProfiler::new();
        let subscriber = Registry::default().with(profiler.layer());
        tracing::subscriber::with_default(subscriber, || {
            let _span = tracing::debug_span!("idle").entered();
        });
        let profile = profiler.stop();
        assert!(profile.time.is_empty());
        assert!(profile.alloc.is_empty());
        assert!(!profiler.is_active());
    }

    #[test]
    fn test_span_entered_before_start_is_ignored() {
        let profiler = SpanProfiler::new();
        let subscriber = Registry::default().with(profiler.layer());
        let profile = tracing::subscriber::with_default(subscriber, || {
            let outer = tracing::debug_span!("outer").entered();
            profiler.start();
            {
                let _inner = tracing::debug_span!("inner").entered();
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            drop(outer);
            profiler.stop()
        });
        assert_eq!(profile.time.len(), 1);
        assert!(profile.time.get("inner").is_some());
    }

    #[test]
    fn test_folded_lines() {
        let mut stacks = FoldedStacks::default();
        stacks.add("a;b".to_string(), 5);
        stacks.add("a".to_string(), 2);
        stacks.add("a;c".to_string(), 0);
        assert_eq!(stacks.lines(), vec!["a 2".to_string(), "a;b 5".to_string()]);
        assert_eq!(stacks.total(), 7);
    }
}
