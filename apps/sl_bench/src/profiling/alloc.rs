// apps/sl_bench/src/profiling/alloc.rs

//! 计数全局分配器
//!
//! 包装系统分配器，按线程累计分配字节数。二进制通过 `#[global_allocator]`
//! 安装后，[`SpanProfiler`](super::SpanProfiler) 在 span 进出时读取计数，
//! 把分配量归属到当前 span 栈。未安装时计数恒为 0。

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static ALLOCATED: Cell<u64> = const { Cell::new(0) };
}

/// 统计分配字节数的全局分配器
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

impl CountingAllocator {
    /// 构造
    pub const fn new() -> Self {
        Self
    }
}

#[inline]
fn record(bytes: usize) {
    // 线程销毁阶段 TLS 不可用时直接忽略
    let _ = ALLOCATED.try_with(|c| c.set(c.get().wrapping_add(bytes as u64)));
}

// SAFETY: 全部操作转发给 `System`，只额外更新一个无析构的线程局部计数。
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc_zeroed(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size.saturating_sub(layout.size()));
        System.realloc(ptr, layout, new_size)
    }
}

/// 当前线程累计分配字节数
pub fn thread_allocated_bytes() -> u64 {
    ALLOCATED.try_with(|c| c.get()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let before = thread_allocated_bytes();
        let v: Vec<u8> = Vec::with_capacity(64);
        drop(v);
        assert!(thread_allocated_bytes() >= before);
    }

    #[test]
    fn test_direct_allocation_is_counted() {
        let allocator = CountingAllocator::new();
        let layout = Layout::from_size_align(128, 8).unwrap();
        let before = thread_allocated_bytes();
        unsafe {
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            allocator.dealloc(ptr, layout);
        }
        assert_eq!(thread_allocated_bytes() - before, 128);
    }
}
