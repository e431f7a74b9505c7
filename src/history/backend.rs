//! 原生历史后端抽象
//!
//! 把宿主环境的会话历史原语抽象为一组可注入的能力：
//! 写入/替换条目、按步跳转、读取当前 URL 与持久化 state、
//! 注册 pop 事件回调、整页刷新。
//!
//! 浏览器宿主用 `window.history` / `window.location` 实现本 trait；
//! 库自带 [`MemoryHistory`] 作为进程内实现，用于测试和非浏览器宿主。

use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, trace, warn};

/// pop 事件回调类型
///
/// 在原生历史栈游标因前进/后退移动之后被调用。
/// 注意：回调触发时跳转已经发生，无法撤销。
pub type PopHandler = Arc<dyn Fn() + Send + Sync>;

/// 原生历史能力集
///
/// 控制器是导航写入的唯一来源，但 pop 事件可能随时由外部触发，
/// 实现方必须保证 `go` 移动游标之后才调用已注册的 pop 回调。
pub trait NativeHistory: Send + Sync {
    /// 压入新历史条目并持久化 state
    fn push_state(&self, state: Value, url: &str);

    /// 替换当前历史条目并持久化 state
    fn replace_state(&self, state: Value, url: &str);

    /// 在历史栈中移动 `delta` 步（负数后退，正数前进）
    fn go(&self, delta: i64);

    /// 当前完整 URL（路径 + 查询 + 片段，含 basename）
    fn current_url(&self) -> String;

    /// 当前条目的持久化 state
    fn current_state(&self) -> Option<Value>;

    /// 历史栈深度
    fn length(&self) -> usize;

    /// 注册 pop 事件回调（后注册者覆盖先注册者）
    fn set_pop_handler(&self, handler: PopHandler);

    /// 整页刷新到指定 URL（forceRefresh 模式）
    fn reload(&self, url: &str);
}

// ============================================================================
// 内存后端
// ============================================================================

/// 内存历史条目
#[derive(Debug, Clone)]
struct MemoryEntry {
    url: String,
    state: Value,
}

/// 内存栈状态
struct MemoryStack {
    entries: Vec<MemoryEntry>,
    index: usize,
}

/// 进程内历史后端
///
/// 用一个向量模拟会话历史栈：压入新条目会丢弃当前游标之后的
/// 前进分支（与浏览器语义一致），`go` 会把游标钳制在栈边界内，
/// 游标移动后触发已注册的 pop 回调。
#[derive(Clone)]
pub struct MemoryHistory {
    stack: Arc<RwLock<MemoryStack>>,
    pop_handler: Arc<RwLock<Option<PopHandler>>>,
    reloads: Arc<AtomicU64>,
}

impl MemoryHistory {
    /// 以指定初始 URL 创建内存后端
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            stack: Arc::new(RwLock::new(MemoryStack {
                entries: vec![MemoryEntry {
                    url: initial_url.into(),
                    state: Value::Null,
                }],
                index: 0,
            })),
            pop_handler: Arc::new(RwLock::new(None)),
            reloads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 当前游标位置（用于测试观察）
    pub fn index(&self) -> usize {
        self.stack.read().unwrap().index
    }

    /// 整页刷新的累计次数（用于测试观察）
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    /// 触发 pop 回调
    fn fire_pop(&self) {
        // 先在锁外取出回调再调用，回调会重入本后端读取当前 URL
        let handler = {
            let slot = self.pop_handler.read().unwrap();
            slot.clone()
        };
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl NativeHistory for MemoryHistory {
    fn push_state(&self, state: Value, url: &str) {
        let mut stack = self.stack.write().unwrap();
        let index = stack.index;
        // 丢弃前进分支
        stack.entries.truncate(index + 1);
        stack.entries.push(MemoryEntry {
            url: url.to_string(),
            state,
        });
        stack.index += 1;

        trace!(url = %url, depth = stack.entries.len(), "内存后端压入条目");
    }

    fn replace_state(&self, state: Value, url: &str) {
        let mut stack = self.stack.write().unwrap();
        let index = stack.index;
        stack.entries[index] = MemoryEntry {
            url: url.to_string(),
            state,
        };

        trace!(url = %url, "内存后端替换条目");
    }

    fn go(&self, delta: i64) {
        if delta == 0 {
            // 浏览器中 go(0) 是整页刷新，内存后端视为无操作
            warn!("go(0) 在内存后端中是无操作");
            return;
        }

        let moved = {
            let mut stack = self.stack.write().unwrap();
            let target = stack.index as i64 + delta;
            let clamped = target.clamp(0, stack.entries.len() as i64 - 1) as usize;
            let moved = clamped != stack.index;
            stack.index = clamped;
            moved
        };

        trace!(delta, moved, "内存后端移动游标");

        // 游标真正移动后才触发 pop 回调
        if moved {
            self.fire_pop();
        }
    }

    fn current_url(&self) -> String {
        let stack = self.stack.read().unwrap();
        stack.entries[stack.index].url.clone()
    }

    fn current_state(&self) -> Option<Value> {
        let stack = self.stack.read().unwrap();
        let state = &stack.entries[stack.index].state;
        if state.is_null() {
            None
        } else {
            Some(state.clone())
        }
    }

    fn length(&self) -> usize {
        self.stack.read().unwrap().entries.len()
    }

    fn set_pop_handler(&self, handler: PopHandler) {
        let mut slot = self.pop_handler.write().unwrap();
        *slot = Some(handler);
    }

    fn reload(&self, url: &str) {
        debug!(url = %url, "内存后端记录整页刷新");
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_push_and_current() {
        let backend = MemoryHistory::new("/");
        backend.push_state(json!({"key": "abc"}), "/a");

        assert_eq!(backend.current_url(), "/a");
        assert_eq!(backend.current_state(), Some(json!({"key": "abc"})));
        assert_eq!(backend.length(), 2);
    }

    #[test]
    fn test_replace_keeps_depth() {
        let backend = MemoryHistory::new("/");
        backend.push_state(Value::Null, "/a");
        backend.replace_state(json!(1), "/b");

        assert_eq!(backend.current_url(), "/b");
        assert_eq!(backend.length(), 2);
    }

    #[test]
    fn test_push_truncates_forward_branch() {
        let backend = MemoryHistory::new("/");
        backend.push_state(Value::Null, "/a");
        backend.push_state(Value::Null, "/b");
        backend.go(-2);
        assert_eq!(backend.current_url(), "/");

        // 在栈中部压入新条目，丢弃 /a 和 /b
        backend.push_state(Value::Null, "/c");
        assert_eq!(backend.length(), 2);
        assert_eq!(backend.current_url(), "/c");
    }

    #[test]
    fn test_go_clamps_to_bounds() {
        let backend = MemoryHistory::new("/");
        backend.push_state(Value::Null, "/a");

        backend.go(-10);
        assert_eq!(backend.current_url(), "/");

        backend.go(10);
        assert_eq!(backend.current_url(), "/a");
    }

    #[test]
    fn test_go_fires_pop_handler_after_move() {
        let backend = MemoryHistory::new("/");
        backend.push_state(Value::Null, "/a");

        let seen = Arc::new(RwLock::new(Vec::new()));
        let fired = Arc::new(AtomicUsize::new(0));

        let backend_clone = backend.clone();
        let seen_clone = Arc::clone(&seen);
        let fired_clone = Arc::clone(&fired);
        backend.set_pop_handler(Arc::new(move || {
            // 回调触发时游标已经移动
            seen_clone.write().unwrap().push(backend_clone.current_url());
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        backend.go(-1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(seen.read().unwrap().as_slice(), ["/".to_string()]);

        // 游标没有实际移动时不触发回调
        backend.go(-1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_counted() {
        let backend = MemoryHistory::new("/");
        assert_eq!(backend.reload_count(), 0);
        backend.reload("/a");
        assert_eq!(backend.reload_count(), 1);
    }
}
