//! 历史控制器
//!
//! 导航引擎的中心状态机。持有当前动作与位置，把每个状态变更导航
//! 经由阻塞门裁决后提交到原生历史后端，并向监听器扇出变更通知。
//!
//! 单次导航的顺序保证（严格）：
//! 守卫求值 → 原生 state 写入 → 监听器通知 → 控制器存储位置更新。
//! 监听器在通知回调内读取 [`HistoryController::location`] 时
//! 看到的是变更前的位置。

use std::sync::{Arc, RwLock, Weak};

use serde_json::Value;
use tracing::{debug, info};

use crate::core::config::HistoryConfig;
use crate::history::backend::NativeHistory;
use crate::history::gate::{
    default_confirmation, BlockPrompt, NavigationGate, Unblock, UserConfirmation,
};
use crate::history::listener::{ListenerRegistry, Unlisten};
use crate::history::location::{normalize_hash, normalize_search, Action, Location, SessionState};
use crate::utils::generate_key;

// ============================================================================
// 导航输入
// ============================================================================

/// 结构化位置输入
///
/// push / replace / createHref 的对象形式入参。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInput {
    /// 路径部分（不含 basename）
    pub pathname: String,
    /// 查询字符串（可省略 `?` 前缀）
    pub search: String,
    /// 片段标识（可省略 `#` 前缀）
    pub hash: String,
    /// 附带的状态数据
    pub state: Option<Value>,
}

impl LocationInput {
    /// 仅由路径构造
    pub fn path(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Default::default()
        }
    }
}

impl From<&Location> for LocationInput {
    fn from(loc: &Location) -> Self {
        Self {
            pathname: loc.pathname.clone(),
            search: loc.search.clone(),
            hash: loc.hash.clone(),
            state: loc.state.clone(),
        }
    }
}

/// 导航路径入参
///
/// 字符串形式（可含 `?` 和 `#`）或结构化形式。
/// 带标签的枚举使"既不是字符串也不是对象"的非法入参无法被表达。
#[derive(Debug, Clone)]
pub enum PathArg {
    /// 路径字符串
    Path(String),
    /// 结构化位置
    Located(LocationInput),
}

impl From<&str> for PathArg {
    fn from(path: &str) -> Self {
        PathArg::Path(path.to_string())
    }
}

impl From<String> for PathArg {
    fn from(path: String) -> Self {
        PathArg::Path(path)
    }
}

impl From<LocationInput> for PathArg {
    fn from(input: LocationInput) -> Self {
        PathArg::Located(input)
    }
}

impl From<&Location> for PathArg {
    fn from(loc: &Location) -> Self {
        PathArg::Located(LocationInput::from(loc))
    }
}

// ============================================================================
// 控制器
// ============================================================================

/// 当前状态
struct CurrentState {
    action: Action,
    location: Location,
}

/// 控制器内部状态
///
/// 被控制器句柄和 pop 回调共享。
struct ControllerInner {
    backend: Arc<dyn NativeHistory>,
    listeners: ListenerRegistry,
    gate: NavigationGate,
    config: HistoryConfig,
    current: RwLock<CurrentState>,
}

/// 历史控制器
///
/// 每个应用根创建一个实例，与进程同生命周期。句柄可廉价克隆，
/// 所有克隆共享同一份内部状态。
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use compass_core::history::{HistoryController, MemoryHistory};
/// use compass_core::core::config::HistoryConfig;
/// use serde_json::json;
///
/// let backend = Arc::new(MemoryHistory::new("/"));
/// let history = HistoryController::new(backend, HistoryConfig::default());
///
/// history.push("/news/10?page=2", Some(json!({"from": "feed"})));
/// assert_eq!(history.location().pathname, "/news/10");
/// ```
#[derive(Clone)]
pub struct HistoryController {
    inner: Arc<ControllerInner>,
}

impl HistoryController {
    /// 创建控制器（使用默认确认回调：直接放行）
    ///
    /// 初始动作为 POP，初始位置从后端当前 URL 与持久化 state 恢复。
    pub fn new(backend: Arc<dyn NativeHistory>, config: HistoryConfig) -> Self {
        Self::with_confirmation(backend, config, default_confirmation())
    }

    /// 创建控制器并注入确认回调
    ///
    /// 浏览器宿主在此注入阻塞式确认对话框。
    pub fn with_confirmation(
        backend: Arc<dyn NativeHistory>,
        config: HistoryConfig,
        confirmation: UserConfirmation,
    ) -> Self {
        let location = Self::location_from_backend(backend.as_ref(), &config.basename);

        info!(
            basename = %config.basename,
            pathname = %location.pathname,
            force_refresh = config.force_refresh,
            "创建历史控制器"
        );

        let inner = Arc::new(ControllerInner {
            backend,
            listeners: ListenerRegistry::new(),
            gate: NavigationGate::new(confirmation),
            config,
            current: RwLock::new(CurrentState {
                action: Action::Pop,
                location,
            }),
        });

        // pop 回调只持有弱引用，避免控制器与后端的引用环
        let weak: Weak<ControllerInner> = Arc::downgrade(&inner);
        inner.backend.set_pop_handler(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::handle_pop_inner(&inner);
            }
        }));

        Self { inner }
    }

    /// 从后端当前 URL 与持久化 state 恢复位置
    fn location_from_backend(backend: &dyn NativeHistory, basename: &str) -> Location {
        let url = backend.current_url();
        let (state, key) = SessionState::recover(backend.current_state());

        let mut location = Location::from_path(&url, basename);
        location.state = state;
        location.key = key;
        location
    }

    // ------------------------------------------------------------------
    // 导航操作
    // ------------------------------------------------------------------

    /// 压入新地址
    ///
    /// # Arguments
    ///
    /// * `to` - 新地址：字符串（可含 `?`、`#`）或结构化位置
    /// * `state` - 附带的状态数据；入参为结构化位置时该参数被忽略，
    ///   只有结构化入参自带的 state 会被提交
    pub fn push(&self, to: impl Into<PathArg>, state: Option<Value>) {
        self.change_page(to.into(), state, Action::Push);
    }

    /// 替换当前地址
    pub fn replace(&self, to: impl Into<PathArg>, state: Option<Value>) {
        self.change_page(to.into(), state, Action::Replace);
    }

    /// push 和 replace 的公共实现
    ///
    /// 先归一化入参得到带 basename 前缀的原始路径字符串和 state，
    /// 再解析出候选位置，交给阻塞门裁决后提交。
    fn change_page(&self, to: PathArg, state: Option<Value>, action: Action) {
        let basename = &self.inner.config.basename;
        let (raw_path, state) = resolve_path_and_state(to, state, basename);

        // 候选位置不能从后端当前 URL 得到（阻塞期间页面未必会跳转），
        // 必须由要跳转到的路径字符串解析得出
        let candidate = Location::from_path(&raw_path, basename).with_state(state.clone());

        debug!(
            action = %action,
            pathname = %candidate.pathname,
            "提交候选导航至阻塞门"
        );

        let inner = Arc::clone(&self.inner);
        let committed = candidate.clone();
        self.inner.gate.evaluate(
            &candidate,
            action,
            Box::new(move || {
                Self::commit(&inner, committed, action, raw_path, state);
            }),
        );
    }

    /// 提交导航
    ///
    /// 顺序不可调换：写入后端 → 通知监听器 → 更新存储状态 →
    /// （仅 forceRefresh 时）整页刷新。强刷模式下内存状态的更新
    /// 已无实际意义，但仍须先执行，保证一致性和可测试性。
    fn commit(
        inner: &Arc<ControllerInner>,
        candidate: Location,
        action: Action,
        raw_path: String,
        state: Option<Value>,
    ) {
        let key = generate_key(inner.config.key_length);
        let session = SessionState::new(&key, state).to_value();

        // 写入原生历史时使用带 basename 前缀的原始路径字符串，
        // 使真实 URL 反映完整地址
        match action {
            Action::Push => inner.backend.push_state(session, &raw_path),
            Action::Replace => inner.backend.replace_state(session, &raw_path),
            Action::Pop => unreachable!("POP 不经由 commit 提交"),
        }

        inner.listeners.notify(&candidate, action);

        {
            let mut current = inner.current.write().unwrap();
            current.action = action;
            current.location = candidate;
        }

        info!(action = %action, key = %key, url = %raw_path, "导航已提交");

        if inner.config.force_refresh {
            inner.backend.reload(&raw_path);
        }
    }

    /// 处理 pop 事件
    ///
    /// 由后端在前进/后退/hash 变化之后调用。此时跳转已经发生，
    /// 守卫拒绝无法撤销真实 URL 的变化，只能抑制控制器内部的
    /// 监听器通知与位置更新——这会让可观察位置相对真实 URL 滞后，
    /// 是文档化的环境限制，不是缺陷。
    pub fn handle_pop(&self) {
        Self::handle_pop_inner(&self.inner);
    }

    fn handle_pop_inner(inner: &Arc<ControllerInner>) {
        let location = Self::location_from_backend(inner.backend.as_ref(), &inner.config.basename);

        debug!(pathname = %location.pathname, "收到 pop 事件");

        let inner_clone = Arc::clone(inner);
        let committed = location.clone();
        inner.gate.evaluate(
            &location,
            Action::Pop,
            Box::new(move || {
                // 先通知监听器再更新位置，监听器既能拿到新位置，
                // 也能读取到变更前的位置
                inner_clone.listeners.notify(&committed, Action::Pop);

                let mut current = inner_clone.current.write().unwrap();
                current.location = committed;
            }),
        );
    }

    /// 在历史栈中移动指定步数
    ///
    /// 直接委托给后端，不经过阻塞门，也不同步触发监听器；
    /// 通知会在后端的 pop 事件到来时异步完成。
    pub fn go(&self, delta: i64) {
        self.inner.backend.go(delta);
    }

    /// 后退一步
    pub fn go_back(&self) {
        self.go(-1);
    }

    /// 前进一步
    pub fn go_forward(&self) {
        self.go(1);
    }

    // ------------------------------------------------------------------
    // 订阅与阻塞
    // ------------------------------------------------------------------

    /// 注册位置变更监听器
    ///
    /// # Returns
    ///
    /// 返回注销句柄
    pub fn listen<F>(&self, listener: F) -> Unlisten
    where
        F: Fn(&Location, Action) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(Arc::new(listener))
    }

    /// 设置导航阻塞守卫
    ///
    /// # Returns
    ///
    /// 返回清除句柄
    pub fn block(&self, prompt: impl Into<BlockPrompt>) -> Unblock {
        self.inner.gate.block(prompt)
    }

    // ------------------------------------------------------------------
    // 只读访问
    // ------------------------------------------------------------------

    /// 构造超链接地址（纯函数，不导航）
    ///
    /// `basename + pathname + 规范化 search + 规范化 hash`，
    /// 供链接渲染方构造 anchor 目标。
    pub fn create_href(&self, location: impl Into<LocationInput>) -> String {
        let input = location.into();
        format!(
            "{}{}{}{}",
            self.inner.config.basename,
            input.pathname,
            normalize_search(&input.search),
            normalize_hash(&input.hash),
        )
    }

    /// 当前位置
    ///
    /// 始终反映最后一次已提交（或被外部观察到）的导航，
    /// 从不反映待裁决的候选位置。
    pub fn location(&self) -> Location {
        self.inner.current.read().unwrap().location.clone()
    }

    /// 当前动作
    pub fn action(&self) -> Action {
        self.inner.current.read().unwrap().action
    }

    /// 历史栈深度
    pub fn length(&self) -> usize {
        self.inner.backend.length()
    }
}

/// 归一化导航入参为 `(带 basename 前缀的原始路径, state)`
fn resolve_path_and_state(
    to: PathArg,
    state: Option<Value>,
    basename: &str,
) -> (String, Option<Value>) {
    match to {
        PathArg::Path(path) => (format!("{}{}", basename, path), state),
        PathArg::Located(input) => {
            let raw = format!(
                "{}{}{}{}",
                basename,
                input.pathname,
                normalize_search(&input.search),
                normalize_hash(&input.hash),
            );
            // 结构化入参只认自带的 state，忽略第二个参数
            (raw, input.state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::backend::MemoryHistory;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn make_controller() -> (HistoryController, Arc<MemoryHistory>) {
        let backend = Arc::new(MemoryHistory::new("/"));
        let controller = HistoryController::new(backend.clone(), HistoryConfig::default());
        (controller, backend)
    }

    #[test]
    fn test_initial_state() {
        let (controller, _backend) = make_controller();
        assert_eq!(controller.action(), Action::Pop);
        assert_eq!(controller.location().pathname, "/");
        assert_eq!(controller.length(), 1);
    }

    #[test]
    fn test_push_string_with_search_and_hash() {
        let (controller, backend) = make_controller();
        controller.push("/a?x=1#y", None);

        let location = controller.location();
        assert_eq!(location.pathname, "/a");
        assert_eq!(location.search, "?x=1");
        assert_eq!(location.hash, "#y");
        assert_eq!(controller.action(), Action::Push);
        assert_eq!(backend.current_url(), "/a?x=1#y");
    }

    #[test]
    fn test_push_persists_wrapped_state() {
        let (controller, backend) = make_controller();
        controller.push("/a", Some(json!({"scroll": 10})));

        // 后端条目是 {key, state} 包裹载荷
        let raw = backend.current_state().unwrap();
        let key = raw.get("key").and_then(|k| k.as_str()).unwrap();
        assert_eq!(key.len(), 6);
        assert_eq!(raw.get("state"), Some(&json!({"scroll": 10})));

        // 候选位置本身携带 state，但没有 key（尚未从原生恢复）
        let location = controller.location();
        assert_eq!(location.state, Some(json!({"scroll": 10})));
        assert!(location.key.is_none());
    }

    #[test]
    fn test_structured_input_ignores_state_argument() {
        let (controller, _backend) = make_controller();
        let input = LocationInput {
            pathname: "/a".to_string(),
            search: "x=1".to_string(),
            hash: "y".to_string(),
            state: Some(json!("own")),
        };
        controller.push(input, Some(json!("arg")));

        let location = controller.location();
        assert_eq!(location.search, "?x=1");
        assert_eq!(location.hash, "#y");
        assert_eq!(location.state, Some(json!("own")));

        // 结构化入参没有 state 时，第二个参数同样不生效
        let input = LocationInput::path("/b");
        controller.push(input, Some(json!("arg")));
        assert_eq!(controller.location().state, None);
    }

    #[test]
    fn test_replace_keeps_depth() {
        let (controller, _backend) = make_controller();
        controller.push("/a", None);
        controller.replace("/b", None);

        assert_eq!(controller.location().pathname, "/b");
        assert_eq!(controller.action(), Action::Replace);
        assert_eq!(controller.length(), 2);
    }

    #[test]
    fn test_basename_prefix() {
        let backend = Arc::new(MemoryHistory::new("/app"));
        let config = HistoryConfig {
            basename: "/app".to_string(),
            ..Default::default()
        };
        let controller = HistoryController::new(backend.clone(), config);

        controller.push("/news/10", None);

        // 内部 pathname 不含 basename，真实 URL 含
        assert_eq!(controller.location().pathname, "/news/10");
        assert_eq!(backend.current_url(), "/app/news/10");
        assert_eq!(controller.create_href(LocationInput::path("/news/10")), "/app/news/10");
    }

    #[test]
    fn test_listener_fires_once_per_push() {
        let (controller, _backend) = make_controller();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _unlisten = controller.listen(move |location, action| {
            seen_clone
                .lock()
                .unwrap()
                .push((location.pathname.clone(), action));
        });

        controller.push("/a", None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("/a".to_string(), Action::Push));
    }

    #[test]
    fn test_listener_sees_pre_transition_location() {
        // 通知发生在控制器存储位置更新之前
        let (controller, _backend) = make_controller();
        let observed = Arc::new(Mutex::new(Vec::new()));

        let controller_clone = controller.clone();
        let observed_clone = Arc::clone(&observed);
        let _unlisten = controller.listen(move |location, _action| {
            observed_clone.lock().unwrap().push((
                location.pathname.clone(),
                controller_clone.location().pathname,
            ));
        });

        controller.push("/a", None);

        let observed = observed.lock().unwrap();
        assert_eq!(observed[0], ("/a".to_string(), "/".to_string()));
    }

    #[test]
    fn test_deny_guard_freezes_everything() {
        let backend = Arc::new(MemoryHistory::new("/"));
        let confirmation: UserConfirmation = Arc::new(|_message, decision| decision.deny());
        let controller = HistoryController::with_confirmation(
            backend.clone(),
            HistoryConfig::default(),
            confirmation,
        );

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        let _unlisten = controller.listen(move |_loc, _action| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        let _unblock = controller.block("确定要离开吗？");
        controller.push("/a", None);

        // 位置、动作、监听器、后端都无变化
        assert_eq!(controller.location().pathname, "/");
        assert_eq!(controller.action(), Action::Pop);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(backend.length(), 1);
    }

    #[test]
    fn test_pop_updates_location_only() {
        let (controller, _backend) = make_controller();
        controller.push("/a", None);
        controller.push("/b", None);
        assert_eq!(controller.action(), Action::Push);

        controller.go_back();

        // pop 提交只更新位置，动作保持上一次显式导航的值
        assert_eq!(controller.location().pathname, "/a");
        assert_eq!(controller.action(), Action::Push);
    }

    #[test]
    fn test_pop_recovers_key_from_native_state() {
        let (controller, backend) = make_controller();
        controller.push("/a", Some(json!({"n": 1})));
        controller.push("/b", None);

        let key_b = backend
            .current_state()
            .and_then(|v| v.get("key").and_then(|k| k.as_str()).map(String::from));

        controller.go_back();

        let location = controller.location();
        assert_eq!(location.pathname, "/a");
        assert_eq!(location.state, Some(json!({"n": 1})));
        // 从原生持久化 state 恢复的位置带有 key
        assert!(location.key.is_some());
        assert_ne!(location.key, key_b); // /a 和 /b 的 key 不同
    }

    #[test]
    fn test_denied_pop_leaves_stale_location() {
        // 守卫拒绝 pop 时真实 URL 已经变化，可观察位置滞后
        let backend = Arc::new(MemoryHistory::new("/"));
        let confirmation: UserConfirmation = Arc::new(|_message, decision| decision.deny());
        let controller = HistoryController::with_confirmation(
            backend.clone(),
            HistoryConfig::default(),
            confirmation,
        );

        controller.push("/a", None);
        let _unblock = controller.block("blocked");

        controller.go_back();

        assert_eq!(backend.current_url(), "/");
        assert_eq!(controller.location().pathname, "/a");
    }

    #[test]
    fn test_force_refresh_reloads_after_state_updates() {
        let backend = Arc::new(MemoryHistory::new("/"));
        let config = HistoryConfig {
            force_refresh: true,
            ..Default::default()
        };
        let controller = HistoryController::new(backend.clone(), config);

        controller.push("/a", None);

        // 内存状态先更新，随后才整页刷新
        assert_eq!(controller.location().pathname, "/a");
        assert_eq!(backend.reload_count(), 1);
    }

    #[test]
    fn test_create_href_round_trip() {
        let (controller, _backend) = make_controller();
        let input = LocationInput {
            pathname: "/news/10".to_string(),
            search: "?page=2".to_string(),
            hash: "#top".to_string(),
            state: None,
        };
        let href = controller.create_href(input);
        assert_eq!(href, "/news/10?page=2#top");

        let parsed = Location::from_path(&href, "");
        assert_eq!(parsed.pathname, "/news/10");
        assert_eq!(parsed.search, "?page=2");
        assert_eq!(parsed.hash, "#top");
    }

    #[test]
    fn test_create_href_normalizes_lone_markers() {
        let (controller, _backend) = make_controller();
        let input = LocationInput {
            pathname: "/a".to_string(),
            search: "?".to_string(),
            hash: "#".to_string(),
            state: None,
        };
        assert_eq!(controller.create_href(input), "/a");
    }

    #[test]
    fn test_custom_key_length() {
        let backend = Arc::new(MemoryHistory::new("/"));
        let config = HistoryConfig {
            key_length: 12,
            ..Default::default()
        };
        let controller = HistoryController::new(backend.clone(), config);

        controller.push("/a", None);

        let raw = backend.current_state().unwrap();
        let key = raw.get("key").and_then(|k| k.as_str()).unwrap();
        assert_eq!(key.len(), 12);
    }
}
