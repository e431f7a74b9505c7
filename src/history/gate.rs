//! 导航阻塞门
//!
//! 持有至多一个阻塞守卫。对每个候选导航，无守卫时立即放行；
//! 有守卫时先计算提示消息，再交给外部确认回调裁决，
//! 允许则提交导航，拒绝则静默放弃（不是错误，也没有任何可观察的变更）。
//!
//! 确认回调可以同步裁决，也可以把 [`ConfirmationDecision`] 留存到
//! 稍后再裁决（比如弹出异步对话框）——这是整个引擎唯一的挂起点。

use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::history::location::{Action, Location};

/// 阻塞提示
///
/// 静态消息，或根据候选位置与动作计算消息的函数。
/// 带标签的枚举使"既不是字符串也不是函数"的非法守卫无法被表达。
#[derive(Clone)]
pub enum BlockPrompt {
    /// 固定提示消息
    Message(String),
    /// 根据候选位置和动作生成提示消息
    Compute(Arc<dyn Fn(&Location, Action) -> String + Send + Sync>),
}

impl BlockPrompt {
    /// 以函数形式构造提示
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&Location, Action) -> String + Send + Sync + 'static,
    {
        BlockPrompt::Compute(Arc::new(f))
    }

    /// 计算提示消息
    fn message(&self, location: &Location, action: Action) -> String {
        match self {
            BlockPrompt::Message(msg) => msg.clone(),
            BlockPrompt::Compute(f) => f(location, action),
        }
    }
}

impl From<&str> for BlockPrompt {
    fn from(msg: &str) -> Self {
        BlockPrompt::Message(msg.to_string())
    }
}

impl From<String> for BlockPrompt {
    fn from(msg: String) -> Self {
        BlockPrompt::Message(msg)
    }
}

impl std::fmt::Debug for BlockPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockPrompt::Message(msg) => f.debug_tuple("Message").field(msg).finish(),
            BlockPrompt::Compute(_) => f.debug_tuple("Compute").field(&"<fn>").finish(),
        }
    }
}

/// 确认裁决句柄
///
/// 包装待提交的导航动作。`resolve(true)` 恰好提交一次，
/// `resolve(false)` 静默放弃。句柄在裁决时被消耗，
/// 因此"多次裁决"在类型层面不可能；从不裁决则导航永远不会完成。
pub struct ConfirmationDecision {
    proceed: Box<dyn FnOnce() + Send>,
}

impl ConfirmationDecision {
    fn new(proceed: Box<dyn FnOnce() + Send>) -> Self {
        Self { proceed }
    }

    /// 裁决导航
    ///
    /// # Arguments
    ///
    /// * `allow` - true 提交导航，false 放弃
    pub fn resolve(self, allow: bool) {
        if allow {
            trace!("确认通过，提交导航");
            (self.proceed)();
        } else {
            debug!("确认被拒绝，放弃导航");
        }
    }

    /// 等价于 `resolve(true)`
    pub fn allow(self) {
        self.resolve(true);
    }

    /// 等价于 `resolve(false)`
    pub fn deny(self) {
        self.resolve(false);
    }
}

/// 外部确认回调类型
///
/// 收到提示消息和裁决句柄。浏览器宿主通常用阻塞式确认对话框实现；
/// 库自带的默认实现直接放行（宿主未注入对话框时等同于无守卫路径）。
pub type UserConfirmation = Arc<dyn Fn(&str, ConfirmationDecision) + Send + Sync>;

/// 默认确认回调：直接放行
pub fn default_confirmation() -> UserConfirmation {
    Arc::new(|message, decision| {
        debug!(message = %message, "使用默认确认回调，直接放行");
        decision.allow();
    })
}

/// 导航阻塞门
///
/// 同一时刻最多有一个守卫生效；重复设置会覆盖旧守卫。
#[derive(Clone)]
pub struct NavigationGate {
    /// 当前守卫（至多一个）
    prompt: Arc<RwLock<Option<BlockPrompt>>>,

    /// 外部确认回调
    confirmation: UserConfirmation,
}

impl NavigationGate {
    /// 创建阻塞门
    pub fn new(confirmation: UserConfirmation) -> Self {
        Self {
            prompt: Arc::new(RwLock::new(None)),
            confirmation,
        }
    }

    /// 设置阻塞守卫
    ///
    /// # Returns
    ///
    /// 返回 [`Unblock`] 句柄，调用后清除守卫。由于同一时刻只支持
    /// 一个守卫，清除是无条件的（幂等）。
    pub fn block(&self, prompt: impl Into<BlockPrompt>) -> Unblock {
        let prompt = prompt.into();
        debug!(prompt = ?prompt, "设置导航阻塞守卫");

        let mut slot = self.prompt.write().unwrap();
        *slot = Some(prompt);

        Unblock {
            prompt: Arc::clone(&self.prompt),
        }
    }

    /// 当前是否有守卫生效
    pub fn is_blocked(&self) -> bool {
        self.prompt.read().unwrap().is_some()
    }

    /// 对候选导航求值
    ///
    /// 无守卫时同步调用 `proceed`；有守卫时计算提示消息并交给确认
    /// 回调裁决。回调可以延迟裁决；多个裁决同时挂起时互不排队，
    /// 后提交者覆盖先提交者的结果（最后提交生效）。
    ///
    /// # Arguments
    ///
    /// * `location` - 候选位置
    /// * `action` - 候选动作
    /// * `proceed` - 提交导航的动作，至多执行一次
    pub fn evaluate(&self, location: &Location, action: Action, proceed: Box<dyn FnOnce() + Send>) {
        // 在锁外调用守卫函数和确认回调，两者都可能重入本引擎
        let prompt = {
            let slot = self.prompt.read().unwrap();
            slot.clone()
        };

        let Some(prompt) = prompt else {
            proceed();
            return;
        };

        let message = prompt.message(location, action);
        debug!(
            action = %action,
            pathname = %location.pathname,
            message = %message,
            "导航被守卫拦截，等待确认"
        );

        (self.confirmation)(&message, ConfirmationDecision::new(proceed));
    }
}

/// 守卫清除句柄
pub struct Unblock {
    prompt: Arc<RwLock<Option<BlockPrompt>>>,
}

impl Unblock {
    /// 清除守卫（幂等）
    pub fn unblock(&self) {
        let mut slot = self.prompt.write().unwrap();
        if slot.take().is_some() {
            debug!("清除导航阻塞守卫");
        }
    }
}
