//! 历史抽象层
//!
//! 在原生会话历史之上提供统一的导航接口：
//!
//! - [`HistoryController`] - 中心状态机，push / replace / go 与状态恢复
//! - [`ListenerRegistry`] - 位置变更监听器的注册与扇出
//! - [`NavigationGate`] - 导航阻塞门与用户确认流程
//! - [`NativeHistory`] - 原生历史后端抽象，附带 [`MemoryHistory`] 实现
//! - [`Location`] - 解析后的位置值与持久化 state 封装

pub mod backend;
pub mod controller;
pub mod gate;
pub mod listener;
pub mod location;

pub use backend::{MemoryHistory, NativeHistory, PopHandler};
pub use controller::{HistoryController, LocationInput, PathArg};
pub use gate::{
    default_confirmation, BlockPrompt, ConfirmationDecision, NavigationGate, Unblock,
    UserConfirmation,
};
pub use listener::{ListenerCallback, ListenerRegistry, NotifyStats, Unlisten};
pub use location::{Action, Location, SessionState};
