//! # Compass Core - 指南针导航引擎核心
//!
//! 指南针导航引擎是客户端路由方案的核心组件，提供以下核心功能：
//!
//! - **历史抽象**: push / replace / go 统一导航接口与状态恢复
//! - **监听器扇出**: 位置变更的订阅与有序通知
//! - **导航阻塞门**: 离开确认与用户裁决流程
//! - **路径匹配**: `/news/:id` 形式的模式匹配与参数抽取
//! - **配置管理**: 统一的配置加载和管理
//! - **日志系统**: 结构化日志记录
//!
//! ## 快速开始
//!
//! ```rust
//! use std::sync::Arc;
//! use compass_core::{HistoryController, HistoryConfig, MemoryHistory};
//! use compass_core::matcher::{match_path, MatchOptions};
//!
//! let backend = Arc::new(MemoryHistory::new("/"));
//! let history = HistoryController::new(backend, HistoryConfig::default());
//!
//! let _unlisten = history.listen(|location, action| {
//!     println!("{} -> {}", action, location.pathname);
//! });
//!
//! history.push("/news/10?page=2", None);
//!
//! let matched = match_path(
//!     &history.location().pathname,
//!     "/news/:id",
//!     MatchOptions::new(),
//! )
//! .unwrap()
//! .unwrap();
//! assert_eq!(matched.param("id"), Some("10"));
//! ```
//!
//! ## 模块结构
//!
//! - `history` - 历史抽象、监听器与阻塞门
//! - `matcher` - 路径模式匹配
//! - `utils` - 工具函数和错误类型
//! - `core` - 核心配置

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod core;
pub mod history;
pub mod matcher;
pub mod utils;

// 重导出常用类型，方便使用
pub use history::{
    Action, BlockPrompt, ConfirmationDecision, HistoryController, Location, LocationInput,
    MemoryHistory, NativeHistory, NavigationGate, PathArg, SessionState, Unblock, Unlisten,
    UserConfirmation,
};

pub use matcher::{match_path, match_paths, MatchOptions, PathMatcher, RouteMatch};

pub use utils::logger::{fields, LogGuard, Logger, LoggerConfig, LoggerConfigBuilder, RotationStrategy};
pub use utils::{error_code, generate_key, CompassError, Result};

pub use core::config::{
    CompassConfig, CompassConfigBuilder, HistoryConfig, LogConfig, MatcherConfig,
};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
