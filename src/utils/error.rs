//! 指南针导航引擎错误类型定义
//!
//! 本模块定义了导航引擎中使用的所有错误类型。
//!
//! 错误分为三类（见各变体文档）：
//! 1. 程序员错误：非法的路由模式、非法的配置值等，同步抛出、不可恢复；
//! 2. 导航中止：阻塞守卫拒绝导航——这不是错误，表现为静默无操作，不在本模块建模；
//! 3. 环境限制：POP 事件无法在事后否决——这是文档化的限制，同样不作为错误抛出。

use thiserror::Error;

/// 导航引擎核心错误类型
#[derive(Error, Debug)]
pub enum CompassError {
    // ==================== 路由匹配错误 ====================

    /// 路由模式无效（无法编译为匹配器）
    #[error("路由模式无效: '{pattern}' - {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    // ==================== 配置错误 ====================

    /// 配置加载失败
    #[error("配置加载失败: {0}")]
    ConfigLoadFailed(String),

    /// 配置值无效
    #[error("配置值无效: '{key}' - {reason}")]
    InvalidConfigValue {
        key: String,
        reason: String,
    },

    // ==================== 日志系统错误 ====================

    /// 日志系统初始化失败
    #[error("日志系统初始化失败: {0}")]
    LogInitFailed(String),

    // ==================== IO 和序列化错误 ====================

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML 序列化/反序列化错误
    #[error("YAML 错误: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// 导航引擎操作结果类型别名
pub type Result<T> = std::result::Result<T, CompassError>;

/// 错误码常量
pub mod error_code {
    // 匹配错误 (MATCH-xxx)
    pub const MATCH_INVALID_PATTERN: &str = "MATCH-001";

    // 配置错误 (CONFIG-xxx)
    pub const CONFIG_LOAD_FAILED: &str = "CONFIG-001";
    pub const CONFIG_INVALID_VALUE: &str = "CONFIG-002";

    // 日志错误 (LOG-xxx)
    pub const LOG_INIT_FAILED: &str = "LOG-001";
}

impl CompassError {
    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            CompassError::InvalidPattern { .. } => error_code::MATCH_INVALID_PATTERN,
            CompassError::ConfigLoadFailed(_) => error_code::CONFIG_LOAD_FAILED,
            CompassError::InvalidConfigValue { .. } => error_code::CONFIG_INVALID_VALUE,
            CompassError::LogInitFailed(_) => error_code::LOG_INIT_FAILED,
            _ => "UNKNOWN",
        }
    }
}
