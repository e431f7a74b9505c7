//! 工具模块
//!
//! 包含错误类型、key 生成、日志系统等通用工具。

pub mod error;
pub mod key;
pub mod logger;

// 重导出常用类型
pub use error::{error_code, CompassError, Result};
pub use key::{generate_key, is_valid_key, DEFAULT_KEY_LENGTH};
pub use logger::{fields, LogGuard, Logger, LoggerConfig, LoggerConfigBuilder, RotationStrategy};
