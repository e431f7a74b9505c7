//! 引擎配置
//!
//! 定义导航引擎的配置结构和加载逻辑。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::error::{CompassError, Result};
use crate::utils::key::DEFAULT_KEY_LENGTH;

/// 历史配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// 应用挂载的路径前缀，空串表示挂载在根
    #[serde(default)]
    pub basename: String,

    /// 每次导航后整页刷新
    #[serde(default)]
    pub force_refresh: bool,

    /// 位置 key 的长度
    #[serde(default = "default_key_length")]
    pub key_length: usize,
}

fn default_key_length() -> usize {
    DEFAULT_KEY_LENGTH
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            basename: String::new(),
            force_refresh: false,
            key_length: default_key_length(),
        }
    }
}

impl HistoryConfig {
    /// 校验配置值
    pub fn validate(&self) -> Result<()> {
        if !self.basename.is_empty() && !self.basename.starts_with('/') {
            return Err(CompassError::InvalidConfigValue {
                key: "history.basename".to_string(),
                reason: "非空 basename 必须以 / 开头".to_string(),
            });
        }
        if self.basename.len() > 1 && self.basename.ends_with('/') {
            return Err(CompassError::InvalidConfigValue {
                key: "history.basename".to_string(),
                reason: "basename 不能以 / 结尾".to_string(),
            });
        }
        if self.key_length == 0 {
            return Err(CompassError::InvalidConfigValue {
                key: "history.key_length".to_string(),
                reason: "key 长度必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 匹配器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// 模式编译缓存容量
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    10_000
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件目录
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志轮转策略
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_dir: None,
            json_format: false,
            rotation: default_rotation(),
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompassConfig {
    /// 配置文件路径
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// 历史配置
    #[serde(default)]
    pub history: HistoryConfig,

    /// 匹配器配置
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            history: HistoryConfig::default(),
            matcher: MatcherConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl CompassConfig {
    /// 创建配置构建器
    pub fn builder() -> CompassConfigBuilder {
        CompassConfigBuilder::new()
    }

    /// 从文件加载配置
    ///
    /// 按扩展名选择格式：`.json` 走 JSON，其余走 YAML。
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;

        let mut config: CompassConfig = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        config.config_path = Some(path);
        Ok(config)
    }

    /// 校验配置值
    pub fn validate(&self) -> Result<()> {
        self.history.validate()
    }

    /// 合并另一个配置（用于覆盖）
    pub fn merge(&mut self, other: CompassConfig) {
        // 只覆盖非默认值的配置
        if !other.history.basename.is_empty() {
            self.history.basename = other.history.basename;
        }
        if other.history.force_refresh {
            self.history.force_refresh = true;
        }
        if other.history.key_length != default_key_length() {
            self.history.key_length = other.history.key_length;
        }
        if other.matcher.cache_capacity != default_cache_capacity() {
            self.matcher.cache_capacity = other.matcher.cache_capacity;
        }
        if other.logging.level != default_log_level() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file_output {
            self.logging.file_output = true;
            self.logging.log_dir = other.logging.log_dir;
        }
        if other.logging.json_format {
            self.logging.json_format = true;
        }
    }
}

/// 配置构建器
#[derive(Debug, Default)]
pub struct CompassConfigBuilder {
    config: CompassConfig,
}

impl CompassConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: CompassConfig::default(),
        }
    }

    /// 设置 basename
    pub fn basename(mut self, basename: impl Into<String>) -> Self {
        self.config.history.basename = basename.into();
        self
    }

    /// 启用整页刷新模式
    pub fn force_refresh(mut self) -> Self {
        self.config.history.force_refresh = true;
        self
    }

    /// 设置 key 长度
    pub fn key_length(mut self, length: usize) -> Self {
        self.config.history.key_length = length;
        self
    }

    /// 设置编译缓存容量
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.matcher.cache_capacity = capacity;
        self
    }

    /// 设置日志级别
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// 启用文件日志
    pub fn file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.config.logging.file_output = true;
        self.config.logging.log_dir = Some(log_dir.into());
        self
    }

    /// 启用 JSON 格式日志
    pub fn json_logging(mut self) -> Self {
        self.config.logging.json_format = true;
        self
    }

    /// 构建配置
    ///
    /// # Errors
    ///
    /// 配置值非法时返回 [`CompassError::InvalidConfigValue`]。
    pub fn build(self) -> Result<CompassConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
