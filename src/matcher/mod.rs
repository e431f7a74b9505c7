//! 路径模式匹配
//!
//! 判断一条 pathname 是否命中 `/news/:id/:page?` 形式的模式，
//! 并抽取参数。对外入口：
//!
//! - [`match_path`] / [`match_paths`] - 使用进程级共享编译缓存
//! - [`PathMatcher`] - 持有独立缓存的匹配器句柄
//!
//! 匹配默认是前缀式的：模式覆盖 pathname 的一个段边界前缀即算
//! 命中，[`MatchOptions::exact`] 置位后才要求完整覆盖。

pub mod cache;
pub mod pattern;

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::trace;

use crate::utils::error::Result;

pub use cache::{PatternCache, PatternCacheStats};
pub use pattern::{CompiledPattern, Token};

// ============================================================================
// 选项与结果
// ============================================================================

/// 匹配选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// 要求模式完整覆盖 pathname
    pub exact: bool,
    /// 尾部斜杠必须与模式一致
    pub strict: bool,
    /// 大小写敏感
    pub sensitive: bool,
}

impl MatchOptions {
    /// 默认选项（前缀匹配、忽略尾部斜杠、忽略大小写）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置完整匹配
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// 设置严格尾部斜杠
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 设置大小写敏感
    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// 命中的模式字符串
    pub path: String,
    /// 模式实际覆盖到的 pathname 前缀
    pub url: String,
    /// 是否完整覆盖
    pub is_exact: bool,
    /// 抽取出的参数（按模式中的出现顺序）
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    /// 按名字取参数值
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// 匹配器
// ============================================================================

/// 路径匹配器
///
/// 持有自己的编译缓存。句柄可廉价克隆，克隆之间共享缓存。
#[derive(Clone)]
pub struct PathMatcher {
    cache: Arc<PatternCache>,
}

impl PathMatcher {
    /// 创建匹配器（默认缓存容量）
    pub fn new() -> Self {
        Self {
            cache: Arc::new(PatternCache::with_default_capacity()),
        }
    }

    /// 创建匹配器并指定缓存容量
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: Arc::new(PatternCache::new(capacity)),
        }
    }

    /// 对单个模式执行匹配
    ///
    /// # Errors
    ///
    /// 模式非法时返回 [`crate::utils::CompassError::InvalidPattern`]。
    pub fn match_path(
        &self,
        pathname: &str,
        pattern: &str,
        options: MatchOptions,
    ) -> Result<Option<RouteMatch>> {
        let key = PatternCache::cache_key(pattern, options.strict, options.sensitive);

        let compiled = match self.cache.get(&key) {
            Some(compiled) => compiled,
            None => {
                let compiled =
                    CompiledPattern::compile(pattern, options.strict, options.sensitive)?;
                self.cache.put(key, compiled.clone());
                compiled
            }
        };

        Ok(evaluate(&compiled, pathname, options))
    }

    /// 依次尝试多个模式，返回第一个命中
    pub fn match_paths(
        &self,
        pathname: &str,
        patterns: &[&str],
        options: MatchOptions,
    ) -> Result<Option<RouteMatch>> {
        for pattern in patterns {
            if let Some(matched) = self.match_path(pathname, pattern, options)? {
                return Ok(Some(matched));
            }
        }
        Ok(None)
    }

    /// 缓存统计
    pub fn cache_stats(&self) -> PatternCacheStats {
        self.cache.stats()
    }

    /// 清空编译缓存
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// 用编译结果对 pathname 做判定
fn evaluate(
    compiled: &CompiledPattern,
    pathname: &str,
    options: MatchOptions,
) -> Option<RouteMatch> {
    let (url, params) = compiled.match_against(pathname)?;
    let is_exact = url == pathname;

    if options.exact && !is_exact {
        trace!(pattern = compiled.pattern(), pathname, "前缀命中但要求完整匹配，判为未命中");
        return None;
    }

    Some(RouteMatch {
        path: compiled.pattern().to_string(),
        url,
        is_exact,
        params,
    })
}

// ============================================================================
// 进程级入口
// ============================================================================

/// 进程级共享缓存
fn shared_cache() -> &'static PatternCache {
    static SHARED: OnceLock<PatternCache> = OnceLock::new();
    SHARED.get_or_init(PatternCache::with_default_capacity)
}

/// 对单个模式执行匹配（使用进程级共享编译缓存）
///
/// # 示例
///
/// ```
/// use compass_core::matcher::{match_path, MatchOptions};
///
/// let matched = match_path("/news/10/readers", "/news/:id/:page", MatchOptions::new())
///     .unwrap()
///     .unwrap();
/// assert_eq!(matched.param("id"), Some("10"));
/// assert_eq!(matched.param("page"), Some("readers"));
/// assert!(matched.is_exact);
/// ```
pub fn match_path(
    pathname: &str,
    pattern: &str,
    options: MatchOptions,
) -> Result<Option<RouteMatch>> {
    let key = PatternCache::cache_key(pattern, options.strict, options.sensitive);
    let cache = shared_cache();

    let compiled = match cache.get(&key) {
        Some(compiled) => compiled,
        None => {
            let compiled = CompiledPattern::compile(pattern, options.strict, options.sensitive)?;
            cache.put(key, compiled.clone());
            compiled
        }
    };

    Ok(evaluate(&compiled, pathname, options))
}

/// 依次尝试多个模式，返回第一个命中（使用进程级共享编译缓存）
pub fn match_paths(
    pathname: &str,
    patterns: &[&str],
    options: MatchOptions,
) -> Result<Option<RouteMatch>> {
    for pattern in patterns {
        if let Some(matched) = match_path(pathname, pattern, options)? {
            return Ok(Some(matched));
        }
    }
    Ok(None)
}
