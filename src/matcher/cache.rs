//! 模式编译缓存
//!
//! 同一模式在渲染路径上会被反复匹配，正则编译却相对昂贵。
//! 使用 LRU 缓存保存编译结果，键由模式字符串和影响正则形态的
//! 选项共同构成。

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::pattern::CompiledPattern;

/// 默认缓存容量
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// 编译缓存统计信息
#[derive(Debug, Clone, Serialize)]
pub struct PatternCacheStats {
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 缓存条目数量
    pub size: usize,
    /// 缓存容量
    pub capacity: usize,
    /// 命中率（百分比）
    pub hit_rate: f64,
}

/// 模式编译缓存
///
/// 使用 LRU 算法缓存最近编译的模式，避免重复正则编译。
pub struct PatternCache {
    /// LRU 缓存（缓存键 -> 编译结果）
    cache: Mutex<LruCache<String, CompiledPattern>>,
    /// 缓存命中次数
    hits: AtomicU64,
    /// 缓存未命中次数
    misses: AtomicU64,
    /// 缓存容量
    capacity: usize,
}

impl PatternCache {
    /// 创建新的编译缓存
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1); // 确保至少为 1
        Self {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            capacity,
        }
    }

    /// 使用默认容量创建缓存
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// 构造缓存键
    ///
    /// strict 和 sensitive 会改变正则形态，必须参与键的构成；
    /// exact 只影响编译后的判定，不参与。
    pub fn cache_key(pattern: &str, strict: bool, sensitive: bool) -> String {
        format!("{}|strict={}|sensitive={}", pattern, strict, sensitive)
    }

    /// 从缓存获取编译结果
    pub fn get(&self, key: &str) -> Option<CompiledPattern> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(compiled) = cache.get(key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(compiled)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// 将编译结果放入缓存
    pub fn put(&self, key: String, compiled: CompiledPattern) {
        let mut cache = self.cache.lock().unwrap();
        cache.put(key, compiled);
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap();
        cache.clear();
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> PatternCacheStats {
        let cache = self.cache.lock().unwrap();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        PatternCacheStats {
            hits,
            misses,
            size: cache.len(),
            capacity: self.capacity,
            hit_rate: if total > 0 {
                (hits as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        }
    }

    /// 重置统计计数器
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> CompiledPattern {
        CompiledPattern::compile(pattern, false, false).unwrap()
    }

    #[test]
    fn test_cache_basic() {
        let cache = PatternCache::new(10);
        let key = PatternCache::cache_key("/news/:id", false, false);

        // 初始状态应该是空的
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), compile("/news/:id"));

        let cached = cache.get(&key);
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().pattern(), "/news/:id");

        // 检查统计
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_cache_key_separates_options() {
        // 同一模式在不同选项下是不同的缓存条目
        let lenient = PatternCache::cache_key("/news", false, false);
        let strict = PatternCache::cache_key("/news", true, false);
        let sensitive = PatternCache::cache_key("/news", false, true);

        assert_ne!(lenient, strict);
        assert_ne!(lenient, sensitive);
        assert_ne!(strict, sensitive);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let cache = PatternCache::new(2); // 容量为 2

        cache.put("a".to_string(), compile("/a"));
        cache.put("b".to_string(), compile("/b"));
        cache.put("c".to_string(), compile("/c")); // 应该驱逐 a

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_hit_rate() {
        let cache = PatternCache::new(10);
        cache.put("p".to_string(), compile("/p"));

        cache.get("p");
        cache.get("p");
        cache.get("p");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 75.0).abs() < 0.001);
    }

    #[test]
    fn test_cache_clear_and_reset() {
        let cache = PatternCache::new(10);
        cache.put("p".to_string(), compile("/p"));
        cache.get("p");

        cache.clear();
        cache.reset_stats();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }
}
