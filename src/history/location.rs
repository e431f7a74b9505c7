//! 位置与动作数据结构
//!
//! 定义导航引擎的核心值对象：位置（Location）、动作（Action）、
//! 原生历史条目载荷（SessionState），以及路径字符串的解析与规范化。
//!
//! 值对象在每次导航时重新构建，从不原地修改。

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// 动作
// ============================================================================

/// 导航动作
///
/// PUSH / REPLACE 来源于显式的导航调用；POP 来源于原生的前进、后退
/// 或 hash 编辑事件，只能被观察，无法被阻止。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// 向历史栈压入新条目
    Push,
    /// 替换当前历史栈条目
    Replace,
    /// 原生前进/后退/hash 变化
    Pop,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Push => write!(f, "PUSH"),
            Action::Replace => write!(f, "REPLACE"),
            Action::Pop => write!(f, "POP"),
        }
    }
}

// ============================================================================
// 位置
// ============================================================================

/// 位置对象
///
/// `pathname` 不包含配置的 basename 前缀；`search` 为空或以 `?` 开头；
/// `hash` 为空或以 `#` 开头。`key` 仅在从原生持久化 state 恢复时存在，
/// 尚未进入历史栈的候选位置（如阻塞求值期间）没有 key。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// 路径部分（不含 basename）
    pub pathname: String,

    /// 查询字符串（空或以 `?` 开头）
    #[serde(default)]
    pub search: String,

    /// 片段标识（空或以 `#` 开头）
    #[serde(default)]
    pub hash: String,

    /// 调用方附带的状态数据
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,

    /// 历史栈条目标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Location {
    /// 从路径字符串解析位置
    ///
    /// 解析规则：
    /// - pathname 为首个 `?` 或 `#` 之前的部分，并剔除 basename 前缀；
    /// - 若 `?` 不存在，或出现在 `#` 之后，则没有 search 部分
    ///   （`#` 之后的内容全部属于 hash）；
    /// - hash 为首个 `#` 开始到结尾的部分。
    ///
    /// # Arguments
    ///
    /// * `path` - 完整路径字符串，可能含 `?` 和 `#`，可能含 basename
    /// * `basename` - 要剔除的路径前缀
    ///
    /// # Example
    ///
    /// ```
    /// use compass_core::history::Location;
    ///
    /// let loc = Location::from_path("/news/10?page=2#top", "");
    /// assert_eq!(loc.pathname, "/news/10");
    /// assert_eq!(loc.search, "?page=2");
    /// assert_eq!(loc.hash, "#top");
    /// ```
    pub fn from_path(path: &str, basename: &str) -> Self {
        let question_index = path.find('?');
        let sharp_index = path.find('#');

        // pathname: 首个 ? 或 # 之前的部分
        let path_end = match (question_index, sharp_index) {
            (Some(q), Some(s)) => q.min(s),
            (Some(q), None) => q,
            (None, Some(s)) => s,
            (None, None) => path.len(),
        };
        let mut pathname = &path[..path_end];

        // 剔除 basename 前缀
        if !basename.is_empty() {
            if let Some(stripped) = pathname.strip_prefix(basename) {
                pathname = stripped;
            }
        }

        // search: ? 不存在或出现在 # 之后时为空
        let search = match (question_index, sharp_index) {
            (Some(q), Some(s)) if q < s => path[q..s].to_string(),
            (Some(q), None) => path[q..].to_string(),
            _ => String::new(),
        };

        // hash: 首个 # 到结尾
        let hash = match sharp_index {
            Some(s) => path[s..].to_string(),
            None => String::new(),
        };

        Self {
            pathname: pathname.to_string(),
            search: normalize_search(&search),
            hash: normalize_hash(&hash),
            state: None,
            key: None,
        }
    }

    /// 附加状态数据
    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }
}

// ============================================================================
// 原生持久化载荷
// ============================================================================

/// 原生历史条目中持久化的载荷
///
/// 调用方 state 被包裹一层再写入原生历史条目，key 用于区分本引擎
/// 管理的 state 和第三方写入的 state，避免互相混淆。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// 随机生成的条目标识
    pub key: String,

    /// 调用方附带的状态数据
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl SessionState {
    /// 构造新的载荷
    pub fn new(key: impl Into<String>, state: Option<Value>) -> Self {
        Self {
            key: key.into(),
            state,
        }
    }

    /// 转换为原生 JSON 值
    pub fn to_value(&self) -> Value {
        // SessionState 的 serde 形状是固定的，序列化不会失败
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 从原生持久化 state 恢复 `(state, key)`
    ///
    /// 恢复规则：
    /// 1. 原生 state 不存在 ⇒ state 为 None，没有 key；
    /// 2. 原生 state 不是对象 ⇒ state 即该值本身；
    /// 3. 原生 state 是含有 `key` 字段的对象 ⇒ 该对象是本引擎写入的包裹
    ///    载荷，key 取其 `key`，state 取其 `state`；
    /// 4. 原生 state 是不含 `key` 字段的对象 ⇒ 第三方写入的 state，
    ///    整个对象作为 state，没有 key。
    pub fn recover(raw: Option<Value>) -> (Option<Value>, Option<String>) {
        match raw {
            None | Some(Value::Null) => (None, None),
            Some(Value::Object(map)) => {
                if let Some(Value::String(key)) = map.get("key") {
                    let key = key.clone();
                    let state = match map.get("state") {
                        None => None,
                        Some(v) => Some(v.clone()),
                    };
                    (state, Some(key))
                } else {
                    (Some(Value::Object(map)), None)
                }
            }
            Some(other) => (Some(other), None),
        }
    }
}

// ============================================================================
// 路径规范化
// ============================================================================

/// 规范化 search 字符串
///
/// 非空且不以 `?` 开头时补上前缀；单独一个 `?` 规范化为空字符串。
pub fn normalize_search(search: &str) -> String {
    if search.is_empty() || search == "?" {
        String::new()
    } else if search.starts_with('?') {
        search.to_string()
    } else {
        format!("?{}", search)
    }
}

/// 规范化 hash 字符串
///
/// 非空且不以 `#` 开头时补上前缀；单独一个 `#` 规范化为空字符串。
pub fn normalize_hash(hash: &str) -> String {
    if hash.is_empty() || hash == "#" {
        String::new()
    } else if hash.starts_with('#') {
        hash.to_string()
    } else {
        format!("#{}", hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_path_full() {
        let loc = Location::from_path("/a?x=1#y", "");
        assert_eq!(loc.pathname, "/a");
        assert_eq!(loc.search, "?x=1");
        assert_eq!(loc.hash, "#y");
        assert!(loc.key.is_none());
    }

    #[test]
    fn test_from_path_no_search() {
        let loc = Location::from_path("/a", "");
        assert_eq!(loc.pathname, "/a");
        assert_eq!(loc.search, "");
        assert_eq!(loc.hash, "");
    }

    #[test]
    fn test_from_path_question_after_sharp() {
        // ? 出现在 # 之后时没有 search，? 属于 hash 的一部分
        let loc = Location::from_path("/a#y?x=1", "");
        assert_eq!(loc.pathname, "/a");
        assert_eq!(loc.search, "");
        assert_eq!(loc.hash, "#y?x=1");
    }

    #[test]
    fn test_from_path_strips_basename() {
        let loc = Location::from_path("/app/news/10?p=1", "/app");
        assert_eq!(loc.pathname, "/news/10");
        assert_eq!(loc.search, "?p=1");
    }

    #[test]
    fn test_from_path_lone_markers() {
        let loc = Location::from_path("/a?#", "");
        assert_eq!(loc.pathname, "/a");
        assert_eq!(loc.search, "");
        assert_eq!(loc.hash, "");
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(""), "");
        assert_eq!(normalize_search("?"), "");
        assert_eq!(normalize_search("?a=1"), "?a=1");
        assert_eq!(normalize_search("a=1"), "?a=1");
    }

    #[test]
    fn test_normalize_hash() {
        assert_eq!(normalize_hash(""), "");
        assert_eq!(normalize_hash("#"), "");
        assert_eq!(normalize_hash("#top"), "#top");
        assert_eq!(normalize_hash("top"), "#top");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Push.to_string(), "PUSH");
        assert_eq!(Action::Replace.to_string(), "REPLACE");
        assert_eq!(Action::Pop.to_string(), "POP");
    }

    #[test]
    fn test_session_state_round_trip() {
        let session = SessionState::new("a1b2c3", Some(json!({"scroll": 120})));
        let value = session.to_value();

        let (state, key) = SessionState::recover(Some(value));
        assert_eq!(key.as_deref(), Some("a1b2c3"));
        assert_eq!(state, Some(json!({"scroll": 120})));
    }

    #[test]
    fn test_recover_absent_state() {
        let (state, key) = SessionState::recover(None);
        assert!(state.is_none());
        assert!(key.is_none());

        let (state, key) = SessionState::recover(Some(Value::Null));
        assert!(state.is_none());
        assert!(key.is_none());
    }

    #[test]
    fn test_recover_non_object_state() {
        // 第三方直接写入的标量 state 原样恢复
        let (state, key) = SessionState::recover(Some(json!(42)));
        assert_eq!(state, Some(json!(42)));
        assert!(key.is_none());
    }

    #[test]
    fn test_recover_foreign_object_state() {
        // 不含 key 字段的对象视为第三方 state，整体恢复
        let (state, key) = SessionState::recover(Some(json!({"scroll": 7})));
        assert_eq!(state, Some(json!({"scroll": 7})));
        assert!(key.is_none());
    }
}
