//! 路径模式编译
//!
//! 把 `/news/:id/:page?` 形式的模式字符串分词后编译为正则表达式。
//! 参数按出现顺序记录在有序列表中，匹配结果通过捕获组的位置
//! 与参数名一一对应，不依赖具名捕获组。

use regex::Regex;

use crate::utils::error::{CompassError, Result};

// ============================================================================
// 分词
// ============================================================================

/// 模式词法单元
///
/// 一个模式是若干段（segment）的序列，每段要么是字面量，
/// 要么是以 `:` 引导的参数，参数可带 `?` 后缀表示可选。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// 字面量段
    Literal(String),
    /// 参数段
    Param {
        /// 参数名
        name: String,
        /// 是否可选
        optional: bool,
    },
}

/// 把模式字符串按 `/` 拆成词法单元序列
///
/// # Errors
///
/// 模式不以 `/` 开头，或参数段缺少参数名时返回
/// [`CompassError::InvalidPattern`]。
pub fn tokenize(pattern: &str) -> Result<Vec<Token>> {
    if !pattern.starts_with('/') {
        return Err(CompassError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "模式必须以 / 开头".to_string(),
        });
    }

    let mut tokens = Vec::new();

    // 跳过首个空段（leading slash 产生）
    for segment in pattern[1..].split('/') {
        if let Some(param) = segment.strip_prefix(':') {
            let (name, optional) = match param.strip_suffix('?') {
                Some(name) => (name, true),
                None => (param, false),
            };

            if name.is_empty() {
                return Err(CompassError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "参数段缺少参数名".to_string(),
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(CompassError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("参数名 '{}' 含有非法字符", name),
                });
            }

            tokens.push(Token::Param {
                name: name.to_string(),
                optional,
            });
        } else {
            tokens.push(Token::Literal(segment.to_string()));
        }
    }

    Ok(tokens)
}

// ============================================================================
// 编译
// ============================================================================

/// 编译后的路径模式
///
/// 持有完整的正则表达式和按出现顺序排列的参数名列表。
/// 整条表达式的结构为 `^(模式体)尾部$`：捕获组 1 是模式实际
/// 匹配到的 URL 前缀，参数从捕获组 2 开始依次对应。
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// 原始模式字符串
    pattern: String,
    /// 编译后的正则
    regex: Regex,
    /// 参数名（按出现顺序）
    params: Vec<String>,
}

impl CompiledPattern {
    /// 编译模式
    ///
    /// # Arguments
    ///
    /// * `pattern` - 模式字符串，如 `/news/:id/:page?`
    /// * `strict` - 严格模式下路径的尾部斜杠必须与模式一致
    /// * `sensitive` - 是否大小写敏感
    pub fn compile(pattern: &str, strict: bool, sensitive: bool) -> Result<Self> {
        let tokens = tokenize(pattern)?;

        let mut body = String::new();
        let mut params = Vec::new();

        for token in &tokens {
            match token {
                Token::Literal(segment) => {
                    body.push('/');
                    body.push_str(&regex::escape(segment));
                }
                Token::Param { name, optional } => {
                    if *optional {
                        body.push_str("(?:/([^/]+))?");
                    } else {
                        body.push_str("/([^/]+)");
                    }
                    params.push(name.clone());
                }
            }
        }

        // 非严格模式下尾部斜杠可有可无
        if !strict {
            if body.ends_with('/') {
                body.push('?');
            } else {
                body.push_str("/?");
            }
        }

        // 根模式之后任意内容都算前缀匹配的延续，
        // 其余模式只有完整段边界之后的内容才算
        let tail = if pattern == "/" { ".*" } else { "(?:/.*)?" };

        let flags = if sensitive { "" } else { "(?i)" };
        let expression = format!("{}^({}){}$", flags, body, tail);

        let regex = Regex::new(&expression).map_err(|e| CompassError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            params,
        })
    }

    /// 原始模式字符串
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 参数名列表（按出现顺序）
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// 对路径执行匹配
    ///
    /// # Returns
    ///
    /// 匹配成功时返回 `(模式匹配到的 URL 前缀, 参数键值对)`，
    /// 参数顺序与模式中的出现顺序一致，未匹配的可选参数被省略。
    pub fn match_against(&self, pathname: &str) -> Option<(String, Vec<(String, String)>)> {
        let captures = self.regex.captures(pathname)?;

        // 捕获组 0 是整个路径，组 1 是模式体命中的前缀
        let url = captures.get(1)?.as_str().to_string();

        let params = self
            .params
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 2)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();

        Some((url, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_literals_and_params() {
        let tokens = tokenize("/news/:id/:page?").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("news".to_string()),
                Token::Param {
                    name: "id".to_string(),
                    optional: false
                },
                Token::Param {
                    name: "page".to_string(),
                    optional: true
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_root() {
        let tokens = tokenize("/").unwrap();
        assert_eq!(tokens, vec![Token::Literal(String::new())]);
    }

    #[test]
    fn test_tokenize_rejects_relative_pattern() {
        let err = tokenize("news/:id").unwrap_err();
        assert!(matches!(err, CompassError::InvalidPattern { .. }));
        assert_eq!(err.error_code(), "MATCH-001");
    }

    #[test]
    fn test_tokenize_rejects_empty_param_name() {
        assert!(tokenize("/news/:").is_err());
        assert!(tokenize("/news/:?").is_err());
    }

    #[test]
    fn test_compile_two_params_full_match() {
        let compiled = CompiledPattern::compile("/news/:id/:page", false, false).unwrap();
        let (url, params) = compiled.match_against("/news/10/readers").unwrap();

        assert_eq!(url, "/news/10/readers");
        assert_eq!(
            params,
            vec![
                ("id".to_string(), "10".to_string()),
                ("page".to_string(), "readers".to_string()),
            ]
        );
    }

    #[test]
    fn test_compile_prefix_match_reports_url() {
        let compiled = CompiledPattern::compile("/news/:id", false, false).unwrap();
        let (url, params) = compiled.match_against("/news/10/extra").unwrap();

        // 前缀命中：url 只含模式覆盖到的部分
        assert_eq!(url, "/news/10");
        assert_eq!(params, vec![("id".to_string(), "10".to_string())]);
    }

    #[test]
    fn test_prefix_respects_segment_boundary() {
        let compiled = CompiledPattern::compile("/news", false, false).unwrap();

        assert!(compiled.match_against("/news").is_some());
        assert!(compiled.match_against("/news/10").is_some());
        // "/newsroom" 不是 "/news" 的段边界延续
        assert!(compiled.match_against("/newsroom").is_none());
    }

    #[test]
    fn test_optional_param_omitted() {
        let compiled = CompiledPattern::compile("/news/:id/:page?", false, false).unwrap();

        let (url, params) = compiled.match_against("/news/10").unwrap();
        assert_eq!(url, "/news/10");
        assert_eq!(params, vec![("id".to_string(), "10".to_string())]);

        let (_, params) = compiled.match_against("/news/10/2").unwrap();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_strict_trailing_slash() {
        let strict = CompiledPattern::compile("/news", true, false).unwrap();
        let (url, _) = strict.match_against("/news/").unwrap();
        // 严格模式下尾部斜杠不并入命中前缀
        assert_eq!(url, "/news");

        let lenient = CompiledPattern::compile("/news", false, false).unwrap();
        let (url, _) = lenient.match_against("/news/").unwrap();
        assert_eq!(url, "/news/");
    }

    #[test]
    fn test_case_sensitivity() {
        let insensitive = CompiledPattern::compile("/News", false, false).unwrap();
        let (url, _) = insensitive.match_against("/news").unwrap();
        assert_eq!(url, "/news");

        let sensitive = CompiledPattern::compile("/News", false, true).unwrap();
        assert!(sensitive.match_against("/news").is_none());
    }

    #[test]
    fn test_root_pattern_matches_everything() {
        let compiled = CompiledPattern::compile("/", false, false).unwrap();

        let (url, _) = compiled.match_against("/").unwrap();
        assert_eq!(url, "/");

        let (url, _) = compiled.match_against("/news/10").unwrap();
        assert_eq!(url, "/");
    }

    #[test]
    fn test_literal_with_regex_metacharacters() {
        let compiled = CompiledPattern::compile("/a+b/:id", false, false).unwrap();

        assert!(compiled.match_against("/a+b/1").is_some());
        assert!(compiled.match_against("/aab/1").is_none());
    }
}
