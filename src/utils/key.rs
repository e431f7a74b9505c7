//! 历史条目 key 生成器
//!
//! 本模块实现历史栈条目的随机 key 生成功能。
//! key 格式：指定长度的 36 进制字符串（0-9, a-z），默认 6 位。
//!
//! key 随调用方 state 一起写入原生历史条目，用于区分本引擎管理的
//! state 和第三方写入的 state。监听器注册 ID 也复用本生成器。

use rand::Rng;

/// 36 进制字符集
const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 默认 key 长度
pub const DEFAULT_KEY_LENGTH: usize = 6;

/// 生成指定长度的随机 key
///
/// # Arguments
///
/// * `length` - key 长度，传 0 时使用默认长度
///
/// # Example
///
/// ```
/// use compass_core::utils::key::generate_key;
///
/// let key = generate_key(6);
/// assert_eq!(key.len(), 6);
/// ```
pub fn generate_key(length: usize) -> String {
    let length = if length == 0 { DEFAULT_KEY_LENGTH } else { length };
    let mut rng = rand::thread_rng();

    let mut result = Vec::with_capacity(length);
    for _ in 0..length {
        let index = rng.gen_range(0..BASE36_CHARS.len());
        result.push(BASE36_CHARS[index]);
    }

    String::from_utf8(result).unwrap()
}

/// 验证 key 格式是否有效
///
/// # Arguments
///
/// * `key` - 要验证的 key 字符串
/// * `length` - 期望长度
pub fn is_valid_key(key: &str, length: usize) -> bool {
    if key.len() != length {
        return false;
    }

    key.bytes().all(|b| BASE36_CHARS.contains(&b))
}
