//! 随机数与常量时间比较
//!
//! 签名密钥、用户 ID 和审计事件 ID 都由这里的操作系统 CSPRNG 生成。

use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::error::{CryptoError, Result};

/// 从 `OsRng` 读取 `length` 个随机字节
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(buf)
}

/// `byte_length` 个随机字节的小写十六进制表示
pub fn generate_random_hex(byte_length: usize) -> Result<String> {
    Ok(to_hex(&generate_random_bytes(byte_length)?))
}

/// 签名比较，耗时与内容无关；长度不同直接返回 `false`
pub fn constant_time_compare(expected: &[u8], actual: &[u8]) -> bool {
    expected.ct_eq(actual).into()
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
