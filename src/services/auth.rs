//! 密码认证 - 业务能力层
//!
//! 单一共享密码，只比较 SHA-256 十六进制摘要。

use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// SHA-256 摘要，64 位小写十六进制
pub fn hash_password(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// 校验密码；未配置摘要时一律不通过
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }
    hash_password(password).eq_ignore_ascii_case(stored_hash.trim())
}

/// 启动前的认证检查
pub fn authenticate(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    if stored_hash.is_empty() {
        return Err(AuthError::HashNotConfigured);
    }
    if !verify_password(password, stored_hash) {
        return Err(AuthError::WrongPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_password("비밀번호").len(), 64);
    }

    #[test]
    fn test_verify_password() {
        let stored = hash_password("grader-secret");
        assert!(verify_password("grader-secret", &stored));
        assert!(verify_password("grader-secret", &stored.to_uppercase()));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("", ""));
        assert!(!verify_password("grader-secret", ""));
    }

    #[test]
    fn test_authenticate_errors() {
        let stored = hash_password("pw");
        assert_eq!(authenticate("pw", &stored), Ok(()));
        assert_eq!(authenticate("pw", ""), Err(AuthError::HashNotConfigured));
        assert_eq!(authenticate("nope", &stored), Err(AuthError::WrongPassword));
    }
}
