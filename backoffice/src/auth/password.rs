// パスワードハッシュ化と検証（bcrypt実装）

use crate::common::error::AdminError;
use bcrypt::{hash, verify};

/// パスワードハッシュ化のコスト（本番は12、ユニットテストは高速化のため最小値）
pub const HASH_COST: u32 = if cfg!(test) { 4 } else { 12 };

/// パスワードをbcryptでハッシュ化
///
/// # Returns
/// * `Ok(String)` - bcryptハッシュ文字列（$2b$で始まる）
/// * `Err(AdminError::ServiceError)` - ハッシュ化失敗
pub fn hash_password(password: &str) -> Result<String, AdminError> {
    hash_password_with_cost(password, HASH_COST)
}

/// コストを指定してハッシュ化
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AdminError> {
    hash(password, cost)
        .map_err(|e| AdminError::ServiceError(format!("Failed to hash password: {}", e)))
}

/// パスワードを検証
///
/// # Returns
/// * `Ok(true)` - パスワード一致
/// * `Ok(false)` - パスワード不一致
/// * `Err(AdminError::ServiceError)` - ハッシュ文字列が不正
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AdminError> {
    verify(password, hash)
        .map_err(|e| AdminError::ServiceError(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_password_hash_and_verify() {
        let pw = "\u{1F600}\u{65E5}\u{672C}\u{8A9E}\u{30D1}\u{30B9}\u{30EF}\u{30FC}\u{30C9}";
        let h = hash_password(pw).unwrap();
        assert!(verify_password(pw, &h).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let h = hash_password("correct").unwrap();
        assert!(!verify_password("wrong", &h).unwrap());
    }

    #[test]
    fn same_password_produces_different_hashes() {
        let h1 = hash_password("same").unwrap();
        let h2 = hash_password("same").unwrap();
        assert_ne!(h1, h2); // bcrypt uses random salt
    }

    #[test]
    fn hash_has_expected_length() {
        let h = hash_password("test123").unwrap();
        assert_eq!(h.len(), 60);
    }

    #[test]
    fn verify_error_is_service_error() {
        match verify_password("pw", "bad_hash") {
            Err(AdminError::ServiceError(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            _ => panic!("expected ServiceError"),
        }
    }
}
