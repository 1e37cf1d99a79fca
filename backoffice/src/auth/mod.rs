// 認証モジュール

/// パスワードハッシュ化・検証（bcrypt）
pub mod password;

/// アクセス／リフレッシュトークンの発行・検証（ES256）
pub mod jwt;

/// ログアウト済みトークンのブラックリスト
pub mod revocation;

/// 認証ミドルウェア（Bearerトークン、管理者ロール）
pub mod middleware;

/// 初回起動時の管理者アカウント作成
pub mod bootstrap;

/// ランダムトークン生成
pub fn generate_random_token(length: usize) -> String {
    use rand::RngExt;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
