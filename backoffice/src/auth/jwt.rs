//! アクセス／リフレッシュトークンの発行・検証と署名鍵ローテーション
//!
//! ES256（P-256）で署名する。鍵ペアと寿命設定はそれぞれ`ArcSwap`で保持し、
//! 検証・発行は常に古い鍵か新しい鍵のどちらか一方を一貫して参照する。

use crate::common::error::{AdminError, AdminResult};
use crate::config::JwtConfig;
use arc_swap::ArcSwap;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use p256::ecdsa::SigningKey;
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// トークン用途（`aud`クレーム）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// アクセストークン
    Access,
    /// リフレッシュトークン
    Refresh,
}

impl Audience {
    /// `aud`クレームの値
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// トークンのクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 主体（ユーザーID）
    pub sub: String,
    /// 用途（`access` / `refresh`）
    pub aud: String,
    /// 発行時刻（UNIX秒）
    pub iat: u64,
    /// 有効開始時刻（UNIX秒）
    pub nbf: u64,
    /// 有効期限（UNIX秒）
    pub exp: u64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn generate() -> AdminResult<Self> {
        let signing_key = SigningKey::random(&mut p256::elliptic_curve::rand_core::OsRng);
        let private_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AdminError::ServiceError(format!("Failed to encode signing key: {}", e)))?;
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AdminError::ServiceError(format!("Failed to encode verifying key: {}", e)))?;

        let encoding = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| AdminError::ServiceError(format!("Failed to load signing key: {}", e)))?;
        let decoding = DecodingKey::from_ec_pem(public_pem.as_bytes())
            .map_err(|e| AdminError::ServiceError(format!("Failed to load verifying key: {}", e)))?;

        Ok(Self { encoding, decoding })
    }
}

/// 寿命設定を検証する
///
/// 両寿命は0より大きく、access ≤ refresh、buffer ≤ access かつ buffer ≤ refresh。
/// バッファは0でもよい。
pub fn validate_lifetimes(config: &JwtConfig) -> AdminResult<()> {
    let JwtConfig {
        access_token_lifetime: access,
        refresh_token_lifetime: refresh,
        refresh_buffer: buffer,
    } = *config;

    if access.is_zero() || refresh.is_zero() {
        return Err(AdminError::InvalidConfiguration(
            "token lifetimes must be greater than zero".to_string(),
        ));
    }
    if access > refresh {
        return Err(AdminError::InvalidConfiguration(format!(
            "access token lifetime ({}s) exceeds refresh token lifetime ({}s)",
            access.as_secs(),
            refresh.as_secs()
        )));
    }
    if buffer > access || buffer > refresh {
        return Err(AdminError::InvalidConfiguration(format!(
            "refresh buffer ({}s) exceeds a token lifetime",
            buffer.as_secs()
        )));
    }
    Ok(())
}

/// トークンマネージャー
///
/// ストレージには一切触れない。
pub struct TokenManager {
    keys: ArcSwap<SigningKeys>,
    lifetimes: ArcSwap<JwtConfig>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("lifetimes", &**self.lifetimes.load())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// 新しい鍵ペアを生成して構築する
    ///
    /// 寿命設定が不正なら`InvalidConfiguration`で失敗する。
    pub fn new(config: &JwtConfig) -> AdminResult<Self> {
        validate_lifetimes(config)?;
        Ok(Self {
            keys: ArcSwap::from_pointee(SigningKeys::generate()?),
            lifetimes: ArcSwap::from_pointee(*config),
        })
    }

    /// 現在の寿命設定
    pub fn lifetimes(&self) -> JwtConfig {
        **self.lifetimes.load()
    }

    /// 寿命設定を入れ替える（検証に失敗した場合は何も変えない）
    pub fn reconfigure(&self, config: &JwtConfig) -> AdminResult<()> {
        validate_lifetimes(config)?;
        self.lifetimes.store(Arc::new(*config));
        tracing::info!(
            access_secs = config.access_token_lifetime.as_secs(),
            refresh_secs = config.refresh_token_lifetime.as_secs(),
            "Token lifetimes reconfigured"
        );
        Ok(())
    }

    /// 署名鍵ペアを原子的に入れ替える
    ///
    /// 旧鍵で署名された未失効トークンは以後検証できなくなる。
    pub fn rotate_signing_key(&self) -> AdminResult<()> {
        let keys = SigningKeys::generate()?;
        self.keys.store(Arc::new(keys));
        tracing::info!("Signing key rotated");
        Ok(())
    }

    /// アクセストークンを発行
    pub fn issue_access_token(&self, subject: &str) -> AdminResult<String> {
        let lifetime = self.lifetimes.load().access_token_lifetime;
        self.issue(subject, Audience::Access, lifetime)
    }

    /// リフレッシュトークンを発行
    pub fn issue_refresh_token(&self, subject: &str) -> AdminResult<String> {
        let lifetime = self.lifetimes.load().refresh_token_lifetime;
        self.issue(subject, Audience::Refresh, lifetime)
    }

    fn issue(&self, subject: &str, audience: Audience, lifetime: Duration) -> AdminResult<String> {
        if subject.is_empty() {
            return Err(AdminError::InvalidSubject(
                "token subject must not be empty".to_string(),
            ));
        }

        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: subject.to_string(),
            aud: audience.as_str().to_string(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(lifetime.as_secs()),
        };

        let keys = self.keys.load();
        encode(&Header::new(Algorithm::ES256), &claims, &keys.encoding)
            .map_err(|e| AdminError::ServiceError(format!("Failed to sign token: {}", e)))
    }

    /// 署名と時刻クレームを検証し、クレームを返す
    ///
    /// 期限切れは`TokenExpired`、それ以外の失敗は`TokenInvalid`。
    pub fn verify_signature(&self, token: &str) -> AdminResult<Claims> {
        let mut validation = Validation::new(Algorithm::ES256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        // 用途は呼び出し側で判定する
        validation.validate_aud = false;

        let keys = self.keys.load();
        decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AdminError::TokenExpired("token has expired".to_string())
                }
                _ => AdminError::TokenInvalid(format!("Failed to verify token: {}", e)),
            })
    }

    /// アクセストークンを検証して主体を返す
    pub fn verify_access_token(&self, token: &str) -> AdminResult<String> {
        self.verify_for(token, Audience::Access)
    }

    /// リフレッシュトークンを検証して主体を返す
    pub fn verify_refresh_token(&self, token: &str) -> AdminResult<String> {
        self.verify_for(token, Audience::Refresh)
    }

    fn verify_for(&self, token: &str, audience: Audience) -> AdminResult<String> {
        let claims = self.verify_signature(token)?;
        if claims.aud != audience.as_str() {
            return Err(AdminError::TokenInvalid(format!(
                "audience mismatch: expected {}, got {}",
                audience.as_str(),
                claims.aud
            )));
        }
        Ok(claims.sub)
    }
}
