//! クライアント情報の抽出
//!
//! IPv4-mapped IPv6アドレスをIPv4に正規化し、プロキシヘッダーを優先して
//! 接続元IPを決める

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// IPアドレスを正規化する
///
/// IPv4-mapped IPv6（::ffff:x.x.x.x）をIPv4に変換。
/// それ以外はそのまま返す。
pub fn normalize_ip(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                IpAddr::V4(v4)
            } else {
                IpAddr::V6(v6)
            }
        }
        v4 => v4,
    }
}

/// SocketAddrからIPアドレスを抽出し正規化する
pub fn normalize_socket_ip(addr: &SocketAddr) -> IpAddr {
    normalize_ip(addr.ip())
}

/// 接続元IPを決める
///
/// `X-Forwarded-For` の先頭、`X-Real-IP`、ソケットアドレスの順に採用する。
/// どれも無ければ空文字列。
pub fn client_ip(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded.or(real_ip) {
        Some(ip) => match ip.parse::<IpAddr>() {
            Ok(parsed) => normalize_ip(parsed).to_string(),
            Err(_) => ip.to_string(),
        },
        None => peer
            .map(|addr| normalize_socket_ip(addr).to_string())
            .unwrap_or_default(),
    }
}

/// ログに残すクライアント情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// 接続元IP
    pub ip_address: String,
    /// User-Agent
    pub user_agent: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(ClientInfo {
            ip_address: client_ip(&parts.headers, peer.as_ref()),
            user_agent,
        })
    }
}
