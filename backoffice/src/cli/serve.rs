//! serve サブコマンド
//!
//! 環境変数から読んだ設定を、指定された引数で上書きします。

use crate::config::AppConfig;
use clap::Args;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Database URL
    #[arg(long)]
    pub database_url: Option<String>,

    /// Redis URL
    #[arg(long)]
    pub redis_url: Option<String>,
}

impl ServeArgs {
    /// 指定された項目だけ設定を上書きする
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(url) = &self.redis_url {
            config.cache.redis_url = Some(url.clone());
        }
    }
}
