//! キャッシュキーの名前空間と構築

/// お知らせキャッシュのプレフィックス
pub const NOTICE_PREFIX: &str = "dao:notice";
/// ユーザーキャッシュのプレフィックス
pub const USER_PREFIX: &str = "dao:user";
/// ドキュメントキャッシュのプレフィックス
pub const DOCUMENTATION_PREFIX: &str = "dao:documentation";
/// ログインログキューのキー
pub const LOGIN_LOG_QUEUE: &str = "log:login";
/// 操作ログキューのキー
pub const OPERATION_LOG_QUEUE: &str = "log:operation";
/// トークンブラックリストのプレフィックス
pub const TOKEN_BLACKLIST_PREFIX: &str = "token:blacklist";
/// 冪等性トークンのプレフィックス
pub const IDEMPOTENCY_PREFIX: &str = "idempotency";
/// 存在フラグとして保存する値
pub const PRESENCE_FLAG: &str = "1";

/// 決定的なキャッシュキーを組み立てる
///
/// `prefix:kind:name=value:...` の形で、値はJSON文字列として埋め込む。
/// フィールドは呼び出し側が固定順で追加し、`None`は省略する。
/// 値をクォートするため、任意の検索文字列を含んでも別のフィルタ組み合わせと衝突しない。
#[derive(Debug, Clone)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// `prefix:kind` から始める
    pub fn new(prefix: &str, kind: &str) -> Self {
        Self {
            key: format!("{}:{}", prefix, kind),
        }
    }

    /// フィールドを追加する
    pub fn field(mut self, name: &str, value: impl std::fmt::Display) -> Self {
        let quoted = serde_json::Value::String(value.to_string()).to_string();
        self.key.push(':');
        self.key.push_str(name);
        self.key.push('=');
        self.key.push_str(&quoted);
        self
    }

    /// 値がある場合だけフィールドを追加する
    pub fn opt_field<T: std::fmt::Display>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    /// 完成したキー
    pub fn build(self) -> String {
        self.key
    }
}

/// `prefix:id:<id>`
pub fn id_key(prefix: &str, id: impl std::fmt::Display) -> String {
    CacheKey::new(prefix, "id").field("id", id).build()
}

/// 名前空間全体を削除するためのプレフィックス（末尾`:`付き）
pub fn namespace(prefix: &str) -> String {
    format!("{}:", prefix)
}
