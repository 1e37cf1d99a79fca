use super::to_db_time;
use crate::cache::keys::CacheKey;
use crate::types::{Pagination, TimeRange};

/// LIKEパターン中の`\`・`%`・`_`をエスケープする
///
/// 呼び出し側は`ESCAPE '\'`と組み合わせて使う。正規表現としては一切解釈されないため、
/// `a.*b` のような入力はそのままの部分文字列として一致する。
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// 検索用の小文字化（Unicodeの大文字小文字変換）
///
/// 検索対象の`*_folded`列への書き込みと検索語の両方で使う。
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// WHERE句・バインド値・キャッシュキーを同じ順序で組み立てる
///
/// フィールドは呼び出し側が固定順で追加する。`None`の条件はSQLにもキーにも現れない。
#[derive(Debug)]
pub(crate) struct QueryFilter {
    conditions: Vec<String>,
    bind_values: Vec<String>,
    key: CacheKey,
}

impl QueryFilter {
    pub(crate) fn new(prefix: &str, kind: &str) -> Self {
        Self {
            conditions: Vec::new(),
            bind_values: Vec::new(),
            key: CacheKey::new(prefix, kind),
        }
    }

    /// バインド値を持たない固定条件
    pub(crate) fn fixed(mut self, condition: &str) -> Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// 完全一致
    pub(crate) fn eq(mut self, column: &str, value: Option<impl std::fmt::Display>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            self.conditions.push(format!("{} = ?", column));
            self.key = self.key.field(column, &value);
            self.bind_values.push(value);
        }
        self
    }

    /// 両端を含む時間範囲
    pub(crate) fn range(mut self, column: &str, range: &TimeRange) -> Self {
        if let Some(start) = range.start {
            let value = to_db_time(&start);
            self.conditions.push(format!("{} >= ?", column));
            self.key = self.key.field(&format!("{}_from", column), &value);
            self.bind_values.push(value);
        }
        if let Some(end) = range.end {
            let value = to_db_time(&end);
            self.conditions.push(format!("{} <= ?", column));
            self.key = self.key.field(&format!("{}_to", column), &value);
            self.bind_values.push(value);
        }
        self
    }

    /// いずれかの列への部分一致（大文字小文字を区別しない）
    ///
    /// `columns`には`fold_case`で小文字化済みの値を持つ列を渡す。検索語も同じ規則で
    /// 小文字化するため、ASCII以外（`ÉCOLE`と`école`など）も一致する。
    pub(crate) fn contains_any(mut self, columns: &[&str], query: Option<&str>) -> Self {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return self;
        };
        let folded = fold_case(query);
        let pattern = escape_like_pattern(&folded);
        let ors: Vec<String> = columns
            .iter()
            .map(|column| format!("{} LIKE ? ESCAPE '\\'", column))
            .collect();
        self.conditions.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.bind_values.push(pattern.clone());
        }
        self.key = self.key.field("query", &folded);
        self
    }

    /// ページングをキーに含めた完成形のキャッシュキー
    pub(crate) fn list_key(&self, pagination: &Pagination) -> String {
        self.key
            .clone()
            .field("page", pagination.page)
            .field("size", pagination.page_size)
            .field("desc", pagination.desc)
            .build()
    }

    pub(crate) fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn bind_values(&self) -> &[String] {
        &self.bind_values
    }
}

/// `ORDER BY` 句
pub(crate) fn order_clause(pagination: &Pagination, column: &str, tiebreak: &str) -> String {
    let direction = if pagination.desc { "DESC" } else { "ASC" };
    format!("ORDER BY {} {}, {} {}", column, direction, tiebreak, direction)
}
