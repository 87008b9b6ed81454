use std::fmt;
use std::rc::Rc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

use crate::waypoint_core::types::{Query, QueryValue};

/// query 编码集合：与 `encodeURIComponent` 相比额外转义 `!'()*`，保留 `,`。
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// 编码单个 query key / value。
pub fn encode_query_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

/// percent-decode；结果不是合法 UTF-8 时原样返回并告警。
pub fn decode(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            warn!("Error decoding \"{raw}\". Leaving it intact.");
            raw.to_owned()
        }
    }
}

/// 解析 query 字符串。
///
/// 去掉首尾空白和一个前导 `?` / `#` / `&`；`+` 视为空格；
/// 没有 `=` 的 key 得到 `Null`；重复 key 合并成列表。
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['?', '#', '&'])
        .unwrap_or(trimmed);
    if trimmed.is_empty() {
        return query;
    }

    for param in trimmed.split('&') {
        let param = param.replace('+', " ");
        let (key, value) = match param.split_once('=') {
            Some((key, value)) => (decode(key), Some(decode(value))),
            None => (decode(&param), None),
        };
        match query.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                query.insert(key, QueryValue::from(value));
            }
        }
    }
    query
}

/// 合并 path 中的 query 字符串与显式给出的 query 对象，显式对象按 key 覆盖。
pub fn resolve_query(raw: &str, extra: Option<&Query>) -> Query {
    merge_query(parse_query(raw), extra)
}

fn merge_query(mut query: Query, extra: Option<&Query>) -> Query {
    if let Some(extra) = extra {
        for (key, value) in extra {
            query.insert(key.clone(), value.clone());
        }
    }
    query
}

/// 序列化成 `?a=1&b` 形式；空表返回空串。
pub fn stringify_query(query: &Query) -> String {
    let parts: Vec<String> = query
        .iter()
        .filter_map(|(key, value)| {
            let key = encode_query_component(key);
            let part = match value {
                QueryValue::Null => key,
                QueryValue::Value(v) => format!("{key}={}", encode_query_component(v)),
                QueryValue::List(items) => items
                    .iter()
                    .map(|item| match item {
                        Some(v) => format!("{key}={}", encode_query_component(v)),
                        None => key.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("&"),
            };
            (!part.is_empty()).then_some(part)
        })
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

pub type ParseQueryFn = Rc<dyn Fn(&str) -> Query>;
pub type StringifyQueryFn = Rc<dyn Fn(&Query) -> String>;

/// query 的解析 / 序列化实现，可由调用方替换其中任意一半。
///
/// 默认是 [`parse_query`] / [`stringify_query`]。自定义的 `stringify` 需要自己带上前导 `?`。
#[derive(Clone)]
pub struct QueryCodec {
    parse: ParseQueryFn,
    stringify: StringifyQueryFn,
}

impl QueryCodec {
    pub fn with_parse(mut self, parse: impl Fn(&str) -> Query + 'static) -> Self {
        self.parse = Rc::new(parse);
        self
    }

    pub fn with_stringify(mut self, stringify: impl Fn(&Query) -> String + 'static) -> Self {
        self.stringify = Rc::new(stringify);
        self
    }

    pub fn parse(&self, raw: &str) -> Query {
        (self.parse)(raw)
    }

    pub fn stringify(&self, query: &Query) -> String {
        (self.stringify)(query)
    }

    /// 与 [`resolve_query`] 相同，只是用本实例解析。
    pub fn resolve(&self, raw: &str, extra: Option<&Query>) -> Query {
        merge_query(self.parse(raw), extra)
    }
}

impl Default for QueryCodec {
    fn default() -> Self {
        Self {
            parse: Rc::new(parse_query),
            stringify: Rc::new(stringify_query),
        }
    }
}

impl fmt::Debug for QueryCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryCodec")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_query_merges_repeated_keys() {
        let query = parse_query("?a=1&b&a=2&c=x+y&d=%E4%BD%A0");
        assert_eq!(
            query.get("a"),
            Some(&QueryValue::List(vec![Some("1".into()), Some("2".into())]))
        );
        assert_eq!(query.get("b"), Some(&QueryValue::Null));
        assert_eq!(query.get("c"), Some(&QueryValue::from("x y")));
        assert_eq!(query.get("d"), Some(&QueryValue::from("你")));
    }

    #[test]
    fn explicit_query_wins_per_key() {
        let mut extra = Query::new();
        extra.insert("a".into(), QueryValue::from("override"));
        let query = resolve_query("a=1&b=2", Some(&extra));
        assert_eq!(query.get("a"), Some(&QueryValue::from("override")));
        assert_eq!(query.get("b"), Some(&QueryValue::from("2")));
    }

    #[test]
    fn stringify_escapes_reserved_and_keeps_commas() {
        let mut query = Query::new();
        query.insert("q".into(), QueryValue::from("a b(c),d"));
        query.insert("flag".into(), QueryValue::Null);
        assert_eq!(stringify_query(&query), "?flag&q=a%20b%28c%29,d");
        assert_eq!(stringify_query(&Query::new()), "");
    }

    #[test]
    fn decode_leaves_invalid_utf8_intact() {
        assert_eq!(decode("%E4%BD"), "%E4%BD");
        assert_eq!(decode("a%20b"), "a b");
    }
}
