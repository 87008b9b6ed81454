use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 路由记录在路由表 arena 中的内部标识。
///
/// 由 [`RouteTable`](crate::RouteTable) 按创建顺序分配，下标即 arena 位置；
/// 父子关系只保存向上的 `parent: Option<RecordId>`，不形成所有权环。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

impl RecordId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// 路径参数：`":id" -> "42"`。
///
/// 使用 BTreeMap 保证遍历顺序稳定（fullPath、调试输出、测试断言都依赖它）。
pub type Params = BTreeMap<String, String>;

/// 解析后的 query 参数表。
pub type Query = BTreeMap<String, QueryValue>;

/// 路由元信息：任意 JSON 对象，核心不解释其内容。
pub type Meta = serde_json::Map<String, Value>;

/// 默认视图槽位名。
pub const DEFAULT_VIEW: &str = "default";

/// 单个 query 参数的值。
///
/// - `?flag`        -> `Null`
/// - `?a=1`         -> `Value("1")`
/// - `?a=1&a=2&a`   -> `List([Some("1"), Some("2"), None])`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Null,
    Value(String),
    List(Vec<Option<String>>),
}

impl QueryValue {
    /// 取单值；列表时返回第一个非空元素。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Null => None,
            QueryValue::Value(v) => Some(v),
            QueryValue::List(items) => items.iter().flatten().next().map(String::as_str),
        }
    }

    /// 同名 key 再次出现时合并成列表。
    pub(crate) fn push(&mut self, value: Option<String>) {
        let previous = std::mem::replace(self, QueryValue::Null);
        *self = match previous {
            QueryValue::Null => QueryValue::List(vec![None, value]),
            QueryValue::Value(v) => QueryValue::List(vec![Some(v), value]),
            QueryValue::List(mut items) => {
                items.push(value);
                QueryValue::List(items)
            }
        };
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Value(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Value(value)
    }
}

impl From<Option<String>> for QueryValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(QueryValue::Null, QueryValue::Value)
    }
}

impl<T: Into<String>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(|v| Some(v.into())).collect())
    }
}

/// 页面由谁承载：三种 history 持久化策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    /// URL fragment（`#/path`）。
    #[default]
    Hash,
    /// 原生 history API（pushState / replaceState）。
    History,
    /// 纯内存栈，没有平台 URL。
    Abstract,
}
