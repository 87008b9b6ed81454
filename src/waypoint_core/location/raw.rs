use serde::{Deserialize, Serialize};

use crate::waypoint_core::location::QueryCodec;
use crate::waypoint_core::types::{Params, Query, QueryValue};

/// 导航意图的对象形式。
///
/// 两种互斥的写法：
/// - 路径形式：`path`（可带 `?query#hash`）+ 可选 `query` / `hash`；
/// - 命名形式：`name` + `params`。
///
/// 只给 `params`（没有 path 和 name）时表示「相对当前路由换参数」。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub path: Option<String>,
    pub name: Option<String>,
    pub params: Option<Params>,
    pub query: Option<Query>,
    pub hash: Option<String>,

    /// 重定向守卫返回此位置时，用 replace 而不是 push 发起新导航。
    pub replace: bool,

    /// 相对路径追加到当前路径之后，而不是替换最后一段。
    pub append: bool,

    /// 已经过 [`normalize_location`](crate::normalize_location)，不再重复处理。
    #[serde(skip)]
    pub(crate) normalized: bool,
}

impl Location {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// 只携带参数的相对位置。
    pub fn params(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// `path + ?query + #hash`；没有 path 时按 `/` 处理。
    pub fn full_path(&self) -> String {
        self.full_path_with(&QueryCodec::default())
    }

    pub fn full_path_with(&self, codec: &QueryCodec) -> String {
        let path = self.path.as_deref().unwrap_or("/");
        let query = self.query.as_ref().map(|query| codec.stringify(query)).unwrap_or_default();
        let hash = self.hash.as_deref().unwrap_or_default();
        format!("{path}{query}{hash}")
    }
}

/// 调用方给出的原始导航目标：字符串路径或 [`Location`] 对象。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    Path(String),
    Location(Location),
}

impl RawLocation {
    pub fn is_replace(&self) -> bool {
        matches!(self, RawLocation::Location(location) if location.replace)
    }

    pub(crate) fn is_append(&self) -> bool {
        matches!(self, RawLocation::Location(location) if location.append)
    }
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        RawLocation::Path(path.to_owned())
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        RawLocation::Path(path)
    }
}

impl From<&String> for RawLocation {
    fn from(path: &String) -> Self {
        RawLocation::Path(path.clone())
    }
}

impl From<Location> for RawLocation {
    fn from(location: Location) -> Self {
        RawLocation::Location(location)
    }
}
