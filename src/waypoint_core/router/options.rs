use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::waypoint_core::history::PlatformHistory;
use crate::waypoint_core::location::{ParseQueryFn, QueryCodec, StringifyQueryFn};
use crate::waypoint_core::route::RouteConfig;
use crate::waypoint_core::types::{Query, RouterMode};

/// 可序列化的路由器设置。
///
/// ```json
/// { "mode": "history", "base": "/app/", "fallback": true }
/// ```
///
/// 缺省字段取默认值：hash 模式、根 base、允许降级。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    pub mode: RouterMode,
    pub base: Option<String>,
    /// html5 模式在平台不支持 pushState 时是否降级为 hash 模式。
    pub fallback: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            mode: RouterMode::Hash,
            base: None,
            fallback: true,
        }
    }
}

impl RouterSettings {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// 构造 [`Router`](crate::Router) 的全部输入。
#[derive(Clone, Default)]
pub struct RouterOptions {
    pub routes: Vec<RouteConfig>,
    pub settings: RouterSettings,
    /// 浏览器端口；为 `None` 时无论 `mode` 如何都使用 memory 模式。
    pub platform: Option<Rc<dyn PlatformHistory>>,
    /// 自定义 query 解析，缺省为 [`parse_query`](crate::parse_query)。
    pub parse_query: Option<ParseQueryFn>,
    /// 自定义 query 序列化，结果要带前导 `?`（空 query 为空串）。
    pub stringify_query: Option<StringifyQueryFn>,
}

impl RouterOptions {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            ..Self::default()
        }
    }

    pub fn settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn mode(mut self, mode: RouterMode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.settings.base = Some(base.into());
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.settings.fallback = fallback;
        self
    }

    pub fn platform(mut self, platform: Rc<dyn PlatformHistory>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn parse_query(mut self, parse: impl Fn(&str) -> Query + 'static) -> Self {
        self.parse_query = Some(Rc::new(parse));
        self
    }

    pub fn stringify_query(mut self, stringify: impl Fn(&Query) -> String + 'static) -> Self {
        self.stringify_query = Some(Rc::new(stringify));
        self
    }

    pub(crate) fn query_codec(&self) -> QueryCodec {
        let mut codec = QueryCodec::default();
        if let Some(parse) = self.parse_query.clone() {
            codec = codec.with_parse(move |raw: &str| parse(raw));
        }
        if let Some(stringify) = self.stringify_query.clone() {
            codec = codec.with_stringify(move |query: &Query| stringify(query));
        }
        codec
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("routes", &self.routes.len())
            .field("settings", &self.settings)
            .field("platform", &self.platform.as_ref().map(|p| p.name().to_owned()))
            .field("parse_query", &self.parse_query.is_some())
            .field("stringify_query", &self.stringify_query.is_some())
            .finish()
    }
}
