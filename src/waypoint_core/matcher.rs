use std::rc::Rc;

use tracing::{trace, warn};

use crate::waypoint_core::error::{ConfigError, GuardError, MatchError};
use crate::waypoint_core::location::{
    normalize_location_with, parse_path, resolve_path, Location, QueryCodec, RawLocation,
};
use crate::waypoint_core::route::{
    fill_params, Redirect, Route, RouteConfig, RouteRecord, RouteTable,
};

/// 单次匹配允许的最大重定向深度，用于截断 `a -> b -> a` 这样的环。
pub const MAX_REDIRECT_DEPTH: usize = 16;

/// Matcher：把导航意图解析成 [`Route`]。
///
/// 查找顺序：
/// 1. 规范化位置；
/// 2. 命名目标按 name 查找，缺失的必填参数从当前路由继承，再填充路径模板；
/// 3. 路径目标按 path 列表的优先级逐个匹配，取第一个；
/// 4. 命中记录带 `redirect` 时递归匹配重定向目标；
/// 5. 命中别名记录时匹配别名目标，用别名自己的祖先链和目标的参数构造结果。
///
/// 找不到时返回 `matched` 为空的路由，不报错。
#[derive(Debug, Clone)]
pub struct Matcher {
    table: RouteTable,
    query: QueryCodec,
}

impl Matcher {
    pub fn new(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        Ok(Self {
            table: RouteTable::new(routes)?,
            query: QueryCodec::default(),
        })
    }

    /// 替换 query 的解析 / 序列化实现。
    pub fn with_query_codec(mut self, codec: QueryCodec) -> Self {
        self.query = codec;
        self
    }

    pub fn query_codec(&self) -> &QueryCodec {
        &self.query
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn add_routes(&mut self, routes: &[RouteConfig]) -> Result<(), ConfigError> {
        self.table.compile(routes, None)
    }

    pub fn add_route(
        &mut self,
        parent_name: Option<&str>,
        route: RouteConfig,
    ) -> Result<(), ConfigError> {
        self.table.add_route(parent_name, route)
    }

    pub fn get_routes(&self) -> Vec<Rc<RouteRecord>> {
        self.table.records()
    }

    pub fn match_location(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Result<Route, MatchError> {
        self.match_at_depth(raw, current, redirected_from, 0)
    }

    fn match_at_depth(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let mut location = normalize_location_with(raw, current, raw.is_append(), &self.query)?;

        if let Some(name) = location.name.clone() {
            let Some(record) = self.table.by_name(&name) else {
                warn!("Route with name '{name}' does not exist");
                return Ok(self.build(&location, Vec::new(), None));
            };

            let mut params = location.params.take().unwrap_or_default();
            if let Some(current) = current {
                for key in record.pattern.keys().iter().filter(|key| !key.optional) {
                    let key_name = key.name.param_name();
                    if params.contains_key(&key_name) {
                        continue;
                    }
                    if let Some(value) = current.params.get(&key_name) {
                        params.insert(key_name, value.clone());
                    }
                }
            }
            location.path = Some(record.pattern.fill(&params, &format!("named route \"{name}\""))?);
            location.params = Some(params);
            return self.create_route(Some(record), location, redirected_from, depth);
        }

        if let Some(path) = location.path.clone() {
            for record in self.table.records() {
                if let Some(params) = record.pattern.captures(&path) {
                    trace!(path = %path, record = %record.path, "path matched");
                    location.params = Some(params);
                    return self.create_route(Some(record), location, redirected_from, depth);
                }
            }
        }

        Ok(self.build(&location, Vec::new(), None))
    }

    fn build(
        &self,
        location: &Location,
        matched: Vec<Rc<RouteRecord>>,
        redirected_from: Option<&Location>,
    ) -> Route {
        Route::from_location_with(location, matched, redirected_from, &self.query)
    }

    fn create_route(
        &self,
        record: Option<Rc<RouteRecord>>,
        location: Location,
        redirected_from: Option<&Location>,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let Some(record) = record else {
            return Ok(self.build(&location, Vec::new(), None));
        };
        if let Some(redirect) = &record.redirect {
            let original = redirected_from.cloned().unwrap_or(location);
            return self.redirect(&record, redirect, original, depth);
        }
        if let Some(match_as) = &record.match_as {
            return self.alias(&record, location, match_as, depth);
        }
        Ok(self.build(
            &location,
            self.table.matched_chain(&record),
            redirected_from,
        ))
    }

    fn redirect(
        &self,
        record: &Rc<RouteRecord>,
        redirect: &Redirect,
        location: Location,
        depth: usize,
    ) -> Result<Route, MatchError> {
        if depth >= MAX_REDIRECT_DEPTH {
            return Err(MatchError::RedirectLimit {
                path: location.full_path_with(&self.query),
            });
        }

        let target = match redirect {
            Redirect::Path(path) => RawLocation::Path(path.clone()),
            Redirect::Location(target) => RawLocation::Location(target.clone()),
            Redirect::Dynamic(f) => {
                let would_be = self.build(&location, self.table.matched_chain(record), None);
                f(&would_be).map_err(|error| MatchError::Redirect(GuardError::from(error)))?
            }
        };
        let target = match target {
            RawLocation::Path(path) => location_from_redirect_path(&path, &self.query),
            RawLocation::Location(target) => target,
        };

        let query = target.query.clone().or_else(|| location.query.clone());
        let hash = target
            .hash
            .clone()
            .or_else(|| location.hash.clone())
            .map(|hash| {
                if hash.is_empty() || hash.starts_with('#') {
                    hash
                } else {
                    format!("#{hash}")
                }
            });
        let params = target.params.clone().or_else(|| location.params.clone());

        if let Some(name) = target.name {
            if self.table.by_name(&name).is_none() {
                warn!("redirect failed: named route \"{name}\" not found.");
                return Ok(self.build(&location, Vec::new(), None));
            }
            let next = Location {
                name: Some(name),
                query,
                hash,
                params,
                normalized: true,
                ..Location::default()
            };
            return self.match_at_depth(&next.into(), None, Some(&location), depth + 1);
        }

        if let Some(path) = target.path.filter(|path| !path.is_empty()) {
            let parent_path = record
                .parent
                .and_then(|id| self.table.get(id))
                .map_or_else(|| "/".to_owned(), |parent| parent.path.clone());
            let raw_path = resolve_path(&path, &parent_path, true);
            let resolved = fill_params(
                &raw_path,
                &params.unwrap_or_default(),
                &format!("redirect route with path \"{raw_path}\""),
            )?;
            let next = Location {
                path: Some(resolved),
                query,
                hash,
                normalized: true,
                ..Location::default()
            };
            return self.match_at_depth(&next.into(), None, Some(&location), depth + 1);
        }

        warn!("invalid redirect option: {redirect:?}");
        Ok(self.build(&location, Vec::new(), None))
    }

    fn alias(
        &self,
        record: &Rc<RouteRecord>,
        mut location: Location,
        match_as: &str,
        depth: usize,
    ) -> Result<Route, MatchError> {
        let params = location.params.clone().unwrap_or_default();
        let context = format!("aliased route with path \"{match_as}\"");
        let aliased_path = fill_params(match_as, &params, &context)?;
        let target = Location {
            path: Some(aliased_path),
            normalized: true,
            ..Location::default()
        };
        let aliased = self.match_at_depth(&target.into(), None, None, depth + 1)?;

        if !aliased.is_matched() {
            return Ok(self.build(&location, Vec::new(), None));
        }
        if aliased.redirected_from.is_some() {
            return Ok(aliased);
        }

        location.params = Some(aliased.params);
        if location.name.is_none() {
            location.name = aliased.name;
        }
        Ok(self.build(&location, self.table.matched_chain(record), None))
    }
}

/// 字符串重定向目标可以带 `?query` / `#hash`，它们覆盖原位置上的同名部分。
fn location_from_redirect_path(raw: &str, codec: &QueryCodec) -> Location {
    let parsed = parse_path(raw);
    Location {
        path: Some(parsed.path),
        query: (!parsed.query.is_empty()).then(|| codec.parse(&parsed.query)),
        hash: (!parsed.hash.is_empty()).then_some(parsed.hash),
        ..Location::default()
    }
}
