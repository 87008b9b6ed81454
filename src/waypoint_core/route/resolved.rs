use std::rc::Rc;

use crate::waypoint_core::component::Component;
use crate::waypoint_core::location::{Location, QueryCodec};
use crate::waypoint_core::route::RouteRecord;
use crate::waypoint_core::types::{Meta, Params, Query};

/// 一次匹配得到的不可变路由快照。
///
/// - `matched`：根到叶的记录链，空链表示「没有匹配」；
/// - `redirected_from`：经过重定向时，原始（已规范化）的位置。
///
/// 只有被 transition 确认后才会成为 current。
#[derive(Debug, Clone)]
pub struct Route {
    pub name: Option<String>,
    pub meta: Meta,
    pub path: String,
    /// 含 `#`，没有时为空串。
    pub hash: String,
    pub query: Query,
    pub params: Params,
    /// `path + ?query + hash`。
    pub full_path: String,
    pub matched: Vec<Rc<RouteRecord>>,
    pub redirected_from: Option<Location>,
    start: bool,
}

impl Route {
    /// 路由器的初始路由：path 为 `/`、没有匹配记录。
    ///
    /// 每次调用都得到一个新的起点；判定「是否起点」只看这个标记。
    pub fn start() -> Self {
        let mut route = Self::from_location(&Location::path("/"), Vec::new(), None);
        route.start = true;
        route
    }

    pub(crate) fn from_location(
        location: &Location,
        matched: Vec<Rc<RouteRecord>>,
        redirected_from: Option<&Location>,
    ) -> Self {
        Self::from_location_with(location, matched, redirected_from, &QueryCodec::default())
    }

    /// `full_path` 里的 query 由 `codec` 序列化。
    pub(crate) fn from_location_with(
        location: &Location,
        matched: Vec<Rc<RouteRecord>>,
        redirected_from: Option<&Location>,
        codec: &QueryCodec,
    ) -> Self {
        let leaf = matched.last();
        let path = location
            .path
            .clone()
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| "/".to_owned());
        let query = location.query.clone().unwrap_or_default();
        let hash = location.hash.clone().unwrap_or_default();
        let full_path = format!("{path}{}{hash}", codec.stringify(&query));

        Route {
            name: location.name.clone().or_else(|| leaf.and_then(|r| r.name.clone())),
            meta: leaf.map(|r| r.meta.clone()).unwrap_or_default(),
            path,
            hash,
            query,
            params: location.params.clone().unwrap_or_default(),
            full_path,
            matched,
            redirected_from: redirected_from.cloned(),
            start: false,
        }
    }

    pub fn is_start(&self) -> bool {
        self.start
    }

    /// 是否匹配到了记录。
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// 匹配链上每个记录、每个槽位中已可用的组件（未加载的懒组件不计入）。
    pub fn matched_components(&self) -> Vec<Rc<Component>> {
        self.matched
            .iter()
            .flat_map(|record| {
                record
                    .components()
                    .into_values()
                    .filter_map(|slot| slot.resolved())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// 转换回一个可再次导航的位置。
    pub fn to_location(&self) -> Location {
        Location {
            path: Some(self.path.clone()),
            query: Some(self.query.clone()),
            hash: (!self.hash.is_empty()).then(|| self.hash.clone()),
            ..Location::default()
        }
    }
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}

/// 两个路由是否指向同一位置。
///
/// - `b` 是起点时只有 `a` 也是起点才相同；
/// - 都有 path 时比较去掉末尾 `/` 的 path，`only_path` 为 false 时再比较 hash 和 query；
/// - 都有 name 时比较 name，`only_path` 为 false 时再比较 hash、query 和 params。
pub fn is_same_route(a: &Route, b: &Route, only_path: bool) -> bool {
    if b.start {
        return a.start;
    }
    if !a.path.is_empty() && !b.path.is_empty() {
        strip_trailing_slash(&a.path) == strip_trailing_slash(&b.path)
            && (only_path || (a.hash == b.hash && a.query == b.query))
    } else if let (Some(a_name), Some(b_name)) = (&a.name, &b.name) {
        a_name == b_name
            && (only_path || (a.hash == b.hash && a.query == b.query && a.params == b.params))
    } else {
        false
    }
}

/// `current` 是否「包含」`target`：路径前缀相同、hash 一致（target 有 hash 时），
/// 且 target 的每个 query key 都出现在 current 中。
pub fn is_included_route(current: &Route, target: &Route) -> bool {
    ensure_trailing_slash(&current.path).starts_with(&ensure_trailing_slash(&target.path))
        && (target.hash.is_empty() || current.hash == target.hash)
        && query_includes(&current.query, &target.query)
}

fn query_includes(current: &Query, target: &Query) -> bool {
    target.keys().all(|key| current.contains_key(key))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(location: Location) -> Route {
        Route::from_location(&location, Vec::new(), None)
    }

    fn route(path: &str) -> Route {
        at(Location::path(path))
    }

    #[test]
    fn start_route_is_only_equal_to_a_start_route() {
        let start = Route::start();
        assert_eq!(start.path, "/");
        assert_eq!(start.full_path, "/");
        assert!(is_same_route(&Route::start(), &start, false));
        assert!(!is_same_route(&route("/"), &start, false));
    }

    #[test]
    fn same_route_ignores_trailing_slash() {
        assert!(is_same_route(&route("/a/"), &route("/a"), false));
        let with_hash = at(Location::path("/a").with_hash("#x"));
        assert!(!is_same_route(&with_hash, &route("/a"), false));
        assert!(is_same_route(&with_hash, &route("/a"), true));
    }

    #[test]
    fn included_route_checks_prefix_and_query() {
        let current = at(Location::path("/a/b").with_query("x", "1"));
        assert!(is_included_route(&current, &route("/a")));
        assert!(!is_included_route(&current, &route("/ab")));
        let same_key = at(Location::path("/a").with_query("x", "2"));
        assert!(is_included_route(&current, &same_key));
        let other_key = at(Location::path("/a").with_query("y", "1"));
        assert!(!is_included_route(&current, &other_key));
    }

    #[test]
    fn to_location_round_trips_the_full_path() {
        let original = Route::from_location(
            &Location::path("/a/b").with_query("x", "1").with_hash("#top"),
            Vec::new(),
            None,
        );
        let location = original.to_location();
        assert_eq!(location.name, None);
        assert_eq!(location.full_path(), "/a/b?x=1#top");

        let again = Route::from_location(&location, Vec::new(), None);
        assert!(is_same_route(&original, &again, false));
    }
}
