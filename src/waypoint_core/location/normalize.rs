use tracing::warn;

use crate::waypoint_core::error::MatchError;
use crate::waypoint_core::location::{parse_path, resolve_path, Location, QueryCodec, RawLocation};
use crate::waypoint_core::route::Route;
use crate::waypoint_core::types::Params;

/// 把原始导航目标规范化成 [`Location`]。
///
/// 处理顺序：
/// 1. 已规范化的对象原样返回；
/// 2. 命名目标：复制后返回，交给 matcher 按名字查找；
/// 3. 只有 params 的相对目标：沿用当前路由的 name，或者用当前叶子记录的路径模板填参；
/// 4. 路径目标：拆出 query / hash，相对当前路径解析成绝对路径，
///    路径里的 query 与显式 query 合并（显式优先）。
///
/// 第 3 步没有可用的当前路由时只告警，返回一个既无 path 也无 name 的位置。
pub fn normalize_location(
    raw: &RawLocation,
    current: Option<&Route>,
    append: bool,
) -> Result<Location, MatchError> {
    normalize_location_with(raw, current, append, &QueryCodec::default())
}

/// 用 `codec` 解析路径里的 query 的 [`normalize_location`]。
pub fn normalize_location_with(
    raw: &RawLocation,
    current: Option<&Route>,
    append: bool,
    codec: &QueryCodec,
) -> Result<Location, MatchError> {
    let next = match raw {
        RawLocation::Path(path) => Location::path(path.clone()),
        RawLocation::Location(location) => location.clone(),
    };

    if next.normalized || next.name.is_some() {
        return Ok(next);
    }

    if next.path.is_none() {
        if let (Some(params), Some(current)) = (&next.params, current) {
            return normalize_relative_params(next.clone(), params, current);
        }
    }

    let parsed = parse_path(next.path.as_deref().unwrap_or_default());
    let base = current.map_or("/", |route| route.path.as_str());
    let path = if parsed.path.is_empty() {
        base.to_owned()
    } else {
        resolve_path(&parsed.path, base, append || next.append)
    };
    let query = codec.resolve(&parsed.query, next.query.as_ref());

    let hash = next
        .hash
        .as_deref()
        .filter(|hash| !hash.is_empty())
        .unwrap_or(&parsed.hash);
    let hash = match hash {
        "" => None,
        h if h.starts_with('#') => Some(h.to_owned()),
        h => Some(format!("#{h}")),
    };

    Ok(Location {
        path: Some(path),
        query: Some(query),
        hash,
        replace: next.replace,
        append: next.append,
        normalized: true,
        ..Location::default()
    })
}

fn normalize_relative_params(
    mut next: Location,
    params: &Params,
    current: &Route,
) -> Result<Location, MatchError> {
    let mut merged = current.params.clone();
    merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    next.normalized = true;

    if let Some(name) = &current.name {
        next.name = Some(name.clone());
        next.params = Some(merged);
    } else if let Some(leaf) = current.matched.last() {
        let context = format!("path {}", current.path);
        next.path = Some(leaf.pattern.fill(&merged, &context)?);
    } else {
        warn!("relative params navigation requires a current route.");
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::waypoint_core::types::QueryValue;

    #[test]
    fn path_target_is_resolved_against_current() {
        let current = Route::start();
        let raw = RawLocation::from("child?x=1#anchor");
        let location = normalize_location(&raw, Some(&current), false).unwrap();
        assert_eq!(location.path.as_deref(), Some("/child"));
        assert_eq!(location.hash.as_deref(), Some("#anchor"));
        assert_eq!(
            location.query.unwrap().get("x"),
            Some(&QueryValue::from("1"))
        );
        assert!(location.normalized);
    }

    #[test]
    fn explicit_hash_gets_prefixed() {
        let raw = RawLocation::from(Location::path("/a").with_hash("top"));
        let location = normalize_location(&raw, None, false).unwrap();
        assert_eq!(location.hash.as_deref(), Some("#top"));
    }

    #[test]
    fn named_target_passes_through() {
        let raw = RawLocation::from(Location::named("user").with_param("id", "1"));
        let location = normalize_location(&raw, None, false).unwrap();
        assert_eq!(location.name.as_deref(), Some("user"));
        assert_eq!(location.path, None);
        assert!(!location.normalized);
    }

    #[test]
    fn normalized_location_is_not_processed_again() {
        let raw = RawLocation::from("/a?x=1");
        let once = normalize_location(&raw, None, false).unwrap();
        let twice = normalize_location(&RawLocation::from(once.clone()), None, false).unwrap();
        assert_eq!(once, twice);
    }
}
