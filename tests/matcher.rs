use pretty_assertions::assert_eq;
use serde_json::json;
use waypoint::{
    Component, Location, Matcher, PropsConfig, Query, QueryValue, RawLocation, Route, RouteConfig,
    Router, RouterMode, RouterOptions, DEFAULT_VIEW,
};

fn matcher(routes: Vec<RouteConfig>) -> Matcher {
    Matcher::new(&routes).unwrap()
}

fn at(matcher: &Matcher, raw: impl Into<RawLocation>) -> Route {
    matcher.match_location(&raw.into(), None, None).unwrap()
}

#[test]
fn user_route_by_name_and_by_path() {
    let matcher = matcher(vec![RouteConfig::new("/user/:id").name("user")]);

    let named = at(&matcher, Location::named("user").with_param("id", "42"));
    assert_eq!(named.path, "/user/42");

    let by_path = at(&matcher, "/user/42");
    assert_eq!(by_path.params.get("id").map(String::as_str), Some("42"));
}

#[test]
fn redirect_tags_the_original_location() {
    let matcher = matcher(vec![RouteConfig::new("/a").redirect("/b"), RouteConfig::new("/b")]);
    let route = at(&matcher, "/a");
    assert_eq!(route.path, "/b");
    assert_eq!(
        route.redirected_from.and_then(|from| from.path),
        Some("/a".to_owned())
    );
}

#[test]
fn earlier_records_win_over_later_overlaps() {
    let matcher = matcher(vec![
        RouteConfig::new("/users/:id").name("by-id"),
        RouteConfig::new("/users/new").name("new-user"),
    ]);
    let route = at(&matcher, "/users/new");
    assert_eq!(route.name.as_deref(), Some("by-id"));
    assert_eq!(route.params.get("id").map(String::as_str), Some("new"));
}

#[test]
fn catch_all_segments_fill_path_match() {
    let matcher = matcher(vec![
        RouteConfig::new("*").name("not-found"),
        RouteConfig::new("/files/*").name("files"),
    ]);

    let files = at(&matcher, "/files/docs/readme.md");
    assert_eq!(files.name.as_deref(), Some("files"));
    assert_eq!(files.params.get("pathMatch").map(String::as_str), Some("docs/readme.md"));

    let missing = at(&matcher, "/nowhere");
    assert_eq!(missing.name.as_deref(), Some("not-found"));
    assert_eq!(missing.params.get("pathMatch").map(String::as_str), Some("/nowhere"));
}

#[test]
fn captured_params_are_percent_decoded() {
    let matcher = matcher(vec![RouteConfig::new("/tags/:tag")]);
    let decoded = at(&matcher, "/tags/caf%C3%A9");
    assert_eq!(decoded.params.get("tag").map(String::as_str), Some("café"));

    let broken = at(&matcher, "/tags/%E0%A4");
    assert_eq!(broken.params.get("tag").map(String::as_str), Some("%E0%A4"));
}

#[test]
fn case_and_trailing_slash_options() {
    let loose = matcher(vec![RouteConfig::new("/about")]);
    assert!(at(&loose, "/ABOUT").is_matched());
    assert!(at(&loose, "/about/").is_matched());

    let exact = matcher(vec![RouteConfig::new("/about").case_sensitive(true).strict(true)]);
    assert!(!at(&exact, "/ABOUT").is_matched());
    assert!(!at(&exact, "/about/").is_matched());
}

#[test]
fn explicit_query_overrides_the_path_query() {
    let matcher = matcher(vec![RouteConfig::new("/search")]);
    let route = at(
        &matcher,
        Location::path("/search?q=old&page=2").with_query("q", "new"),
    );
    assert_eq!(route.query.get("q"), Some(&QueryValue::from("new")));
    assert_eq!(route.query.get("page"), Some(&QueryValue::from("2")));
    assert_eq!(route.full_path, "/search?page=2&q=new");
}

#[test]
fn props_are_resolved_per_slot() {
    let matcher = matcher(vec![RouteConfig::new("/user/:id")
        .component(Component::new("User"))
        .props(PropsConfig::Flag(true))]);
    let route = at(&matcher, "/user/9");
    let record = &route.matched[0];
    assert_eq!(record.resolve_props(DEFAULT_VIEW, &route), Some(json!({ "id": "9" })));
    assert_eq!(record.resolve_props("aside", &route), None);
}

#[test]
fn wildcards_stay_last_when_routes_are_added() {
    let router = Router::new(
        RouterOptions::new(vec![RouteConfig::new("*").name("fallback"), RouteConfig::new("/a")])
            .mode(RouterMode::Abstract),
    )
    .unwrap();
    router.add_route(RouteConfig::new("/late")).unwrap();

    let order: Vec<_> = router.get_routes().iter().map(|record| record.path.clone()).collect();
    assert_eq!(order, ["/a", "/late", "*"]);

    let route = router.match_route(&"/late".into(), None).unwrap();
    assert_eq!(route.path, "/late");
    assert!(route.name.is_none());
}

#[test]
fn custom_query_codec_drives_parsing_and_full_paths() {
    let router = Router::new(
        RouterOptions::new(vec![
            RouteConfig::new("/search"),
            RouteConfig::new("/old").redirect("/search"),
        ])
        .mode(RouterMode::Abstract)
        .parse_query(|raw: &str| {
            raw.trim_start_matches('?')
                .split(';')
                .filter_map(|pair| pair.split_once(':'))
                .map(|(key, value)| (key.to_owned(), QueryValue::from(value)))
                .collect()
        })
        .stringify_query(|query: &Query| {
            if query.is_empty() {
                return String::new();
            }
            let pairs: Vec<String> = query
                .iter()
                .map(|(key, value)| format!("{key}:{}", value.as_str().unwrap_or_default()))
                .collect();
            format!("?{}", pairs.join(";"))
        }),
    )
    .unwrap();

    let route = router.match_route(&"/search?q:rust;page:2".into(), None).unwrap();
    assert_eq!(route.query.get("q"), Some(&QueryValue::from("rust")));
    assert_eq!(route.full_path, "/search?page:2;q:rust");

    let resolved = router.resolve("/old?x:1", None, false).unwrap();
    assert_eq!(resolved.route.full_path, "/search?x:1");
    assert_eq!(resolved.href, "/old?x:1");
}
