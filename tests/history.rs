mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::FakeBrowser;
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use waypoint::{guard_fn, Next, RouteConfig, Router, RouterMode, RouterOptions, RouterSettings};

fn routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/"),
        RouteConfig::new("/about"),
        RouteConfig::new("/users/:id").name("user"),
        RouteConfig::new("/old").redirect("/new"),
        RouteConfig::new("/new"),
        RouteConfig::new("/a"),
        RouteConfig::new("/b"),
        RouteConfig::new("/c"),
        RouteConfig::new("/d"),
    ]
}

fn browser_router(browser: &Rc<FakeBrowser>, mode: RouterMode, base: &str) -> Router {
    Router::new(
        RouterOptions::new(routes())
            .mode(mode)
            .base(base)
            .platform(browser.as_platform()),
    )
    .unwrap()
}

//
// ========== html5 ==========
//

#[test]
fn html5_reads_and_writes_paths_under_the_base() {
    let browser = FakeBrowser::at("/app/users/1?tab=repos");
    let router = browser_router(&browser, RouterMode::History, "/app/");
    assert_eq!(router.mode(), RouterMode::History);
    assert_eq!(router.base(), "/app");

    router.init();
    assert_eq!(router.current().full_path, "/users/1?tab=repos");
    assert_eq!(browser.listener_count(), 1);
    assert!(browser.calls().is_empty());

    block_on(router.push("/about")).unwrap();
    assert_eq!(browser.url(), "/app/about");

    block_on(router.replace("/users/2")).unwrap();
    assert_eq!(browser.entries(), ["/app/users/1?tab=repos", "/app/users/2"]);

    router.back();
    assert_eq!(router.current().full_path, "/users/1?tab=repos");
    router.forward();
    assert_eq!(router.current().path, "/users/2");
}

#[test]
fn html5_base_matches_case_insensitively_on_segment_boundaries() {
    let browser = FakeBrowser::at("/APP/about");
    let router = browser_router(&browser, RouterMode::History, "/app");
    router.init();
    assert_eq!(router.current().path, "/about");

    let browser = FakeBrowser::at("/application");
    let router = browser_router(&browser, RouterMode::History, "/app");
    router.init();
    assert_eq!(router.current().path, "/application");
    assert!(!router.current().is_matched());
}

#[test]
fn html5_aborted_popstate_restores_the_url() {
    let browser = FakeBrowser::at("/a");
    let router = browser_router(&browser, RouterMode::History, "/");
    router.init();
    block_on(router.push("/b")).unwrap();

    router.before_each(guard_fn(|to, _, next: Next| {
        if to.path == "/a" {
            next.abort();
        } else {
            next.proceed();
        }
        Ok(())
    }));
    browser.clear_calls();

    router.back();
    assert_eq!(router.current().path, "/b");
    assert_eq!(browser.calls(), ["push /b"]);
    assert_eq!(browser.url(), "/b");
}

#[test]
fn teardown_removes_listeners_and_resets_current() {
    let browser = FakeBrowser::at("/about");
    let router = browser_router(&browser, RouterMode::History, "");
    router.init();
    assert_eq!(browser.listener_count(), 1);

    router.teardown();
    assert_eq!(browser.listener_count(), 0);
    assert!(router.current().is_start());

    router.init();
    assert_eq!(browser.listener_count(), 1);
    assert_eq!(router.current().path, "/about");
}

//
// ========== hash ==========
//

#[test]
fn hash_mode_normalizes_the_fragment_and_pushes_full_urls() {
    let browser = FakeBrowser::at("/app/");
    let router = browser_router(&browser, RouterMode::Hash, "/app");
    assert_eq!(browser.calls(), ["replace /app/#/"]);

    router.init();
    assert_eq!(router.current().path, "/");

    block_on(router.push("/users/3?x=1")).unwrap();
    assert_eq!(browser.url(), "/app/#/users/3?x=1");
    assert_eq!(router.current().params.get("id").map(String::as_str), Some("3"));
}

#[test]
fn hash_mode_follows_external_fragment_changes() {
    let browser = FakeBrowser::at("/#/");
    let router = browser_router(&browser, RouterMode::Hash, "");
    router.init();

    browser.visit("/#/about");
    assert_eq!(router.current().path, "/about");

    // fragments without a leading slash are fixed up before any navigation
    browser.visit("/#b");
    assert_eq!(browser.url(), "/#/b");
    assert_eq!(router.current().path, "/about");
}

#[test]
fn legacy_hash_mode_uses_fragment_assignment() {
    let browser = FakeBrowser::legacy("/#/");
    let router = browser_router(&browser, RouterMode::Hash, "");
    router.init();

    block_on(router.push("/a")).unwrap();
    assert_eq!(browser.calls(), ["assign #/a"]);
    assert_eq!(browser.url(), "/#/a");

    browser.clear_calls();
    browser.visit("/#/b");
    assert_eq!(router.current().path, "/b");
    assert_eq!(browser.calls(), ["location.replace /#/b"]);
}

#[test]
fn history_mode_falls_back_to_hash_without_push_state() {
    let browser = FakeBrowser::legacy("/app/about?x=1");
    let router = browser_router(&browser, RouterMode::History, "/app");
    assert_eq!(router.mode(), RouterMode::Hash);
    assert_eq!(browser.calls(), ["location.replace /app/#/about?x=1"]);

    let browser = FakeBrowser::legacy("/about");
    let router = Router::new(
        RouterOptions::new(routes())
            .settings(
                RouterSettings::from_json(r#"{ "mode": "history", "fallback": false }"#).unwrap(),
            )
            .platform(browser.as_platform()),
    )
    .unwrap();
    assert_eq!(router.mode(), RouterMode::History);
    assert!(browser.calls().is_empty());
}

//
// ========== memory ==========
//

#[test]
fn memory_mode_keeps_an_internal_stack() {
    let router = Router::new(RouterOptions::new(routes()).mode(RouterMode::History)).unwrap();
    assert_eq!(router.mode(), RouterMode::Abstract);

    let commits = Rc::new(Cell::new(0));
    {
        let commits = commits.clone();
        router.after_each(move |_, _| commits.set(commits.get() + 1));
    }

    for path in ["/a", "/b", "/c"] {
        block_on(router.push(path)).unwrap();
    }
    router.go(-2);
    assert_eq!(router.current().path, "/a");
    router.forward();
    assert_eq!(router.current().path, "/b");

    // pushing drops the forward entries
    block_on(router.push("/d")).unwrap();
    router.go(1);
    assert_eq!(router.current().path, "/d");
    router.go(-1);
    assert_eq!(router.current().path, "/b");

    router.go(-10);
    assert_eq!(router.current().path, "/b");
    assert_eq!(commits.get(), 7);
}

#[test]
fn memory_replace_overwrites_the_cursor_entry() {
    let router = Router::new(RouterOptions::new(routes()).mode(RouterMode::Abstract)).unwrap();
    block_on(router.replace("/a")).unwrap();
    block_on(router.push("/b")).unwrap();
    block_on(router.replace("/c")).unwrap();

    router.back();
    assert_eq!(router.current().path, "/a");
    router.forward();
    assert_eq!(router.current().path, "/c");
}

#[test]
fn memory_go_rematches_entries_against_added_routes() {
    let router = Router::new(
        RouterOptions::new(vec![RouteConfig::new("/a"), RouteConfig::new("*").name("fallback")])
            .mode(RouterMode::Abstract),
    )
    .unwrap();
    block_on(router.push("/a")).unwrap();
    block_on(router.push("/b")).unwrap();
    assert_eq!(router.current().name.as_deref(), Some("fallback"));

    router.add_route(RouteConfig::new("/b").name("b")).unwrap();
    assert_eq!(router.current().name.as_deref(), Some("b"));
    block_on(router.push("/c")).unwrap();

    router.go(-1);
    let current = router.current();
    assert_eq!(current.path, "/b");
    assert_eq!(current.name.as_deref(), Some("b"));
    assert_eq!(current.matched.last().map(|record| record.path.as_str()), Some("/b"));
}

//
// ========== href ==========
//

#[test]
fn resolve_builds_hrefs_for_each_mode() {
    let hash = browser_router(&FakeBrowser::at("/app/#/"), RouterMode::Hash, "/app");
    assert_eq!(hash.resolve("/users/7?x=1", None, false).unwrap().href, "/app/#/users/7?x=1");

    let html5 = browser_router(&FakeBrowser::at("/"), RouterMode::History, "");
    let resolved = html5.resolve("/users/7", None, false).unwrap();
    assert_eq!(resolved.href, "/users/7");
    assert_eq!(resolved.location.path.as_deref(), Some("/users/7"));
    assert_eq!(resolved.route.name.as_deref(), Some("user"));

    // redirected routes link to the original location
    let redirected = html5.resolve("/old", None, false).unwrap();
    assert_eq!(redirected.route.path, "/new");
    assert_eq!(redirected.href, "/old");
}

#[test]
fn resolve_appends_relative_paths() {
    let router = Router::new(RouterOptions::new(routes()).mode(RouterMode::Abstract)).unwrap();
    block_on(router.push("/users/1")).unwrap();

    let sibling = router.resolve("2", None, false).unwrap();
    assert_eq!(sibling.route.path, "/users/2");

    let appended = router.resolve("edit", None, true).unwrap();
    assert_eq!(appended.location.path.as_deref(), Some("/users/1/edit"));
}
