use std::rc::Rc;

use tracing::{debug, info};

use crate::waypoint_core::history::{
    location_of, normalize_base, CommitAction, HistoryMode, PlatformEvent, PlatformHistory,
    Subscription,
};
use crate::waypoint_core::location::{clean_path, RawLocation};
use crate::waypoint_core::route::Route;
use crate::waypoint_core::router::RouterShared;
use crate::waypoint_core::transition::{transition_to, CompleteFn};
use crate::waypoint_core::types::RouterMode;

/// hash 模式：路由路径放在 URL fragment 里（`/base/#/path`）。
///
/// 平台支持 pushState 时用 pushState 写入完整 URL，否则直接改 `location.hash`。
pub(crate) struct HashMode {
    platform: Rc<dyn PlatformHistory>,
    base: String,
}

impl HashMode {
    /// `fallback` 为 true 表示由 html5 模式降级而来：
    /// 当前 URL 还是 path 形式时先整体替换成 hash 形式。
    pub(crate) fn new(
        platform: Rc<dyn PlatformHistory>,
        base: Option<&str>,
        fallback: bool,
    ) -> Self {
        let mode = Self {
            platform,
            base: normalize_base(base),
        };
        if fallback && mode.check_fallback() {
            return mode;
        }
        ensure_slash(&*mode.platform);
        mode
    }

    fn check_fallback(&self) -> bool {
        let location = location_of(&*self.platform, &self.base);
        if location.starts_with("/#") {
            return false;
        }
        let target = clean_path(&format!("{}/#{}", self.base, location));
        info!(%target, "history mode unsupported, falling back to hash URL");
        self.platform.location_replace(&target);
        true
    }
}

/// fragment 内容（不含 `#`）。直接从 href 截取，避免平台对 hash 做解码。
fn hash_of(platform: &dyn PlatformHistory) -> String {
    let href = platform.href();
    match href.split_once('#') {
        Some((_, hash)) => hash.to_owned(),
        None => String::new(),
    }
}

/// 当前 URL 去掉 fragment 后拼上 `#path`。
fn url_with_hash(platform: &dyn PlatformHistory, path: &str) -> String {
    let href = platform.href();
    let before = href.split_once('#').map_or(href.as_str(), |(before, _)| before);
    format!("{before}#{path}")
}

fn push_hash(platform: &dyn PlatformHistory, path: &str) {
    if platform.supports_push_state() {
        platform.push_state(&url_with_hash(platform, path));
    } else {
        platform.assign_hash(path);
    }
}

fn replace_hash(platform: &dyn PlatformHistory, path: &str) {
    let url = url_with_hash(platform, path);
    if platform.supports_push_state() {
        platform.replace_state(&url);
    } else {
        platform.location_replace(&url);
    }
}

/// fragment 必须以 `/` 开头，否则补上并返回 false。
fn ensure_slash(platform: &dyn PlatformHistory) -> bool {
    let path = hash_of(platform);
    if path.starts_with('/') {
        return true;
    }
    replace_hash(platform, &format!("/{path}"));
    false
}

impl HistoryMode for HashMode {
    fn kind(&self) -> RouterMode {
        RouterMode::Hash
    }

    fn base(&self) -> &str {
        &self.base
    }

    fn current_location(&self) -> String {
        hash_of(&*self.platform)
    }

    fn ensure_url(&self, current: &Route, push: bool) {
        if hash_of(&*self.platform) == current.full_path {
            return;
        }
        if push {
            push_hash(&*self.platform, &current.full_path);
        } else {
            replace_hash(&*self.platform, &current.full_path);
        }
    }

    fn commit(&self, route: &Rc<Route>, action: CommitAction) {
        match action {
            CommitAction::Push => push_hash(&*self.platform, &route.full_path),
            CommitAction::Replace => replace_hash(&*self.platform, &route.full_path),
        }
    }

    fn go(&self, _shared: &Rc<RouterShared>, n: isize) {
        self.platform.go(n);
    }

    fn setup_listeners(&self, shared: &Rc<RouterShared>) -> Vec<Subscription> {
        let supports_push_state = self.platform.supports_push_state();
        let event = if supports_push_state {
            PlatformEvent::PopState
        } else {
            PlatformEvent::HashChange
        };

        let weak = Rc::downgrade(shared);
        let platform = self.platform.clone();
        let handler = Rc::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if !ensure_slash(&*platform) {
                return;
            }

            // 没有 pushState 时 hashchange 已经产生了历史记录，这里只规范化 URL
            let on_complete: Option<CompleteFn> = if supports_push_state {
                None
            } else {
                let platform = platform.clone();
                Some(Box::new(move |route: &Rc<Route>| replace_hash(&*platform, &route.full_path)))
            };
            let target = RawLocation::from(hash_of(&*platform));
            if let Err(error) = transition_to(&shared, &target, on_complete, None) {
                debug!(%error, "hash target failed to match");
            }
        });

        vec![self.platform.subscribe(event, handler)]
    }
}
