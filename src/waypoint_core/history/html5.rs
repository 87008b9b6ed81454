use std::rc::Rc;

use tracing::debug;

use crate::waypoint_core::history::{
    normalize_base, CommitAction, HistoryMode, PlatformEvent, PlatformHistory, Subscription,
};
use crate::waypoint_core::location::{clean_path, RawLocation};
use crate::waypoint_core::route::Route;
use crate::waypoint_core::router::RouterShared;
use crate::waypoint_core::transition::transition_to;
use crate::waypoint_core::types::RouterMode;

/// html5 模式：路由路径直接作为 URL path，写入用 pushState / replaceState。
pub(crate) struct Html5Mode {
    platform: Rc<dyn PlatformHistory>,
    base: String,
    /// 构造时的平台位置，用于忽略部分浏览器在首次加载时多发的一次 popstate。
    start_location: String,
}

impl Html5Mode {
    pub(crate) fn new(platform: Rc<dyn PlatformHistory>, base: Option<&str>) -> Self {
        let base = normalize_base(base);
        let start_location = location_of(&*platform, &base);
        Self {
            platform,
            base,
            start_location,
        }
    }

    fn url_for(&self, full_path: &str) -> String {
        clean_path(&format!("{}{}", self.base, full_path))
    }
}

/// 去掉 base 之后的 `path + search + hash`。base 的比较忽略大小写。
pub(crate) fn location_of(platform: &dyn PlatformHistory, base: &str) -> String {
    let mut path = platform.pathname();
    let lower_path = path.to_lowercase();
    let lower_base = base.to_lowercase();
    let base_dir = clean_path(&format!("{lower_base}/"));
    let under_base = !base.is_empty()
        && (lower_path == lower_base || lower_path.starts_with(&base_dir));
    if under_base {
        if let Some(rest) = path.get(base.len()..) {
            path = rest.to_owned();
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    format!("{path}{}{}", platform.search(), platform.hash())
}

impl HistoryMode for Html5Mode {
    fn kind(&self) -> RouterMode {
        RouterMode::History
    }

    fn base(&self) -> &str {
        &self.base
    }

    fn current_location(&self) -> String {
        location_of(&*self.platform, &self.base)
    }

    fn ensure_url(&self, current: &Route, push: bool) {
        if self.current_location() == current.full_path {
            return;
        }
        let url = self.url_for(&current.full_path);
        if push {
            self.platform.push_state(&url);
        } else {
            self.platform.replace_state(&url);
        }
    }

    fn commit(&self, route: &Rc<Route>, action: CommitAction) {
        let url = self.url_for(&route.full_path);
        match action {
            CommitAction::Push => self.platform.push_state(&url),
            CommitAction::Replace => self.platform.replace_state(&url),
        }
    }

    fn go(&self, _shared: &Rc<RouterShared>, n: isize) {
        self.platform.go(n);
    }

    fn setup_listeners(&self, shared: &Rc<RouterShared>) -> Vec<Subscription> {
        let weak = Rc::downgrade(shared);
        let platform = self.platform.clone();
        let base = self.base.clone();
        let start_location = self.start_location.clone();

        let handler = Rc::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let location = location_of(&*platform, &base);
            if shared.current().is_start() && location == start_location {
                return;
            }
            if let Err(error) = transition_to(&shared, &RawLocation::from(location), None, None) {
                debug!(%error, "popstate target failed to match");
            }
        });

        vec![self.platform.subscribe(PlatformEvent::PopState, handler)]
    }
}
