use std::rc::Rc;

use crate::waypoint_core::history::Subscription;
use crate::waypoint_core::location::clean_path;
use crate::waypoint_core::route::Route;
use crate::waypoint_core::router::RouterShared;
use crate::waypoint_core::types::RouterMode;

/// 确认成功后写入平台历史的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitAction {
    Push,
    Replace,
}

/// 一种 history 持久化策略：决定 URL 长什么样、怎样写入平台、怎样响应外部导航。
///
/// 导航状态（current / pending / 回调）统一放在 [`RouterShared`] 里，策略本身只管平台交互。
pub(crate) trait HistoryMode {
    fn kind(&self) -> RouterMode;

    /// 规范化后的 base，没有前导以外的 `/`；根 base 是空串。
    fn base(&self) -> &str;

    /// 平台当前位置对应的完整路径。
    fn current_location(&self) -> String;

    /// 平台 URL 与 `current` 不一致时改写平台 URL。
    fn ensure_url(&self, current: &Route, push: bool);

    /// 导航确认后把路由写入平台历史。
    fn commit(&self, route: &Rc<Route>, action: CommitAction);

    /// 在历史中移动 `n` 步。
    fn go(&self, shared: &Rc<RouterShared>, n: isize);

    /// 订阅平台的外部导航通知，返回注销句柄。
    fn setup_listeners(&self, shared: &Rc<RouterShared>) -> Vec<Subscription>;

    fn href(&self, full_path: &str) -> String {
        create_href(self.base(), full_path, self.kind())
    }
}

/// `None` 视为 `/`；补全前导 `/`，去掉末尾 `/`。
pub(crate) fn normalize_base(base: Option<&str>) -> String {
    let base = base.filter(|b| !b.is_empty()).unwrap_or("/");
    let base = if base.starts_with('/') {
        base.to_owned()
    } else {
        format!("/{base}")
    };
    base.trim_end_matches('/').to_owned()
}

/// 链接地址：hash 模式在路径前加 `#`，再拼上 base。
pub(crate) fn create_href(base: &str, full_path: &str, kind: RouterMode) -> String {
    let path = match kind {
        RouterMode::Hash => format!("#{full_path}"),
        _ => full_path.to_owned(),
    };
    if base.is_empty() {
        path
    } else {
        clean_path(&format!("{base}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn base_is_normalized() {
        assert_eq!(normalize_base(None), "");
        assert_eq!(normalize_base(Some("/")), "");
        assert_eq!(normalize_base(Some("app/")), "/app");
        assert_eq!(normalize_base(Some("/app")), "/app");
    }

    #[test]
    fn hrefs_follow_the_mode() {
        assert_eq!(create_href("", "/foo?x=1", RouterMode::History), "/foo?x=1");
        assert_eq!(create_href("/app", "/foo", RouterMode::History), "/app/foo");
        assert_eq!(create_href("", "/foo", RouterMode::Hash), "#/foo");
        assert_eq!(create_href("/app", "/foo", RouterMode::Hash), "/app/#/foo");
        assert_eq!(create_href("/app", "/foo", RouterMode::Abstract), "/app/foo");
    }
}
