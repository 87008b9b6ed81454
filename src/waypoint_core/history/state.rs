use std::fmt;
use std::rc::Rc;

use crate::waypoint_core::error::NavigationError;
use crate::waypoint_core::history::Subscription;
use crate::waypoint_core::route::Route;

pub(crate) type ReadyCallback = Box<dyn FnOnce(&Rc<Route>)>;
pub(crate) type ReadyErrorCallback = Box<dyn FnOnce(&NavigationError)>;
pub(crate) type ErrorCallback = Rc<dyn Fn(&NavigationError)>;
pub(crate) type RouteListener = Rc<dyn Fn(&Rc<Route>)>;

/// 一个路由器实例的导航状态。
///
/// - `current`：最近一次确认的路由；
/// - `pending`：正在确认中的候选路由，被新导航替换即视为取消；
/// - ready / ready-error / error 回调；
/// - 外部监听的注销句柄。
pub(crate) struct HistoryState {
    pub(crate) current: Rc<Route>,
    pub(crate) pending: Option<Rc<Route>>,
    pub(crate) ready: bool,
    pub(crate) ready_cbs: Vec<ReadyCallback>,
    pub(crate) ready_error_cbs: Vec<ReadyErrorCallback>,
    pub(crate) error_cbs: Vec<ErrorCallback>,
    pub(crate) listeners: Vec<Subscription>,
    pub(crate) cb: Option<RouteListener>,
}

impl HistoryState {
    pub(crate) fn new() -> Self {
        Self {
            current: Rc::new(Route::start()),
            pending: None,
            ready: false,
            ready_cbs: Vec::new(),
            ready_error_cbs: Vec::new(),
            error_cbs: Vec::new(),
            listeners: Vec::new(),
            cb: None,
        }
    }

    /// `route` 是否仍是正在确认的那一次导航。
    pub(crate) fn is_pending(&self, route: &Rc<Route>) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| Rc::ptr_eq(pending, route))
    }

    /// 取出所有外部监听并把状态重置到起点。
    ///
    /// 返回的句柄由调用方在释放借用之后 drop。
    pub(crate) fn reset(&mut self) -> Vec<Subscription> {
        self.current = Rc::new(Route::start());
        self.pending = None;
        std::mem::take(&mut self.listeners)
    }
}

impl fmt::Debug for HistoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryState")
            .field("current", &self.current.full_path)
            .field("pending", &self.pending.as_ref().map(|route| &route.full_path))
            .field("ready", &self.ready)
            .field("ready_cbs", &self.ready_cbs.len())
            .field("ready_error_cbs", &self.ready_error_cbs.len())
            .field("error_cbs", &self.error_cbs.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
