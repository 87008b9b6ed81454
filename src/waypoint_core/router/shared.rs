use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::waypoint_core::guard::{HookList, NavigationGuard};
use crate::waypoint_core::history::{HistoryMode, HistoryState};
use crate::waypoint_core::matcher::Matcher;
use crate::waypoint_core::route::Route;

/// 一个路由器实例的全部共享状态。
///
/// 单线程模型：守卫续延、平台监听和异步组件回调都持有 `Rc<RouterShared>`，
/// 任何 `RefCell` 借用都不会跨越用户回调。
pub(crate) struct RouterShared {
    /// 匹配期间会调用用户的重定向函数，所以匹配总是在快照上进行，修改时整体替换。
    matcher: RefCell<Rc<Matcher>>,
    pub(crate) before_hooks: HookList<dyn NavigationGuard>,
    pub(crate) resolve_hooks: HookList<dyn NavigationGuard>,
    pub(crate) after_hooks: HookList<dyn Fn(&Route, &Route)>,
    pub(crate) history: RefCell<HistoryState>,
    pub(crate) mode: Box<dyn HistoryMode>,
    /// 已确认、等待下一次渲染 tick 处理 entered 回调的路由。
    pub(crate) ticks: RefCell<Vec<Rc<Route>>>,
    pub(crate) initialized: Cell<bool>,
}

impl RouterShared {
    pub(crate) fn new(matcher: Matcher, mode: Box<dyn HistoryMode>) -> Self {
        Self {
            matcher: RefCell::new(Rc::new(matcher)),
            before_hooks: HookList::new(),
            resolve_hooks: HookList::new(),
            after_hooks: HookList::new(),
            history: RefCell::new(HistoryState::new()),
            mode,
            ticks: RefCell::new(Vec::new()),
            initialized: Cell::new(false),
        }
    }

    pub(crate) fn matcher(&self) -> Rc<Matcher> {
        self.matcher.borrow().clone()
    }

    /// 在匹配器副本上修改，成功后整体替换；失败时原匹配器不变。
    pub(crate) fn update_matcher<E>(
        &self,
        f: impl FnOnce(&mut Matcher) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut next = Matcher::clone(&self.matcher());
        f(&mut next)?;
        *self.matcher.borrow_mut() = Rc::new(next);
        Ok(())
    }

    pub(crate) fn current(&self) -> Rc<Route> {
        self.history.borrow().current.clone()
    }
}

impl fmt::Debug for RouterShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterShared")
            .field("mode", &self.mode.kind())
            .field("base", &self.mode.base())
            .field("history", &*self.history.borrow())
            .field("before_hooks", &self.before_hooks.len())
            .field("resolve_hooks", &self.resolve_hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .finish()
    }
}
