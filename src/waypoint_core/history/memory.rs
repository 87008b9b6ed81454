use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::waypoint_core::error::{NavigationError, NavigationFailureType};
use crate::waypoint_core::history::{normalize_base, CommitAction, HistoryMode, Subscription};
use crate::waypoint_core::location::RawLocation;
use crate::waypoint_core::route::Route;
use crate::waypoint_core::router::RouterShared;
use crate::waypoint_core::transition::{transition_to, AbortFn, CompleteFn};
use crate::waypoint_core::types::RouterMode;

/// memory（abstract）模式：没有平台 URL，历史是进程内的路由栈加一个游标。
pub(crate) struct MemoryMode {
    base: String,
    stack: Rc<RefCell<Vec<Rc<Route>>>>,
    /// 栈为空时为 -1。
    index: Rc<Cell<isize>>,
}

impl MemoryMode {
    pub(crate) fn new(base: Option<&str>) -> Self {
        Self {
            base: normalize_base(base),
            stack: Rc::new(RefCell::new(Vec::new())),
            index: Rc::new(Cell::new(-1)),
        }
    }
}

impl HistoryMode for MemoryMode {
    fn kind(&self) -> RouterMode {
        RouterMode::Abstract
    }

    fn base(&self) -> &str {
        &self.base
    }

    /// 栈顶路由的完整路径；栈为空时是 `/`。
    fn current_location(&self) -> String {
        self.stack
            .borrow()
            .last()
            .map_or_else(|| "/".to_owned(), |route| route.full_path.clone())
    }

    fn ensure_url(&self, _current: &Route, _push: bool) {}

    fn commit(&self, route: &Rc<Route>, action: CommitAction) {
        let mut stack = self.stack.borrow_mut();
        let index = self.index.get();
        match action {
            // 游标之后的记录被丢弃
            CommitAction::Push => {
                stack.truncate(usize::try_from(index + 1).unwrap_or(0));
                stack.push(route.clone());
                self.index.set(index + 1);
            }
            CommitAction::Replace => {
                stack.truncate(usize::try_from(index).unwrap_or(0));
                stack.push(route.clone());
                self.index.set(index.max(0));
            }
        }
        trace!(index = self.index.get(), depth = stack.len(), "memory history updated");
    }

    /// 越界的移动被忽略；目标记录按其完整路径重新匹配后再确认。
    /// 重复导航视为已到达，只移动游标。
    fn go(&self, shared: &Rc<RouterShared>, n: isize) {
        let target = self.index.get() + n;
        let full_path = {
            let stack = self.stack.borrow();
            let Some(route) = usize::try_from(target).ok().and_then(|i| stack.get(i)) else {
                return;
            };
            route.full_path.clone()
        };

        let on_complete: CompleteFn = {
            let stack = self.stack.clone();
            let index = self.index.clone();
            Box::new(move |route: &Rc<Route>| {
                index.set(target);
                let mut stack = stack.borrow_mut();
                if let Some(entry) = usize::try_from(target).ok().and_then(|i| stack.get_mut(i)) {
                    *entry = route.clone();
                }
            })
        };
        let on_abort: AbortFn = {
            let index = self.index.clone();
            Box::new(move |error: NavigationError| {
                if error.is_failure_of(NavigationFailureType::Duplicated) {
                    index.set(target);
                }
            })
        };

        let location = RawLocation::from(full_path);
        if let Err(error) = transition_to(shared, &location, Some(on_complete), Some(on_abort)) {
            debug!(%error, "memory history entry failed to match");
        }
    }

    fn setup_listeners(&self, _shared: &Rc<RouterShared>) -> Vec<Subscription> {
        Vec::new()
    }
}
