use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::waypoint_core::error::{
    MatchError, NavigationError, NavigationFailure, NavigationFailureType,
};
use crate::waypoint_core::guard::{AbortReason, GuardVerdict, NavigationGuard, Next};
use crate::waypoint_core::history::CommitAction;
use crate::waypoint_core::location::RawLocation;
use crate::waypoint_core::route::{is_same_route, Route};
use crate::waypoint_core::router::RouterShared;

use super::diff::{resolve_queue, RouteDiff};
use super::extract::{
    extract_before_enter, extract_enter_guards, extract_leave_guards, extract_update_guards,
};
use super::queue::{run_queue, QueueIterator, Step};
use super::resolve::ResolveAsyncComponents;

pub(crate) type CompleteFn = Box<dyn FnOnce(&Rc<Route>)>;
pub(crate) type AbortFn = Box<dyn FnOnce(NavigationError)>;

type Guard = Rc<dyn NavigationGuard>;

//
// ========== 导航入口 ==========
//

/// 匹配 `raw` 并确认导航。
///
/// 匹配失败时通知全局错误监听并返回错误，此时不会调用任何回调。
/// 成功时依次：提交 current、`on_complete`（各模式在此写入平台 URL）、
/// `ensure_url`、after 钩子、首次 ready 回调。
pub(crate) fn transition_to(
    shared: &Rc<RouterShared>,
    raw: &RawLocation,
    on_complete: Option<CompleteFn>,
    on_abort: Option<AbortFn>,
) -> Result<(), MatchError> {
    let prev = shared.current();
    let matched = shared.matcher().match_location(raw, Some(&*prev), None);
    let route = match matched {
        Ok(route) => Rc::new(route),
        Err(error) => {
            let listeners = shared.history.borrow().error_cbs.clone();
            let reported = NavigationError::Match(error.clone());
            for listener in listeners {
                listener(&reported);
            }
            return Err(error);
        }
    };

    let complete = {
        let shared = shared.clone();
        let prev = prev.clone();
        move |route: &Rc<Route>| {
            update_route(&shared, route);
            if let Some(on_complete) = on_complete {
                on_complete(route);
            }
            shared.mode.ensure_url(&shared.current(), false);
            for hook in shared.after_hooks.snapshot() {
                hook(route, &prev);
            }

            let ready_cbs = {
                let mut history = shared.history.borrow_mut();
                if history.ready {
                    Vec::new()
                } else {
                    history.ready = true;
                    std::mem::take(&mut history.ready_cbs)
                }
            };
            for cb in ready_cbs {
                cb(route);
            }
        }
    };

    let abort = {
        let shared = shared.clone();
        move |error: NavigationError| {
            if let Some(on_abort) = on_abort {
                on_abort(error.clone());
            }

            // 初始导航被守卫重定向时，ready 留给重定向后的那次导航
            let initial_redirect =
                error.is_failure_of(NavigationFailureType::Redirected) && prev.is_start();
            let ready_error_cbs = {
                let mut history = shared.history.borrow_mut();
                if history.ready || initial_redirect {
                    Vec::new()
                } else {
                    history.ready = true;
                    std::mem::take(&mut history.ready_error_cbs)
                }
            };
            for cb in ready_error_cbs {
                cb(&error);
            }
        }
    };

    confirm_transition(shared, route, Box::new(complete), Box::new(abort));
    Ok(())
}

/// 以 `action` 的方式导航到 `raw`：确认成功后先让 history 模式提交平台 URL，再调用 `on_complete`。
pub(crate) fn navigate(
    shared: &Rc<RouterShared>,
    raw: &RawLocation,
    action: CommitAction,
    on_complete: Option<CompleteFn>,
    on_abort: Option<AbortFn>,
) -> Result<(), MatchError> {
    let committer = shared.clone();
    let complete: CompleteFn = Box::new(move |route: &Rc<Route>| {
        committer.mode.commit(route, action);
        if let Some(on_complete) = on_complete {
            on_complete(route);
        }
    });
    transition_to(shared, raw, Some(complete), on_abort)
}

//
// ========== 确认导航 ==========
//

/// 对已经匹配好的 `route` 执行守卫队列。
///
/// `route` 进入 pending；每个守卫执行前都检查它是否仍是 pending，
/// 被新导航替换后以 Cancelled 中止，因此同一时刻最多只有一次导航能提交。
pub(crate) fn confirm_transition(
    shared: &Rc<RouterShared>,
    route: Rc<Route>,
    on_complete: CompleteFn,
    on_abort: AbortFn,
) {
    let current = {
        let mut history = shared.history.borrow_mut();
        history.pending = Some(route.clone());
        history.current.clone()
    };
    debug!(from = %current.full_path, to = %route.full_path, "confirming transition");

    let abort = abort_handler(shared, on_abort);

    if is_duplicate(&route, &current) {
        shared.mode.ensure_url(&current, false);
        abort(NavigationFailure::duplicated(current, route).into());
        return;
    }

    let RouteDiff {
        updated,
        deactivated,
        activated,
    } = resolve_queue(&current.matched, &route.matched);

    let mut queue: Vec<Guard> = Vec::new();
    queue.extend(extract_leave_guards(&deactivated));
    queue.extend(shared.before_hooks.snapshot());
    queue.extend(extract_update_guards(&updated));
    queue.extend(extract_before_enter(&activated));
    queue.push(Rc::new(ResolveAsyncComponents::new(activated.clone())));

    let iterator = guard_iterator(shared, &current, &route, &abort);

    let shared = shared.clone();
    let second_pass = iterator.clone();
    run_queue(
        queue,
        iterator,
        Box::new(move || {
            // 异步组件此时已解析，才能提取组件级进入守卫
            let mut enter_queue = extract_enter_guards(&activated);
            enter_queue.extend(shared.resolve_hooks.snapshot());

            run_queue(
                enter_queue,
                second_pass,
                Box::new(move || {
                    if !shared.history.borrow().is_pending(&route) {
                        abort(NavigationFailure::cancelled(current, route).into());
                        return;
                    }
                    shared.history.borrow_mut().pending = None;
                    debug!(to = %route.full_path, "transition confirmed");
                    on_complete(&route);
                    shared.ticks.borrow_mut().push(route);
                }),
            );
        }),
    );
}

fn is_duplicate(route: &Route, current: &Route) -> bool {
    let same_leaf = match (route.matched.last(), current.matched.last()) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    };
    is_same_route(route, current, false)
        && route.matched.len() == current.matched.len()
        && same_leaf
}

/// 包装 `on_abort`：守卫错误先交给全局错误监听（没有监听时记日志），软失败直接投递。
fn abort_handler(shared: &Rc<RouterShared>, on_abort: AbortFn) -> Rc<dyn Fn(NavigationError)> {
    let shared = shared.clone();
    let on_abort = RefCell::new(Some(on_abort));
    Rc::new(move |failure: NavigationError| {
        if let NavigationError::Guard(guard_error) = &failure {
            let listeners = shared.history.borrow().error_cbs.clone();
            if listeners.is_empty() {
                warn!("uncaught error during route navigation:");
                error!(error = ?guard_error, "{guard_error}");
            } else {
                for listener in listeners {
                    listener(&failure);
                }
            }
        }
        let on_abort = on_abort.borrow_mut().take();
        if let Some(on_abort) = on_abort {
            on_abort(failure);
        }
    })
}

fn guard_iterator(
    shared: &Rc<RouterShared>,
    current: &Rc<Route>,
    route: &Rc<Route>,
    abort: &Rc<dyn Fn(NavigationError)>,
) -> QueueIterator<Guard> {
    let shared = shared.clone();
    let current = current.clone();
    let route = route.clone();
    let abort = abort.clone();

    Rc::new(move |guard: &Guard, carried: Option<Value>, step: Step| {
        if !shared.history.borrow().is_pending(&route) {
            abort(NavigationFailure::cancelled(current.clone(), route.clone()).into());
            return;
        }

        let next = {
            let shared = shared.clone();
            let current = current.clone();
            let route = route.clone();
            let abort = abort.clone();
            Next::new(carried, move |arg| {
                apply_verdict(&shared, current, route, &*abort, arg.interpret(), step)
            })
        };

        if let Err(guard_error) = guard.run(&route, &current, next.clone()) {
            if next.disarm() {
                abort(NavigationError::Guard(guard_error));
            } else {
                warn!(
                    guard = guard.name(),
                    error = %guard_error,
                    "navigation guard failed after calling next, error ignored"
                );
            }
        }
    })
}

fn apply_verdict(
    shared: &Rc<RouterShared>,
    current: Rc<Route>,
    route: Rc<Route>,
    abort: &dyn Fn(NavigationError),
    verdict: GuardVerdict,
    step: Step,
) {
    match verdict {
        GuardVerdict::Proceed(value) => step(value),
        GuardVerdict::Abort(AbortReason::Aborted) => {
            shared.mode.ensure_url(&shared.current(), true);
            abort(NavigationFailure::aborted(current, route).into());
        }
        GuardVerdict::Abort(AbortReason::Error(guard_error)) => {
            shared.mode.ensure_url(&shared.current(), true);
            abort(NavigationError::Guard(guard_error));
        }
        GuardVerdict::Redirect(to) => {
            abort(NavigationFailure::redirected(current, route).into());
            let action = if to.is_replace() {
                CommitAction::Replace
            } else {
                CommitAction::Push
            };
            if let Err(match_error) = navigate(shared, &to, action, None, None) {
                debug!(error = %match_error, "guard redirect target failed to match");
            }
        }
    }
}

//
// ========== 提交 ==========
//

/// 把 `route` 设为当前路由并通知监听者。
pub(crate) fn update_route(shared: &RouterShared, route: &Rc<Route>) {
    let listener = {
        let mut history = shared.history.borrow_mut();
        history.current = route.clone();
        history.cb.clone()
    };
    if let Some(listener) = listener {
        listener(route);
    }
}

/// 把进入守卫排队的回调交给对应槽位上已挂载的实例。
///
/// 实例还没挂载的槽位保留回调，等 `register_instance` 时再触发。
pub(crate) fn handle_route_entered(route: &Route) {
    for record in &route.matched {
        for slot in record.components().keys() {
            let Some(instance) = record.instance(slot) else {
                continue;
            };
            for cb in record.take_entered(slot) {
                cb(&instance);
            }
        }
    }
}
