use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{debug, info, warn};

use crate::waypoint_core::component::{ComponentSlot, ViewInstance};
use crate::waypoint_core::error::{ConfigError, MatchError, NavigationError};
use crate::waypoint_core::guard::{HookHandle, NavigationGuard};
use crate::waypoint_core::history::{CommitAction, HashMode, HistoryMode, Html5Mode, MemoryMode};
use crate::waypoint_core::location::{normalize_location_with, Location, RawLocation};
use crate::waypoint_core::matcher::Matcher;
use crate::waypoint_core::route::{Route, RouteConfig, RouteRecord};
use crate::waypoint_core::router::{RouterOptions, RouterShared};
use crate::waypoint_core::transition::{
    handle_route_entered, navigate, transition_to, AbortFn, CompleteFn,
};
use crate::waypoint_core::types::RouterMode;

/// 导航完成时得到的结果。
pub type NavigationResult = Result<Rc<Route>, NavigationError>;

/// [`Router::resolve`] 的结果。
#[derive(Debug, Clone)]
pub struct Resolved {
    /// 规范化后的位置。
    pub location: Location,
    pub route: Route,
    /// 可以直接放进链接的地址（含 base，hash 模式带 `#`）。
    pub href: String,
}

/// 路由器。
///
/// 持有路由表、全局钩子、导航状态和所选的 history 模式。
/// 克隆得到的是同一个路由器的另一个句柄。
#[derive(Clone)]
pub struct Router {
    shared: Rc<RouterShared>,
}

impl Router {
    /// 编译路由表并选择 history 模式。
    ///
    /// - `History` 模式而平台不支持 pushState 且允许降级：改用 `Hash`；
    /// - 没有平台端口：改用 `Abstract`。
    pub fn new(options: RouterOptions) -> Result<Self, ConfigError> {
        let matcher = Matcher::new(&options.routes)?.with_query_codec(options.query_codec());
        let RouterOptions { settings, platform, .. } = options;
        let base = settings.base.as_deref();

        let mut mode = settings.mode;
        let fallback = mode == RouterMode::History
            && settings.fallback
            && platform.as_ref().is_some_and(|p| !p.supports_push_state());
        if fallback {
            mode = RouterMode::Hash;
        }

        let history: Box<dyn HistoryMode> = match (mode, platform) {
            (RouterMode::History, Some(platform)) => Box::new(Html5Mode::new(platform, base)),
            (RouterMode::Hash, Some(platform)) => Box::new(HashMode::new(platform, base, fallback)),
            (RouterMode::Abstract, _) => Box::new(MemoryMode::new(base)),
            (requested, None) => {
                debug!(?requested, "no platform history available, using abstract mode");
                Box::new(MemoryMode::new(base))
            }
        };
        info!(mode = ?history.kind(), base = history.base(), "router created");

        Ok(Self {
            shared: Rc::new(RouterShared::new(matcher, history)),
        })
    }

    pub fn mode(&self) -> RouterMode {
        self.shared.mode.kind()
    }

    /// 规范化后的 base；根 base 为空串。
    pub fn base(&self) -> String {
        self.shared.mode.base().to_owned()
    }

    pub fn current(&self) -> Rc<Route> {
        self.shared.current()
    }

    /// 纯匹配，不触发导航。
    pub fn match_route(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
    ) -> Result<Route, MatchError> {
        self.shared.matcher().match_location(raw, current, None)
    }

    //
    // ========== 生命周期 ==========
    //

    /// 启动：浏览器模式下导航到平台当前位置，结束后（无论成败）开始监听外部导航。
    ///
    /// 重复调用无效果。memory 模式不做初始导航，第一次 `push` 才会使路由器 ready。
    pub fn init(&self) {
        if self.shared.initialized.replace(true) {
            return;
        }
        if self.mode() == RouterMode::Abstract {
            debug!("abstract router initialized, waiting for the first navigation");
            return;
        }

        let setup: Rc<dyn Fn()> = {
            let weak = Rc::downgrade(&self.shared);
            Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    setup_listeners(&shared);
                }
            })
        };
        let after_complete = setup.clone();
        let on_complete: CompleteFn = Box::new(move |_: &Rc<Route>| after_complete());
        let on_abort: AbortFn = Box::new(move |_: NavigationError| setup());

        let location = RawLocation::from(self.shared.mode.current_location());
        let started = transition_to(&self.shared, &location, Some(on_complete), Some(on_abort));
        if let Err(error) = started {
            warn!(%error, "initial location failed to match");
        }
    }

    /// 注销所有外部监听并回到起点状态。之后可以重新 `init`。
    pub fn teardown(&self) {
        let listeners = self.shared.history.borrow_mut().reset();
        drop(listeners);
        self.shared.ticks.borrow_mut().clear();
        self.shared.initialized.set(false);
        debug!("router torn down");
    }

    /// 每次 current 变化后调用，渲染层据此重新渲染。
    pub fn listen(&self, cb: impl Fn(&Rc<Route>) + 'static) {
        self.shared.history.borrow_mut().cb = Some(Rc::new(cb));
    }

    //
    // ========== 钩子 ==========
    //

    pub fn before_each(&self, guard: impl NavigationGuard + 'static) -> HookHandle {
        self.shared.before_hooks.register(Rc::new(guard))
    }

    /// 在组件进入守卫之后、确认之前执行。
    pub fn before_resolve(&self, guard: impl NavigationGuard + 'static) -> HookHandle {
        self.shared.resolve_hooks.register(Rc::new(guard))
    }

    /// 导航确认后以 `(to, from)` 调用。
    pub fn after_each(&self, hook: impl Fn(&Route, &Route) + 'static) -> HookHandle {
        self.shared.after_hooks.register(Rc::new(hook))
    }

    /// 初始导航结束时回调：成功调用 `cb`，失败调用 `error_cb`。
    /// 已经 ready 时立即以当前路由调用 `cb`。
    pub fn on_ready(
        &self,
        cb: impl FnOnce(&Rc<Route>) + 'static,
        error_cb: Option<Box<dyn FnOnce(&NavigationError)>>,
    ) {
        let current = {
            let mut history = self.shared.history.borrow_mut();
            if !history.ready {
                history.ready_cbs.push(Box::new(cb));
                if let Some(error_cb) = error_cb {
                    history.ready_error_cbs.push(error_cb);
                }
                return;
            }
            history.current.clone()
        };
        cb(&current);
    }

    /// 守卫错误和匹配错误的全局监听。
    pub fn on_error(&self, cb: impl Fn(&NavigationError) + 'static) {
        self.shared.history.borrow_mut().error_cbs.push(Rc::new(cb));
    }

    //
    // ========== 导航 ==========
    //

    /// 新增一条历史记录并导航。返回的 future 在导航确认或中止时完成。
    pub fn push(&self, to: impl Into<RawLocation>) -> LocalBoxFuture<'static, NavigationResult> {
        self.navigate_future(to.into(), CommitAction::Push)
    }

    /// 替换当前历史记录并导航。
    pub fn replace(&self, to: impl Into<RawLocation>) -> LocalBoxFuture<'static, NavigationResult> {
        self.navigate_future(to.into(), CommitAction::Replace)
    }

    /// 回调形式的 `push`。匹配失败时直接返回错误，两个回调都不会被调用。
    pub fn push_with(
        &self,
        to: impl Into<RawLocation>,
        on_complete: impl FnOnce(&Rc<Route>) + 'static,
        on_abort: impl FnOnce(NavigationError) + 'static,
    ) -> Result<(), MatchError> {
        navigate(
            &self.shared,
            &to.into(),
            CommitAction::Push,
            Some(Box::new(on_complete)),
            Some(Box::new(on_abort)),
        )
    }

    /// 回调形式的 `replace`。
    pub fn replace_with(
        &self,
        to: impl Into<RawLocation>,
        on_complete: impl FnOnce(&Rc<Route>) + 'static,
        on_abort: impl FnOnce(NavigationError) + 'static,
    ) -> Result<(), MatchError> {
        navigate(
            &self.shared,
            &to.into(),
            CommitAction::Replace,
            Some(Box::new(on_complete)),
            Some(Box::new(on_abort)),
        )
    }

    fn navigate_future(
        &self,
        to: RawLocation,
        action: CommitAction,
    ) -> LocalBoxFuture<'static, NavigationResult> {
        let (tx, rx) = oneshot::channel::<NavigationResult>();
        let tx = Rc::new(RefCell::new(Some(tx)));

        let on_complete: CompleteFn = {
            let tx = tx.clone();
            Box::new(move |route: &Rc<Route>| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Ok(route.clone()));
                }
            })
        };
        let on_abort: AbortFn = Box::new(move |error: NavigationError| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Err(error));
            }
        });

        let started = navigate(&self.shared, &to, action, Some(on_complete), Some(on_abort));
        async move {
            if let Err(error) = started {
                return Err(NavigationError::Match(error));
            }
            rx.await.unwrap_or(Err(NavigationError::Interrupted))
        }
        .boxed_local()
    }

    /// 在历史中移动 `n` 步。
    pub fn go(&self, n: isize) {
        self.shared.mode.go(&self.shared, n);
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    /// 解析导航意图但不导航。`current` 缺省为当前路由。
    pub fn resolve(
        &self,
        to: impl Into<RawLocation>,
        current: Option<&Route>,
        append: bool,
    ) -> Result<Resolved, MatchError> {
        let raw = to.into();
        let now = self.current();
        let current = current.unwrap_or(&*now);
        let matcher = self.shared.matcher();
        let codec = matcher.query_codec();
        let location = normalize_location_with(&raw, Some(current), append, codec)?;
        let route =
            matcher.match_location(&RawLocation::Location(location.clone()), Some(current), None)?;
        let full_path = route
            .redirected_from
            .as_ref()
            .map_or_else(|| route.full_path.clone(), |from| from.full_path_with(codec));
        let href = self.shared.mode.href(&full_path);
        Ok(Resolved {
            location,
            route,
            href,
        })
    }

    //
    // ========== 动态路由 ==========
    //

    pub fn add_route(&self, route: RouteConfig) -> Result<(), ConfigError> {
        self.shared.update_matcher(|matcher| matcher.add_route(None, route))?;
        self.refresh_current();
        Ok(())
    }

    /// 在名为 `parent` 的路由下追加子路由，父路由的别名也会得到对应的子路由。
    pub fn add_child_route(&self, parent: &str, route: RouteConfig) -> Result<(), ConfigError> {
        self.shared
            .update_matcher(|matcher| matcher.add_route(Some(parent), route))?;
        self.refresh_current();
        Ok(())
    }

    pub fn add_routes(&self, routes: Vec<RouteConfig>) -> Result<(), ConfigError> {
        self.shared.update_matcher(|matcher| matcher.add_routes(&routes))?;
        self.refresh_current();
        Ok(())
    }

    /// 按 path 列表优先级排列的全部记录。
    pub fn get_routes(&self) -> Vec<Rc<RouteRecord>> {
        self.shared.matcher().get_routes()
    }

    /// 新路由可能改变当前位置的匹配结果：已经导航过的路由器重新导航一次。
    fn refresh_current(&self) {
        if self.current().is_start() {
            return;
        }
        let location = RawLocation::from(self.shared.mode.current_location());
        if let Err(error) = transition_to(&self.shared, &location, None, None) {
            warn!(%error, "current location failed to match after adding routes");
        }
    }

    /// 目标（缺省为当前路由）匹配链上所有槽位的组件，未解析的懒加载组件原样返回。
    pub fn get_matched_components(
        &self,
        to: Option<&RawLocation>,
    ) -> Result<Vec<ComponentSlot>, MatchError> {
        let route = match to {
            Some(raw) => Rc::new(self.resolve(raw.clone(), None, false)?.route),
            None => self.current(),
        };
        Ok(route
            .matched
            .iter()
            .flat_map(|record| record.components().into_values())
            .collect())
    }

    //
    // ========== 渲染层回调 ==========
    //

    /// 视图实例挂载到 `record` 的 `slot` 后调用：记录实例并执行排队的 entered 回调。
    pub fn register_instance(&self, record: &RouteRecord, slot: &str, instance: ViewInstance) {
        {
            let mut instances = record.instances.borrow_mut();
            let same = instances.get(slot).is_some_and(|current| current.ptr_eq(&instance));
            if !same {
                instances.insert(slot.to_owned(), instance);
            }
        }
        handle_route_entered(&self.current());
    }

    /// 视图实例销毁时调用；槽位上已经是别的实例时不做任何事。
    pub fn unregister_instance(&self, record: &RouteRecord, slot: &str, instance: &ViewInstance) {
        let mut instances = record.instances.borrow_mut();
        if instances.get(slot).is_some_and(|current| current.ptr_eq(instance)) {
            instances.remove(slot);
        }
    }

    /// 渲染层完成一次更新后调用：为刚确认的路由执行 entered 回调。
    pub fn notify_tick(&self) {
        let routes = std::mem::take(&mut *self.shared.ticks.borrow_mut());
        for route in routes {
            handle_route_entered(&route);
        }
    }
}

fn setup_listeners(shared: &Rc<RouterShared>) {
    if !shared.history.borrow().listeners.is_empty() {
        return;
    }
    let listeners = shared.mode.setup_listeners(shared);
    debug!(count = listeners.len(), "platform listeners installed");
    shared.history.borrow_mut().listeners.extend(listeners);
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("shared", &self.shared).finish()
    }
}
