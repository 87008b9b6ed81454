use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::waypoint_core::error::GuardError;
use crate::waypoint_core::guard::{InstanceGuard, NavigationGuard};

/// 组件句柄。
///
/// 核心不解释组件内容：`payload` 由渲染层自行放入和取出。
/// 核心只关心组件声明的三类路由守卫。
#[derive(Clone, Default)]
pub struct Component {
    name: String,
    payload: Option<Rc<dyn Any>>,
    before_route_enter: Vec<Rc<dyn NavigationGuard>>,
    before_route_update: Vec<Rc<dyn InstanceGuard>>,
    before_route_leave: Vec<Rc<dyn InstanceGuard>>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    /// 进入守卫：此时组件实例还不存在，可以通过 `next.entered(cb)` 拿到挂载后的实例。
    pub fn before_route_enter(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.before_route_enter.push(Rc::new(guard));
        self
    }

    /// 复用守卫：同一记录换参数时调用，绑定到现有实例。
    pub fn before_route_update(mut self, guard: impl InstanceGuard + 'static) -> Self {
        self.before_route_update.push(Rc::new(guard));
        self
    }

    /// 离开守卫：绑定到现有实例。
    pub fn before_route_leave(mut self, guard: impl InstanceGuard + 'static) -> Self {
        self.before_route_leave.push(Rc::new(guard));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    pub(crate) fn enter_guards(&self) -> &[Rc<dyn NavigationGuard>] {
        &self.before_route_enter
    }

    pub(crate) fn update_guards(&self) -> &[Rc<dyn InstanceGuard>] {
        &self.before_route_update
    }

    pub(crate) fn leave_guards(&self) -> &[Rc<dyn InstanceGuard>] {
        &self.before_route_leave
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .field("before_route_enter", &self.before_route_enter.len())
            .field("before_route_update", &self.before_route_update.len())
            .field("before_route_leave", &self.before_route_leave.len())
            .finish()
    }
}

/// 记录上某个视图槽位的组件。
#[derive(Clone, Debug)]
pub enum ComponentSlot {
    /// 已就绪的组件。
    Ready(Rc<Component>),
    /// 懒加载组件，进入时由 transition 解析。
    Lazy(AsyncComponent),
    /// 只给了字符串 id：构建路由表时报错。
    Unresolved(String),
}

impl ComponentSlot {
    /// 已可用的组件；懒加载组件只有在加载完成后才返回。
    pub fn resolved(&self) -> Option<Rc<Component>> {
        match self {
            ComponentSlot::Ready(component) => Some(component.clone()),
            ComponentSlot::Lazy(lazy) => lazy.resolved(),
            ComponentSlot::Unresolved(_) => None,
        }
    }
}

impl From<Component> for ComponentSlot {
    fn from(component: Component) -> Self {
        ComponentSlot::Ready(Rc::new(component))
    }
}

impl From<Rc<Component>> for ComponentSlot {
    fn from(component: Rc<Component>) -> Self {
        ComponentSlot::Ready(component)
    }
}

impl From<AsyncComponent> for ComponentSlot {
    fn from(lazy: AsyncComponent) -> Self {
        ComponentSlot::Lazy(lazy)
    }
}

type Factory = dyn Fn(ComponentResolver) -> Result<(), GuardError>;

/// 懒加载组件工厂。
///
/// 工厂拿到一个 [`ComponentResolver`]，可以同步或稍后调用 `resolve` / `reject`。
/// 成功结果会被缓存，之后的导航直接使用缓存。
#[derive(Clone)]
pub struct AsyncComponent {
    factory: Rc<Factory>,
    resolved: Rc<RefCell<Option<Rc<Component>>>>,
}

impl AsyncComponent {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(ComponentResolver) -> Result<(), GuardError> + 'static,
    {
        Self {
            factory: Rc::new(factory),
            resolved: Rc::new(RefCell::new(None)),
        }
    }

    pub fn resolved(&self) -> Option<Rc<Component>> {
        self.resolved.borrow().clone()
    }

    pub(crate) fn remember(&self, component: Rc<Component>) {
        *self.resolved.borrow_mut() = Some(component);
    }

    pub(crate) fn load(&self, resolver: ComponentResolver) -> Result<(), GuardError> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for AsyncComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncComponent")
            .field("resolved", &self.resolved.borrow().is_some())
            .finish()
    }
}

type Settle = Box<dyn FnOnce(Result<Rc<Component>, GuardError>)>;

/// 异步组件工厂的完成句柄。`resolve` 与 `reject` 合计只生效一次。
#[derive(Clone)]
pub struct ComponentResolver {
    settle: Rc<RefCell<Option<Settle>>>,
}

impl ComponentResolver {
    pub(crate) fn new(settle: impl FnOnce(Result<Rc<Component>, GuardError>) + 'static) -> Self {
        Self {
            settle: Rc::new(RefCell::new(Some(Box::new(settle)))),
        }
    }

    pub fn resolve(&self, component: impl Into<Rc<Component>>) {
        self.settle(Ok(component.into()));
    }

    pub fn reject(&self, error: impl Into<GuardError>) {
        self.settle(Err(error.into()));
    }

    pub fn is_settled(&self) -> bool {
        self.settle.borrow().is_none()
    }

    fn settle(&self, result: Result<Rc<Component>, GuardError>) {
        let settle = self.settle.borrow_mut().take();
        if let Some(settle) = settle {
            settle(result);
        }
    }
}

impl fmt::Debug for ComponentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentResolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// 渲染层挂载的视图实例，核心只比较身份。
#[derive(Clone)]
pub struct ViewInstance(Rc<dyn Any>);

impl ViewInstance {
    pub fn new<T: Any>(value: T) -> Self {
        ViewInstance(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &ViewInstance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewInstance({:p})", Rc::as_ptr(&self.0))
    }
}

/// 进入守卫通过 `next.entered(cb)` 排队的回调，实例挂载后执行。
pub type EnteredCallback = Rc<dyn Fn(&ViewInstance)>;
