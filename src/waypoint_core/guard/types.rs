use crate::waypoint_core::component::ViewInstance;
use crate::waypoint_core::error::GuardError;
use crate::waypoint_core::guard::Next;
use crate::waypoint_core::route::Route;

/// 守卫执行结果：`Err` 相当于守卫内部抛出异常。
pub type GuardResult = Result<(), GuardError>;

/// 导航守卫：全局 before-each / before-resolve、记录上的 `before_enter`、组件的进入守卫。
///
/// 实现必须恰好调用一次 `next`（可以异步调用），否则本次导航会一直挂起。
pub trait NavigationGuard {
    fn run(&self, to: &Route, from: &Route, next: Next) -> GuardResult;

    /// 可选：返回一个描述性名称，用于调试。
    fn name(&self) -> &str {
        "anonymous_guard"
    }
}

/// 绑定到已挂载视图实例的守卫：组件的 update / leave 守卫。
pub trait InstanceGuard {
    fn run(&self, instance: &ViewInstance, to: &Route, from: &Route, next: Next) -> GuardResult;

    fn name(&self) -> &str {
        "anonymous_instance_guard"
    }
}

//
// ========== 便捷的闭包实现 ==========
//

/// 用闭包创建 NavigationGuard。
pub struct FnGuard<F> {
    name: String,
    func: F,
}

impl<F> FnGuard<F>
where
    F: Fn(&Route, &Route, Next) -> GuardResult,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> NavigationGuard for FnGuard<F>
where
    F: Fn(&Route, &Route, Next) -> GuardResult,
{
    fn run(&self, to: &Route, from: &Route, next: Next) -> GuardResult {
        (self.func)(to, from, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 匿名闭包守卫。
pub fn guard_fn<F>(func: F) -> FnGuard<F>
where
    F: Fn(&Route, &Route, Next) -> GuardResult,
{
    FnGuard::new("anonymous_guard", func)
}

/// 用闭包创建 InstanceGuard。
pub struct FnInstanceGuard<F> {
    name: String,
    func: F,
}

impl<F> FnInstanceGuard<F>
where
    F: Fn(&ViewInstance, &Route, &Route, Next) -> GuardResult,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> InstanceGuard for FnInstanceGuard<F>
where
    F: Fn(&ViewInstance, &Route, &Route, Next) -> GuardResult,
{
    fn run(&self, instance: &ViewInstance, to: &Route, from: &Route, next: Next) -> GuardResult {
        (self.func)(instance, to, from, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn instance_guard_fn<F>(func: F) -> FnInstanceGuard<F>
where
    F: Fn(&ViewInstance, &Route, &Route, Next) -> GuardResult,
{
    FnInstanceGuard::new("anonymous_instance_guard", func)
}
