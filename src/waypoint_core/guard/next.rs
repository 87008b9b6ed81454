use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::waypoint_core::component::{EnteredCallback, ViewInstance};
use crate::waypoint_core::error::GuardError;
use crate::waypoint_core::location::RawLocation;

/// 守卫交给 `next` 的参数。
#[derive(Clone)]
pub enum NextArg {
    /// `next()`：放行。
    Proceed,
    /// `next(true)` 放行，`next(false)` 中止。
    Confirm(bool),
    /// 以错误中止。
    Error(GuardError),
    /// 中止当前导航并发起到新位置的导航。
    Redirect(RawLocation),
    /// 放行，并把值传给下一个守卫。
    Value(Value),
    /// 进入守卫专用：实例挂载后回调，然后放行。
    Entered(EnteredCallback),
}

impl fmt::Debug for NextArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextArg::Proceed => f.write_str("Proceed"),
            NextArg::Confirm(flag) => f.debug_tuple("Confirm").field(flag).finish(),
            NextArg::Error(error) => f.debug_tuple("Error").field(error).finish(),
            NextArg::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
            NextArg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            NextArg::Entered(_) => f.write_str("Entered(<fn>)"),
        }
    }
}

/// 中止原因。
#[derive(Debug, Clone)]
pub enum AbortReason {
    /// `next(false)`。
    Aborted,
    /// 守卫给出或抛出的错误。
    Error(GuardError),
}

/// `next` 参数的解释结果。
#[derive(Debug, Clone)]
pub enum GuardVerdict {
    /// 继续执行后续守卫，可携带一个传递值。
    Proceed(Option<Value>),

    /// 中止当前导航。
    Abort(AbortReason),

    /// 中止当前导航并重定向。
    Redirect(RawLocation),
}

impl NextArg {
    /// 把 `next` 的参数解释成 [`GuardVerdict`]。
    ///
    /// 既没有 path 也没有 name 的位置对象不算重定向，按普通值放行。
    pub fn interpret(self) -> GuardVerdict {
        match self {
            NextArg::Proceed | NextArg::Confirm(true) | NextArg::Entered(_) => {
                GuardVerdict::Proceed(None)
            }
            NextArg::Confirm(false) => GuardVerdict::Abort(AbortReason::Aborted),
            NextArg::Error(error) => GuardVerdict::Abort(AbortReason::Error(error)),
            NextArg::Value(value) => GuardVerdict::Proceed(Some(value)),
            NextArg::Redirect(RawLocation::Location(location))
                if location.path.is_none() && location.name.is_none() =>
            {
                GuardVerdict::Proceed(serde_json::to_value(&location).ok())
            }
            NextArg::Redirect(to) => GuardVerdict::Redirect(to),
        }
    }
}

type Continuation = Box<dyn FnOnce(NextArg)>;

struct NextInner {
    continuation: RefCell<Option<Continuation>>,
    carried: Option<Value>,
}

/// 守卫的续延句柄。
///
/// 可以克隆后保存起来异步调用；所有克隆共享同一个续延，只有第一次调用生效。
#[derive(Clone)]
pub struct Next {
    inner: Rc<NextInner>,
}

impl Next {
    pub(crate) fn new(
        carried: Option<Value>,
        continuation: impl FnOnce(NextArg) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(NextInner {
                continuation: RefCell::new(Some(Box::new(continuation))),
                carried,
            }),
        }
    }

    /// 调用续延；第二次及之后的调用被忽略。
    pub fn call(&self, arg: NextArg) {
        let continuation = self.inner.continuation.borrow_mut().take();
        match continuation {
            Some(continuation) => continuation(arg),
            None => debug!(?arg, "next() called more than once, ignored"),
        }
    }

    pub fn proceed(&self) {
        self.call(NextArg::Proceed);
    }

    pub fn abort(&self) {
        self.call(NextArg::Confirm(false));
    }

    pub fn redirect(&self, to: impl Into<RawLocation>) {
        self.call(NextArg::Redirect(to.into()));
    }

    pub fn error(&self, error: impl Into<GuardError>) {
        self.call(NextArg::Error(error.into()));
    }

    pub fn value(&self, value: impl Into<Value>) {
        self.call(NextArg::Value(value.into()));
    }

    /// 进入守卫中使用：组件实例挂载后执行 `cb`。
    pub fn entered(&self, cb: impl Fn(&ViewInstance) + 'static) {
        self.call(NextArg::Entered(Rc::new(cb)));
    }

    /// 上一个守卫通过 `next.value(..)` 传下来的值。
    pub fn carried(&self) -> Option<&Value> {
        self.inner.carried.as_ref()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.continuation.borrow().is_none()
    }

    /// 丢弃续延。返回 true 表示此前尚未调用过。
    pub(crate) fn disarm(&self) -> bool {
        self.inner.continuation.borrow_mut().take().is_some()
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("settled", &self.is_settled())
            .field("carried", &self.inner.carried)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::waypoint_core::location::Location;

    #[test]
    fn only_first_call_is_honored() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let next = Next::new(None, move |_| counter.set(counter.get() + 1));

        let cloned = next.clone();
        next.proceed();
        cloned.abort();
        next.redirect("/x");

        assert_eq!(calls.get(), 1);
        assert!(next.is_settled());
        assert!(!next.disarm());
    }

    #[test]
    fn interpretation_of_arguments() {
        assert!(matches!(NextArg::Proceed.interpret(), GuardVerdict::Proceed(None)));
        assert!(matches!(
            NextArg::Confirm(false).interpret(),
            GuardVerdict::Abort(AbortReason::Aborted)
        ));
        assert!(matches!(
            NextArg::Error(GuardError::msg("x")).interpret(),
            GuardVerdict::Abort(AbortReason::Error(_))
        ));
        assert!(matches!(
            NextArg::Redirect("/login".into()).interpret(),
            GuardVerdict::Redirect(_)
        ));
        assert!(matches!(
            NextArg::Redirect(Location::default().with_hash("x").into()).interpret(),
            GuardVerdict::Proceed(Some(_))
        ));
        assert!(matches!(
            NextArg::Value(Value::from(3)).interpret(),
            GuardVerdict::Proceed(Some(_))
        ));
    }
}
