use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::waypoint_core::route::Route;

/// 路由表构建期的致命配置错误。
///
/// 其余问题（重名、缺少前导 `/`、未编码字符等）只通过 `tracing::warn!` 诊断，不会中断构建。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 路由配置缺少 `path`。
    #[error("\"path\" is required in a route configuration (name: {name:?})")]
    MissingPath { name: Option<String> },

    /// 组件以字符串 id 给出，而不是真正的组件引用。
    #[error(
        "route config \"component\" for path: {path} cannot be a string id `{id}`. \
         Use an actual component instead"
    )]
    StringComponent { path: String, id: String },

    /// 路径模板无法编译成正则。
    #[error("invalid path pattern \"{path}\": {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// 单次匹配失败：只影响这一次导航，不影响路由表。
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// 填充路径模板时缺少必填参数。
    #[error("missing param for {context}: expected \"{param}\" to be defined")]
    MissingParam { context: String, param: String },

    /// 参数值与段的模式不符。
    #[error(
        "missing param for {context}: expected \"{param}\" to match \"{pattern}\", \
         but received \"{value}\""
    )]
    ParamMismatch {
        context: String,
        param: String,
        pattern: String,
        value: String,
    },

    /// 段模式本身无法编译。
    #[error("invalid pattern \"{pattern}\" for {context}: {source}")]
    InvalidPattern {
        context: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 用户提供的重定向函数返回了错误。
    #[error("redirect function failed: {0}")]
    Redirect(#[source] GuardError),

    /// 重定向链过长（通常是 a -> b -> a 的环）。
    #[error("redirect limit exceeded while resolving \"{path}\"")]
    RedirectLimit { path: String },
}

/// 用户代码（守卫、异步组件工厂、重定向函数）抛出的错误。
///
/// 内部是 `Rc<anyhow::Error>`：同一个错误需要同时投递给 `on_abort`、
/// 全局错误监听以及 ready-error 回调，所以要求可廉价克隆。
#[derive(Clone)]
pub struct GuardError(Rc<anyhow::Error>);

impl GuardError {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        GuardError(Rc::new(error.into()))
    }

    pub fn msg(message: impl fmt::Display) -> Self {
        GuardError(Rc::new(anyhow::anyhow!("{message}")))
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for GuardError {
    fn from(error: anyhow::Error) -> Self {
        GuardError(Rc::new(error))
    }
}

/// 导航失败的种类。
///
/// 这四种都是"预期内"的结果：只通过 `on_abort` 投递，不进入全局错误监听。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationFailureType {
    /// 守卫把导航重定向到别处（随后会自动发起新导航）。
    Redirected,
    /// 守卫调用了 `next(false)`。
    Aborted,
    /// 被更新的一次导航取代。
    Cancelled,
    /// 目标与当前路由相同。
    Duplicated,
}

/// 一次"软失败"的导航。
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NavigationFailure {
    pub kind: NavigationFailureType,
    pub from: Rc<Route>,
    pub to: Rc<Route>,
    pub message: String,
}

impl NavigationFailure {
    pub(crate) fn redirected(from: Rc<Route>, to: Rc<Route>) -> Self {
        let message = format!(
            "Redirected when going from \"{}\" to \"{}\" via a navigation guard.",
            from.full_path, to.full_path
        );
        Self::new(NavigationFailureType::Redirected, from, to, message)
    }

    pub(crate) fn duplicated(from: Rc<Route>, to: Rc<Route>) -> Self {
        let message = format!(
            "Avoided redundant navigation to current location: \"{}\".",
            from.full_path
        );
        Self::new(NavigationFailureType::Duplicated, from, to, message)
    }

    pub(crate) fn cancelled(from: Rc<Route>, to: Rc<Route>) -> Self {
        let message = format!(
            "Navigation cancelled from \"{}\" to \"{}\" with a new navigation.",
            from.full_path, to.full_path
        );
        Self::new(NavigationFailureType::Cancelled, from, to, message)
    }

    pub(crate) fn aborted(from: Rc<Route>, to: Rc<Route>) -> Self {
        let message = format!(
            "Navigation aborted from \"{}\" to \"{}\" via a navigation guard.",
            from.full_path, to.full_path
        );
        Self::new(NavigationFailureType::Aborted, from, to, message)
    }

    fn new(kind: NavigationFailureType, from: Rc<Route>, to: Rc<Route>, message: String) -> Self {
        Self {
            kind,
            from,
            to,
            message,
        }
    }
}

/// `on_abort` / 导航 future 收到的错误。
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    /// 预期内的软失败（aborted / cancelled / redirected / duplicated）。
    #[error(transparent)]
    Failure(#[from] NavigationFailure),

    /// 守卫或异步组件抛出的错误。
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// 目标无法匹配（缺参数、重定向函数出错）。
    #[error(transparent)]
    Match(#[from] MatchError),

    /// 路由器在导航结束前被销毁。
    #[error("navigation was dropped before it settled")]
    Interrupted,
}

impl NavigationError {
    pub fn failure(&self) -> Option<&NavigationFailure> {
        match self {
            NavigationError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_failure_of(&self, kind: NavigationFailureType) -> bool {
        self.failure().is_some_and(|f| f.kind == kind)
    }
}

/// 判断错误是否是导航软失败；`kind` 为 `None` 时任意种类都算。
pub fn is_navigation_failure(error: &NavigationError, kind: Option<NavigationFailureType>) -> bool {
    match (error.failure(), kind) {
        (Some(failure), Some(kind)) => failure.kind == kind,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
