use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::waypoint_core::component::ComponentSlot;
use crate::waypoint_core::guard::NavigationGuard;
use crate::waypoint_core::location::{Location, RawLocation};
use crate::waypoint_core::route::Route;
use crate::waypoint_core::types::{Meta, DEFAULT_VIEW};

type RedirectFn = dyn Fn(&Route) -> anyhow::Result<RawLocation>;
type PropsFn = dyn Fn(&Route) -> Value;

/// 重定向目标。
#[derive(Clone)]
pub enum Redirect {
    /// 路径字符串，相对路径按父记录的路径解析。
    Path(String),
    /// 位置对象（path 或 name 形式）。
    Location(Location),
    /// 运行时计算，参数是「本应匹配到的」路由。
    Dynamic(Rc<RedirectFn>),
}

impl Redirect {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Route) -> anyhow::Result<RawLocation> + 'static,
    {
        Redirect::Dynamic(Rc::new(f))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Redirect::Location(location) => f.debug_tuple("Location").field(location).finish(),
            Redirect::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<&str> for Redirect {
    fn from(path: &str) -> Self {
        Redirect::Path(path.to_owned())
    }
}

impl From<String> for Redirect {
    fn from(path: String) -> Self {
        Redirect::Path(path)
    }
}

impl From<Location> for Redirect {
    fn from(location: Location) -> Self {
        Redirect::Location(location)
    }
}

/// 把路由信息作为 props 传给视图的方式。
#[derive(Clone)]
pub enum PropsConfig {
    /// `true`：把 params 作为 props；`false`：不传。
    Flag(bool),
    /// 固定对象。
    Static(Map<String, Value>),
    /// 由路由计算。
    Dynamic(Rc<PropsFn>),
}

impl PropsConfig {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Route) -> Value + 'static,
    {
        PropsConfig::Dynamic(Rc::new(f))
    }
}

impl fmt::Debug for PropsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsConfig::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            PropsConfig::Static(map) => f.debug_tuple("Static").field(map).finish(),
            PropsConfig::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// 声明式路由配置，编译成 [`RouteRecord`](crate::RouteRecord)。
///
/// ```ignore
/// RouteConfig::new("/user/:id")
///     .name("user")
///     .component(Component::new("User"))
///     .child(RouteConfig::new("profile").component(Component::new("Profile")))
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
    /// `None` 在编译时报 [`ConfigError::MissingPath`](crate::ConfigError::MissingPath)。
    pub path: Option<String>,
    pub name: Option<String>,
    pub components: BTreeMap<String, ComponentSlot>,
    pub redirect: Option<Redirect>,
    pub alias: Vec<String>,
    pub children: Vec<RouteConfig>,
    pub before_enter: Option<Rc<dyn NavigationGuard>>,
    pub meta: Meta,
    pub props: BTreeMap<String, PropsConfig>,
    /// 不设置时大小写不敏感。
    pub case_sensitive: Option<bool>,
    /// 末尾 `/` 是否有意义。
    pub strict: bool,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 默认槽位的组件。
    pub fn component(self, component: impl Into<ComponentSlot>) -> Self {
        self.named_component(DEFAULT_VIEW, component)
    }

    pub fn named_component(
        mut self,
        slot: impl Into<String>,
        component: impl Into<ComponentSlot>,
    ) -> Self {
        self.components.insert(slot.into(), component.into());
        self
    }

    pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn before_enter(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.before_enter = Some(Rc::new(guard));
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// 默认槽位的 props 配置。
    pub fn props(self, props: PropsConfig) -> Self {
        self.named_props(DEFAULT_VIEW, props)
    }

    pub fn named_props(mut self, slot: impl Into<String>, props: PropsConfig) -> Self {
        self.props.insert(slot.into(), props);
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("redirect", &self.redirect)
            .field("alias", &self.alias)
            .field("children", &self.children)
            .field("before_enter", &self.before_enter.as_ref().map(|g| g.name().to_owned()))
            .field("meta", &self.meta)
            .field("case_sensitive", &self.case_sensitive)
            .field("strict", &self.strict)
            .finish()
    }
}
