use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::waypoint_core::component::{ComponentSlot, EnteredCallback, ViewInstance};
use crate::waypoint_core::guard::NavigationGuard;
use crate::waypoint_core::route::{PathPattern, PropsConfig, Redirect, Route};
use crate::waypoint_core::types::{Meta, RecordId};

/// 编译后的路由记录。
///
/// 路径、正则、名字、父指针等在构建后不再变化；
/// 只有 `components`（异步组件解析后回写）、`instances`、`entered_cbs` 会变。
pub struct RouteRecord {
    /// arena 中的位置。
    pub id: RecordId,

    /// 规范化后的绝对路径模板。
    pub path: String,

    pub pattern: PathPattern,

    pub(crate) components: RefCell<BTreeMap<String, ComponentSlot>>,

    pub alias: Vec<String>,

    pub(crate) instances: RefCell<BTreeMap<String, ViewInstance>>,

    pub(crate) entered_cbs: RefCell<BTreeMap<String, Vec<EnteredCallback>>>,

    pub name: Option<String>,

    /// 向上的父指针（arena 下标）。
    pub parent: Option<RecordId>,

    /// 别名记录指向的目标路径模板。
    pub match_as: Option<String>,

    pub redirect: Option<Redirect>,

    pub before_enter: Option<Rc<dyn NavigationGuard>>,

    pub meta: Meta,

    pub props: BTreeMap<String, PropsConfig>,
}

impl RouteRecord {
    /// 各槽位组件的快照。
    pub fn components(&self) -> BTreeMap<String, ComponentSlot> {
        self.components.borrow().clone()
    }

    pub fn component(&self, slot: &str) -> Option<ComponentSlot> {
        self.components.borrow().get(slot).cloned()
    }

    pub fn instance(&self, slot: &str) -> Option<ViewInstance> {
        self.instances.borrow().get(slot).cloned()
    }

    pub fn has_entered_callbacks(&self) -> bool {
        self.entered_cbs.borrow().values().any(|cbs| !cbs.is_empty())
    }

    pub(crate) fn set_component(&self, slot: &str, component: ComponentSlot) {
        self.components.borrow_mut().insert(slot.to_owned(), component);
    }

    pub(crate) fn queue_entered(&self, slot: &str, cb: EnteredCallback) {
        self.entered_cbs
            .borrow_mut()
            .entry(slot.to_owned())
            .or_default()
            .push(cb);
    }

    pub(crate) fn take_entered(&self, slot: &str) -> Vec<EnteredCallback> {
        self.entered_cbs
            .borrow_mut()
            .remove(slot)
            .unwrap_or_default()
    }

    /// 计算某个槽位的 props。
    ///
    /// - 没有配置或 `Flag(false)`：`None`；
    /// - `Flag(true)`：route.params 组成的对象；
    /// - `Static`：原样返回；
    /// - `Dynamic`：调用函数。
    pub fn resolve_props(&self, slot: &str, route: &Route) -> Option<Value> {
        match self.props.get(slot)? {
            PropsConfig::Flag(false) => None,
            PropsConfig::Flag(true) => Some(Value::Object(
                route
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            PropsConfig::Static(map) => Some(Value::Object(map.clone())),
            PropsConfig::Dynamic(f) => Some(f(route)),
        }
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("match_as", &self.match_as)
            .field("alias", &self.alias)
            .field("redirect", &self.redirect)
            .field("components", &self.components.borrow().keys().collect::<Vec<_>>())
            .field("instances", &self.instances.borrow().keys().collect::<Vec<_>>())
            .field("meta", &self.meta)
            .finish()
    }
}
