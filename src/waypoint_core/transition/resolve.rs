use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::waypoint_core::component::{AsyncComponent, ComponentResolver, ComponentSlot};
use crate::waypoint_core::guard::{GuardResult, NavigationGuard, Next};
use crate::waypoint_core::route::{Route, RouteRecord};

/// 队列中的异步组件解析步骤。
///
/// 先统计所有待加载的槽位，再逐个调用工厂；全部成功后放行，
/// 第一个失败以错误中止导航，之后的结果都被忽略。
/// 解析结果写回记录，之后的导航不再调用工厂。
pub(crate) struct ResolveAsyncComponents {
    activated: Vec<Rc<RouteRecord>>,
}

impl ResolveAsyncComponents {
    pub(crate) fn new(activated: Vec<Rc<RouteRecord>>) -> Self {
        Self { activated }
    }

    fn pending_slots(&self) -> Vec<(Rc<RouteRecord>, String, AsyncComponent)> {
        let mut lazy = Vec::new();
        for record in &self.activated {
            for (slot, component) in record.components() {
                let ComponentSlot::Lazy(factory) = component else {
                    continue;
                };
                match factory.resolved() {
                    Some(ready) => record.set_component(&slot, ComponentSlot::Ready(ready)),
                    None => lazy.push((record.clone(), slot, factory)),
                }
            }
        }
        lazy
    }
}

impl NavigationGuard for ResolveAsyncComponents {
    fn run(&self, _to: &Route, _from: &Route, next: Next) -> GuardResult {
        let lazy = self.pending_slots();
        if lazy.is_empty() {
            next.proceed();
            return Ok(());
        }

        debug!(count = lazy.len(), "resolving async components");
        let remaining = Rc::new(Cell::new(lazy.len()));
        let failed = Rc::new(Cell::new(false));

        for (record, slot, factory) in lazy {
            if failed.get() {
                break;
            }
            let resolver = {
                let factory = factory.clone();
                let remaining = remaining.clone();
                let failed = failed.clone();
                let next = next.clone();
                ComponentResolver::new(move |result| match result {
                    Ok(component) => {
                        factory.remember(component.clone());
                        record.set_component(&slot, ComponentSlot::Ready(component));
                        remaining.set(remaining.get() - 1);
                        if remaining.get() == 0 && !failed.get() {
                            next.proceed();
                        }
                    }
                    Err(error) => {
                        warn!("Failed to resolve async component {slot}: {error}");
                        if !failed.replace(true) {
                            next.error(error);
                        }
                    }
                })
            };

            if let Err(error) = factory.load(resolver.clone()) {
                resolver.reject(error);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "resolve_async_components"
    }
}
