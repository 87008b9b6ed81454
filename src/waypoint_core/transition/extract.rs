use std::rc::Rc;

use crate::waypoint_core::component::{Component, ViewInstance};
use crate::waypoint_core::guard::{GuardResult, InstanceGuard, NavigationGuard, Next, NextArg};
use crate::waypoint_core::route::{Route, RouteRecord};

/// 绑定到视图实例的 update / leave 守卫。
pub(crate) struct BoundGuard {
    guard: Rc<dyn InstanceGuard>,
    instance: ViewInstance,
}

impl NavigationGuard for BoundGuard {
    fn run(&self, to: &Route, from: &Route, next: Next) -> GuardResult {
        self.guard.run(&self.instance, to, from, next)
    }

    fn name(&self) -> &str {
        self.guard.name()
    }
}

/// 组件进入守卫：拦截 `next.entered(cb)`，把回调挂到记录的槽位上，然后放行。
pub(crate) struct EnterGuard {
    guard: Rc<dyn NavigationGuard>,
    record: Rc<RouteRecord>,
    slot: String,
}

impl NavigationGuard for EnterGuard {
    fn run(&self, to: &Route, from: &Route, next: Next) -> GuardResult {
        let record = self.record.clone();
        let slot = self.slot.clone();
        let outer = next.clone();
        let inner = Next::new(next.carried().cloned(), move |arg| {
            if let NextArg::Entered(cb) = &arg {
                record.queue_entered(&slot, cb.clone());
            }
            outer.call(arg);
        });

        let result = self.guard.run(to, from, inner.clone());
        if result.is_err() && !inner.is_settled() {
            // 外层 next 由调用方处理错误，先让内层失效
            inner.disarm();
        }
        result
    }

    fn name(&self) -> &str {
        self.guard.name()
    }
}

/// 按「记录 -> 槽位」展开已可用的组件，附带该槽位当前挂载的实例。
fn flat_map_components<T>(
    records: &[Rc<RouteRecord>],
    mut f: impl FnMut(&Rc<Component>, Option<ViewInstance>, &Rc<RouteRecord>, &str) -> Vec<T>,
) -> Vec<Vec<T>> {
    let mut groups = Vec::new();
    for record in records {
        for (slot, component) in record.components() {
            if let Some(component) = component.resolved() {
                groups.push(f(&component, record.instance(&slot), record, &slot));
            }
        }
    }
    groups
}

/// 离开守卫：叶到根（按组件分组后整体反转）。没有实例的组件不参与。
pub(crate) fn extract_leave_guards(
    deactivated: &[Rc<RouteRecord>],
) -> Vec<Rc<dyn NavigationGuard>> {
    let mut groups = flat_map_components(deactivated, |component, instance, _, _| {
        bind_instance_guards(component.leave_guards(), instance)
    });
    groups.reverse();
    groups.into_iter().flatten().collect()
}

/// 复用守卫：根到叶。没有实例的组件不参与。
pub(crate) fn extract_update_guards(updated: &[Rc<RouteRecord>]) -> Vec<Rc<dyn NavigationGuard>> {
    flat_map_components(updated, |component, instance, _, _| {
        bind_instance_guards(component.update_guards(), instance)
    })
    .into_iter()
    .flatten()
    .collect()
}

/// 组件进入守卫：根到叶，必须在异步组件解析完成之后提取。
pub(crate) fn extract_enter_guards(activated: &[Rc<RouteRecord>]) -> Vec<Rc<dyn NavigationGuard>> {
    flat_map_components(activated, |component, _, record, slot| {
        component
            .enter_guards()
            .iter()
            .map(|guard| {
                Rc::new(EnterGuard {
                    guard: guard.clone(),
                    record: record.clone(),
                    slot: slot.to_owned(),
                }) as Rc<dyn NavigationGuard>
            })
            .collect()
    })
    .into_iter()
    .flatten()
    .collect()
}

/// 记录级 `before_enter`：根到叶。
pub(crate) fn extract_before_enter(activated: &[Rc<RouteRecord>]) -> Vec<Rc<dyn NavigationGuard>> {
    activated
        .iter()
        .filter_map(|record| record.before_enter.clone())
        .collect()
}

fn bind_instance_guards(
    guards: &[Rc<dyn InstanceGuard>],
    instance: Option<ViewInstance>,
) -> Vec<Rc<dyn NavigationGuard>> {
    let Some(instance) = instance else {
        return Vec::new();
    };
    guards
        .iter()
        .map(|guard| {
            Rc::new(BoundGuard {
                guard: guard.clone(),
                instance: instance.clone(),
            }) as Rc<dyn NavigationGuard>
        })
        .collect()
}
