//! # waypoint
//!
//! 声明式路由表 + 可取消的导航事务引擎。
//!
//! - 路由表编译：嵌套路由 / 动态段 / 别名 / 重定向 / 通配符；
//! - Matcher：把 path / 命名目标 / 相对参数等导航意图解析成完整的 [`Route`]；
//! - Transition：按固定顺序执行守卫队列、异步组件解析，并保证只有最新一次导航能提交；
//! - History：hash / html5 / memory 三种持久化策略，
//!   浏览器相关调用通过 [`PlatformHistory`] 端口注入。
//!
//! 渲染层（视图树、链接元素、滚动恢复）不在本 crate 范围内，只通过
//! [`Router::register_instance`] / [`Router::notify_tick`] 等回调与核心交互。

mod waypoint_core;

pub use waypoint_core::*;
