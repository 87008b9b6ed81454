use std::fmt;
use std::rc::Rc;

/// 平台发出的外部导航通知。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformEvent {
    /// 历史记录前进 / 后退（`popstate`）。
    PopState,
    /// URL fragment 变化（`hashchange`）。
    HashChange,
}

/// 浏览器 history / location 的端口。
///
/// hash 与 html5 两种模式只通过这个 trait 读写平台 URL，
/// 不同宿主（wasm 浏览器绑定、webview 桥、测试替身）各自实现。
pub trait PlatformHistory {
    /// 完整 URL，如 `https://host/app/#/a?b=1`。
    fn href(&self) -> String;

    /// URL 的 path 部分，以 `/` 开头。
    fn pathname(&self) -> String;

    /// URL 的 query 部分，含 `?`，没有时为空串。
    fn search(&self) -> String;

    /// URL 的 fragment 部分，含 `#`，没有时为空串。
    fn hash(&self) -> String;

    /// 平台是否支持 `pushState` / `replaceState`。
    fn supports_push_state(&self) -> bool {
        true
    }

    /// 新增一条历史记录。`url` 可以是绝对 URL 或以 `/` 开头的路径。
    fn push_state(&self, url: &str);

    /// 替换当前历史记录。
    fn replace_state(&self, url: &str);

    /// 不支持 pushState 时：直接赋值 `location.hash`（会产生一条历史记录）。
    fn assign_hash(&self, path: &str);

    /// 不支持 pushState 时：`location.replace(url)`。
    fn location_replace(&self, url: &str);

    /// 在历史记录中移动 `n` 步。平台稍后以 [`PlatformEvent::PopState`] 通知结果。
    fn go(&self, n: isize);

    /// 订阅外部导航通知。丢弃返回的 [`Subscription`] 即取消订阅。
    fn subscribe(&self, event: PlatformEvent, handler: Rc<dyn Fn()>) -> Subscription;

    /// 可选：返回一个描述性名称，用于调试。
    fn name(&self) -> &str {
        "platform"
    }
}

/// 外部监听的注销句柄，drop 时注销。
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn subscription_unsubscribes_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        Subscription::new(move || counter.set(counter.get() + 1)).unsubscribe();
        assert_eq!(calls.get(), 1);

        let counter = calls.clone();
        drop(Subscription::new(move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 2);
    }
}
