use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct Entries<T: ?Sized> {
    next_id: u64,
    hooks: Vec<(u64, Rc<T>)>,
}

/// 按注册顺序保存的钩子列表。
///
/// 注册返回 [`HookHandle`]；执行时先取快照，钩子在执行中注销自己不会影响本轮。
pub struct HookList<T: ?Sized> {
    entries: Rc<RefCell<Entries<T>>>,
}

impl<T: ?Sized + 'static> HookList<T> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Entries {
                next_id: 0,
                hooks: Vec::new(),
            })),
        }
    }

    pub fn register(&self, hook: Rc<T>) -> HookHandle {
        let id = {
            let mut entries = self.entries.borrow_mut();
            let id = entries.next_id;
            entries.next_id += 1;
            entries.hooks.push((id, hook));
            id
        };

        let weak: Weak<RefCell<Entries<T>>> = Rc::downgrade(&self.entries);
        HookHandle {
            remove: Some(Box::new(move || {
                if let Some(entries) = weak.upgrade() {
                    entries.borrow_mut().hooks.retain(|(hook_id, _)| *hook_id != id);
                }
            })),
        }
    }

    pub fn snapshot(&self) -> Vec<Rc<T>> {
        self.entries
            .borrow()
            .hooks
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for HookList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for HookList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookList")
            .field("len", &self.entries.borrow().hooks.len())
            .finish()
    }
}

/// 注销句柄。丢弃句柄不会注销钩子，需要显式调用 [`HookHandle::remove`]。
pub struct HookHandle {
    remove: Option<Box<dyn FnOnce()>>,
}

impl HookHandle {
    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("armed", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_remove_keep_order() {
        let list: HookList<dyn Fn() -> u8> = HookList::new();
        let _a = list.register(Rc::new(|| 1));
        let b = list.register(Rc::new(|| 2));
        let _c = list.register(Rc::new(|| 3));

        b.remove();
        let values: Vec<u8> = list.snapshot().iter().map(|hook| hook()).collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn handle_outliving_list_is_harmless() {
        let list: HookList<dyn Fn()> = HookList::new();
        let handle = list.register(Rc::new(|| {}));
        drop(list);
        handle.remove();
    }
}
