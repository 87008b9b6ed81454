use std::rc::Rc;

use serde_json::Value;

/// 推进到队列中下一项的续延，参数是传给下一项的值。
pub(crate) type Step = Box<dyn FnOnce(Option<Value>)>;

/// 单项执行器：拿到当前项、上一项传下来的值和续延。不调用续延即停在这里。
pub(crate) type QueueIterator<T> = Rc<dyn Fn(&T, Option<Value>, Step)>;

/// 依次执行队列，每一项决定是否、何时推进到下一项。全部执行完后调用 `done`。
///
/// 续延可以稍后异步调用，所以这里不持有任何借用。
pub(crate) fn run_queue<T: 'static>(
    queue: Vec<T>,
    iterator: QueueIterator<T>,
    done: Box<dyn FnOnce()>,
) {
    step(Rc::new(queue), 0, None, iterator, done);
}

fn step<T: 'static>(
    queue: Rc<Vec<T>>,
    index: usize,
    carried: Option<Value>,
    iterator: QueueIterator<T>,
    done: Box<dyn FnOnce()>,
) {
    let Some(item) = queue.get(index) else {
        done();
        return;
    };

    let rest = queue.clone();
    let it = iterator.clone();
    iterator(
        item,
        carried,
        Box::new(move |value| step(rest, index + 1, value, it, done)),
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn items_run_in_order_and_thread_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let iterator: QueueIterator<i64> = Rc::new(move |item, carried, next| {
            log.borrow_mut().push((*item, carried.clone()));
            next(Some(Value::from(*item * 10)));
        });

        let finished = Rc::new(RefCell::new(false));
        let flag = finished.clone();
        run_queue(vec![1, 2, 3], iterator, Box::new(move || *flag.borrow_mut() = true));

        assert!(*finished.borrow());
        assert_eq!(
            *seen.borrow(),
            vec![
                (1, None),
                (2, Some(Value::from(10))),
                (3, Some(Value::from(20))),
            ]
        );
    }

    #[test]
    fn stalled_item_stops_the_queue_until_resumed() {
        let parked: Rc<RefCell<Option<Step>>> = Rc::new(RefCell::new(None));
        let slot = parked.clone();
        let ran = Rc::new(RefCell::new(Vec::new()));
        let log = ran.clone();
        let iterator: QueueIterator<&'static str> = Rc::new(move |item, _, next| {
            log.borrow_mut().push(*item);
            if *item == "wait" {
                *slot.borrow_mut() = Some(next);
            } else {
                next(None);
            }
        });

        let finished = Rc::new(RefCell::new(false));
        let flag = finished.clone();
        run_queue(vec!["a", "wait", "b"], iterator, Box::new(move || *flag.borrow_mut() = true));
        assert_eq!(*ran.borrow(), ["a", "wait"]);
        assert!(!*finished.borrow());

        let resume = parked.borrow_mut().take().unwrap();
        resume(None);
        assert_eq!(*ran.borrow(), ["a", "wait", "b"]);
        assert!(*finished.borrow());
    }
}
