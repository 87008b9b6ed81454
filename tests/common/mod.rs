//! Shared test doubles: an in-process browser history and a few route fixtures.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use waypoint::{PlatformEvent, PlatformHistory, Subscription};

pub const ORIGIN: &str = "https://app.test";

type Handler = (u64, PlatformEvent, Rc<dyn Fn()>);

/// A browser session: an entry list with a cursor, pushState support toggle,
/// event handlers and a log of every write the router performs.
pub struct FakeBrowser {
    entries: RefCell<Vec<String>>,
    index: Cell<usize>,
    push_state: bool,
    handlers: Rc<RefCell<Vec<Handler>>>,
    next_id: Cell<u64>,
    calls: RefCell<Vec<String>>,
}

impl FakeBrowser {
    /// `url` is a path such as `/app/users?x=1#top`.
    pub fn at(url: &str) -> Rc<Self> {
        Self::build(url, true)
    }

    /// A browser without pushState / replaceState.
    pub fn legacy(url: &str) -> Rc<Self> {
        Self::build(url, false)
    }

    fn build(url: &str, push_state: bool) -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(vec![url.to_owned()]),
            index: Cell::new(0),
            push_state,
            handlers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        })
    }

    pub fn as_platform(self: &Rc<Self>) -> Rc<dyn PlatformHistory> {
        self.clone()
    }

    /// Current entry as a path (`/app/#/a`).
    pub fn url(&self) -> String {
        self.entries.borrow()[self.index.get()].clone()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// The user follows an in-page link to `url`: a new entry plus the events a browser fires.
    pub fn visit(&self, url: &str) {
        self.push_entry(url.to_owned());
        self.fire(PlatformEvent::PopState);
        self.fire(PlatformEvent::HashChange);
    }

    pub fn fire(&self, event: PlatformEvent) {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn push_entry(&self, url: String) {
        let mut entries = self.entries.borrow_mut();
        entries.truncate(self.index.get() + 1);
        entries.push(url);
        self.index.set(entries.len() - 1);
    }

    fn replace_entry(&self, url: String) {
        self.entries.borrow_mut()[self.index.get()] = url;
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn split(&self) -> (String, String, String) {
        let url = self.url();
        let (rest, hash) = match url.find('#') {
            Some(i) => (url[..i].to_owned(), url[i..].to_owned()),
            None => (url.clone(), String::new()),
        };
        let (path, search) = match rest.find('?') {
            Some(i) => (rest[..i].to_owned(), rest[i..].to_owned()),
            None => (rest, String::new()),
        };
        (path, search, hash)
    }
}

fn strip_origin(url: &str) -> String {
    url.strip_prefix(ORIGIN).unwrap_or(url).to_owned()
}

impl PlatformHistory for FakeBrowser {
    fn href(&self) -> String {
        format!("{ORIGIN}{}", self.url())
    }

    fn pathname(&self) -> String {
        self.split().0
    }

    fn search(&self) -> String {
        self.split().1
    }

    fn hash(&self) -> String {
        self.split().2
    }

    fn supports_push_state(&self) -> bool {
        self.push_state
    }

    fn push_state(&self, url: &str) {
        let url = strip_origin(url);
        self.record(format!("push {url}"));
        self.push_entry(url);
    }

    fn replace_state(&self, url: &str) {
        let url = strip_origin(url);
        self.record(format!("replace {url}"));
        self.replace_entry(url);
    }

    fn assign_hash(&self, path: &str) {
        self.record(format!("assign #{path}"));
        let (path_part, search, _) = self.split();
        self.push_entry(format!("{path_part}{search}#{path}"));
    }

    fn location_replace(&self, url: &str) {
        let url = strip_origin(url);
        self.record(format!("location.replace {url}"));
        self.replace_entry(url);
    }

    fn go(&self, n: isize) {
        let target = self.index.get() as isize + n;
        if target < 0 || target as usize >= self.entries.borrow().len() {
            return;
        }
        self.index.set(target as usize);
        self.fire(PlatformEvent::PopState);
    }

    fn subscribe(&self, event: PlatformEvent, handler: Rc<dyn Fn()>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, event, handler));

        let handlers = Rc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.borrow_mut().retain(|(handler_id, _, _)| *handler_id != id);
            }
        })
    }

    fn name(&self) -> &str {
        "fake_browser"
    }
}
