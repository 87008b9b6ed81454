mod diff;
mod engine;
mod extract;
mod queue;
mod resolve;

pub use diff::*;
pub(crate) use engine::*;
