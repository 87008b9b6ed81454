mod hash;
mod html5;
mod memory;
mod mode;
mod platform;
mod state;

pub(crate) use hash::*;
pub(crate) use html5::*;
pub(crate) use memory::*;
pub(crate) use mode::*;
pub use platform::*;
pub(crate) use state::*;
