mod handle;
mod options;
mod shared;

pub use handle::*;
pub use options::*;
pub(crate) use shared::*;
