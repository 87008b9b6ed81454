mod hooks;
mod next;
mod types;

pub use hooks::*;
pub use next::*;
pub use types::*;
