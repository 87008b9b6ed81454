mod config;
mod pattern;
mod record;
mod resolved;
mod table;

pub use config::*;
pub use pattern::*;
pub use record::*;
pub use resolved::*;
pub use table::*;
