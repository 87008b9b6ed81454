mod component;
mod error;
mod guard;
mod history;
mod location;
mod matcher;
mod route;
mod router;
mod transition;
mod types;

pub use component::*;
pub use error::*;
pub use guard::*;
pub use history::*;
pub use location::*;
pub use matcher::*;
pub use route::*;
pub use router::*;
pub use transition::*;
pub use types::*;
