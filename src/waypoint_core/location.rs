mod normalize;
mod path;
mod query;
mod raw;

pub use normalize::*;
pub use path::*;
pub use query::*;
pub use raw::*;
