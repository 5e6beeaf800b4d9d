pub mod types;
pub mod queries;
mod store;

pub use types::*;
pub use queries::*;
