pub mod types;
pub mod loader;

pub use types::*;
pub use loader::{from_env, from_vars};
