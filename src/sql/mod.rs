//! Backend-neutral statements: identifiers are fixed, values travel as parameters.

mod builder;
pub mod params;
pub mod placeholder;
pub mod timestamp;
pub use builder::*;
pub use params::*;
pub use timestamp::{format_timestamp, parse_timestamp};
