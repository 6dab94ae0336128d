//! Caller authentication.

mod middleware;

pub use middleware::*;
