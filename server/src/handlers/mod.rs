//! Request handlers for the resource lists and accounts.

mod register;
mod resources;

pub use register::*;
pub use resources::*;
