//! CDP page session for interacting with a single page.

mod core;
mod dom;
mod js;

pub use self::core::PageSession;
pub(crate) use self::dom::quad_bounds;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
