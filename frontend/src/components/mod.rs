//! UI Components for the Liftsim shell.
//!
//! - [`Hero`] - Title banner
//! - [`Placeholder`] - Content placeholder

mod hero;
mod placeholder;

pub use hero::*;
pub use placeholder::*;
