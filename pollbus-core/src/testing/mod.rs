//! Host-side test doubles

pub mod sim;

pub use sim::{Event, SimController, Violation};
