//! Core traits and types for Atari 8-bit emulation.
//!
//! The processor talks to the rest of the machine only through [`Bus`].
//! Every component can be inspected through [`Observable`] without
//! disturbing emulation state.

mod bus;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use observable::{Observable, Value};
