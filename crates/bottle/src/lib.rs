//! Bottles: ordered, heterogeneous field records exchanged with the simulator.
//!
//! A bottle is a flat sequence of typed values (strings, integers, doubles,
//! vocabulary codes and nested lists). Commands and responses are both bottles.
//!
//! # Text form
//! ```text
//! world mk sbox 1.0 1.0 1.0 0.0 0.0 1.0 1.0 0.0 0.0
//! [ok]
//! "quoted string" (nested 1 2.5)
//! ```
//! Integers and doubles stay distinguishable: doubles always print with a
//! fractional part or an exponent.

mod text;
mod value;
mod vocab;

pub use text::ParseError;
pub use value::{Bottle, Value};
pub use vocab::Vocab;
