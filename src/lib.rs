//! Forward projection of age-structured fish stocks.
//!
//! The solver and its data types live in `stockfwd-core`; stock-recruitment models and the
//! helpers that prepare a stock for projection live in `stockfwd-components`. Both are
//! re-exported here together with the TOML [`scenario`] layer.

pub use stockfwd_components as components;
pub use stockfwd_core::{control, dynamics, errors, quantity, recruitment, solver, timeline};

pub mod scenario;
