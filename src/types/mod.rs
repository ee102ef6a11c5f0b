// ABOUTME: Validated domain types shared across modules.
// ABOUTME: Construction is the only way to obtain a value, so invalid states are unrepresentable.

mod port;

pub use port::{Port, PortError};
