//! External-facing service types consumed by the runtime.

pub mod input;
