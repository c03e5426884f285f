//! Core utilities and shared types for the netkit tools.

pub mod table;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
