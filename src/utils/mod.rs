//! Process-level helpers.

pub mod process_guard;

pub use process_guard::ProcessGuard;
