//! Unified exit codes. Part of the CLI contract; scripts poll on them.

pub const SUCCESS: i32 = 0;
/// Some items failed but everything that could be written was written.
pub const RUNTIME_FAILURE: i32 = 1;
/// Bad arguments, unknown names, unreadable config. Nothing was written.
pub const CONFIG_ERROR: i32 = 2;
