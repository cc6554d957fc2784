pub mod ablate;
pub mod analyze;
pub mod batch;
pub mod dispatch;
pub mod judge;

pub use dispatch::dispatch;
