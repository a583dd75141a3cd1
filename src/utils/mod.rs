//! Utility functions and helpers.

pub mod http;
pub mod retry;
pub mod shutdown;

pub use retry::RetryPolicy;
pub use shutdown::Shutdown;
