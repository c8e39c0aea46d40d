//! CLI command implementations.

pub mod batch;
pub mod budget;
pub mod ci;
pub mod fix;
pub mod init;
