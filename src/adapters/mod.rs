//! Adapters binding the domain ports to real systems.

pub mod fs;
pub mod process;
pub mod proposers;
