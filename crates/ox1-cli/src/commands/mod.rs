//! Command implementations.

pub mod dev;

pub use dev::execute as dev_execute;
