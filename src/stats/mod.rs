//! Stats source modules.

pub mod client;

pub use client::*;
