// Engine library root
// This file declares the modules for the engine crate.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod notify;
pub mod sentiment;
pub mod services;
