//! Freehand and shape drawing onto an off-screen canvas, with a command log that records every
//! committed stroke for syncing to peers.

pub mod app;
pub mod cmd;
pub mod command;
pub mod config;
pub mod math;
pub mod raster;
pub mod session;
pub mod surface;
pub mod sync;
