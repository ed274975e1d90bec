//! GPU device + window surface.
//!
//! This module is responsible for:
//! - acquiring the wgpu Device/Queue for a window
//! - configuring the Surface (swapchain)
//! - handing frames to the renderer and presenting them
//!
//! Failing to acquire an adapter or device is fatal; the runtime exits with
//! the error.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
