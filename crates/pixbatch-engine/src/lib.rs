//! pixbatch engine crate.
//!
//! Immediate-mode point, line and sprite batching on top of a small
//! bind-then-draw graphics interface, plus the window/GPU runtime that hosts it.
//!
//! Layers, bottom up:
//! - [`gfx`]: the [`gfx::GraphicsBackend`] trait, a wgpu implementation and a recording one
//! - [`render`]: batches and the frame controller ([`render::Renderer`])
//! - [`device`], [`window`], [`core`]: winit window, wgpu surface and the app loop

pub mod config;
pub mod coords;
pub mod error;
pub mod gfx;
pub mod logging;
pub mod paint;
pub mod render;

pub mod core;
pub mod device;
pub mod window;

pub use config::RendererConfig;
pub use error::{ConfigError, FrameError, GfxError};
pub use paint::PackedColor;
pub use render::Renderer;
