//! Color representation used by the batch renderer.
//!
//! Colors travel to the GPU as four normalized bytes per vertex, so the
//! canonical type is a packed `0xRRGGBBAA` word.

pub mod color;

pub use color::PackedColor;
