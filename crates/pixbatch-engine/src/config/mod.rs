//! Renderer configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! overrides:
//!
//! ```toml
//! sprite_size = 16
//! max_points = 4096
//!
//! [canvas]
//! width = 320
//! height = 240
//! ```

mod loader;
mod schema;
mod validation;

pub use loader::{from_toml_str, load_from_path};
pub use schema::RendererConfig;
pub use validation::validate;
