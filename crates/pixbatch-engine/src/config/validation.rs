//! Range checks applied after parsing.

use crate::coords::Extent;
use crate::error::ConfigError;
use crate::render::INDICES_PER_QUAD;

use super::schema::RendererConfig;

/// Collects every violation and reports them together.
pub fn validate(config: &RendererConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_extent(&mut errors, "canvas", config.canvas);
    validate_extent(&mut errors, "atlas", config.atlas);

    if config.sprite_size == 0 {
        errors.push("sprite_size must be non-zero".into());
    } else if config.sprite_size > config.atlas.width || config.sprite_size > config.atlas.height {
        errors.push(format!(
            "sprite_size {} does not fit the {}x{} atlas",
            config.sprite_size, config.atlas.width, config.atlas.height
        ));
    }
    validate_capacity(&mut errors, "max_points", config.max_points);
    validate_capacity(&mut errors, "max_line_vertices", config.max_line_vertices);
    validate_capacity(&mut errors, "max_quads", config.max_quads);

    if config.max_line_vertices % 2 != 0 {
        errors.push(format!(
            "max_line_vertices must be even, got {}",
            config.max_line_vertices
        ));
    }

    // Draw counts are u32: vertices for points and lines, indices for quads.
    validate_draw_count(&mut errors, "max_points", config.max_points as u64);
    validate_draw_count(&mut errors, "max_line_vertices", config.max_line_vertices as u64);
    let quad_indices = config.max_quads as u64 * INDICES_PER_QUAD as u64;
    if quad_indices > u32::MAX as u64 {
        errors.push(format!(
            "max_quads = {} needs {quad_indices} indices, more than a 32-bit draw count",
            config.max_quads
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_extent(errors: &mut Vec<String>, name: &str, extent: Extent) {
    if !extent.is_valid() {
        errors.push(format!(
            "{name} must be non-zero, got {}x{}",
            extent.width, extent.height
        ));
    }
}

fn validate_draw_count(errors: &mut Vec<String>, name: &str, count: u64) {
    if count > u32::MAX as u64 {
        errors.push(format!("{name} = {count} exceeds a 32-bit draw count"));
    }
}

fn validate_capacity(errors: &mut Vec<String>, name: &str, value: usize) {
    if value == 0 {
        errors.push(format!("{name} must be non-zero"));
    }
}
