//! TOML loading.

use std::path::Path;

use crate::error::ConfigError;

use super::schema::RendererConfig;
use super::validation;

/// Parses `text`, filling missing fields from [`RendererConfig::default`].
pub fn from_toml_str(text: &str) -> Result<RendererConfig, ConfigError> {
    let config: RendererConfig = toml::from_str(text)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Loads a config file. Unlike a missing field, a missing file is an error.
pub fn load_from_path(path: &Path) -> Result<RendererConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = from_toml_str(&content)?;
    log::info!("loaded renderer config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Extent;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(from_toml_str("").unwrap(), RendererConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let cfg = from_toml_str(
            r#"
            max_points = 2

            [canvas]
            width = 128
            height = 192
            "#,
        )
        .unwrap();
        assert_eq!(cfg.canvas, Extent::new(128, 192));
        assert_eq!(cfg.max_points, 2);
        assert_eq!(cfg.max_quads, RendererConfig::default().max_quads);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = from_toml_str("max_sprites = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = from_toml_str("max_line_vertices = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("pixbatch-does-not-exist.toml");
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(p) if p == path));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("pixbatch-cfg-{}.toml", std::process::id()));
        std::fs::write(&path, "sprite_size = 16\n").unwrap();
        let cfg = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.unwrap().sprite_size, 16);
    }
}
