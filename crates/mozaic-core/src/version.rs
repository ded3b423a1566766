/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns a formatted version string including the plugin it ships.
#[must_use]
pub fn version_string() -> String {
    format!(
        "mozaic {VERSION} ({}! plugin {})",
        crate::transform::PLUGIN_NAME,
        crate::transform::PLUGIN_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("mozaic "));
        assert!(vs.contains("cs! plugin"));
    }
}
