//! Host loader contract and an in-process module registry.
//!
//! The transformer needs three things from the surrounding module loader:
//! name-to-URL resolution, registration of a module from text, and a
//! re-request of a module so the loader resolves its dependencies. Any loader
//! can supply them through [`HostLoader`]; [`ModuleRegistry`] is the one used
//! by the CLI and the tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Error reported by the host loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("cannot resolve module name `{0}`")]
    Unresolvable(String),

    #[error("module `{0}` is not defined")]
    NotDefined(String),

    #[error("{0}")]
    Other(String),
}

/// A module as returned by the loader after its dependencies resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub name: String,
    pub text: String,
}

/// What the transformer needs from the module loader it plugs into.
pub trait HostLoader: Send + Sync {
    /// Map a module name plus extension (`core/constants.coffee`) to a path or URL.
    fn to_url(&self, name_with_ext: &str) -> Result<String, LoaderError>;

    /// Register `text` as the definition of module `name`.
    fn define_from_text(&self, name: &str, text: &str) -> Result<(), LoaderError>;

    /// Request a module through the loader's normal dependency resolution.
    fn request(&self, name: &str) -> Result<LoadedModule, LoaderError>;
}

/// `baseUrl` + `paths` resolution, the way AMD loaders map names to URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathConfig {
    base_url: String,
    paths: BTreeMap<String, String>,
}

impl PathConfig {
    /// Create a config with the given base URL. A trailing `/` is added when missing.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.is_empty() && !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            paths: BTreeMap::new(),
        }
    }

    /// Set module-name prefix substitutions.
    #[must_use]
    pub fn with_paths(mut self, paths: BTreeMap<String, String>) -> Self {
        self.paths = paths;
        self
    }

    /// Add a single prefix substitution.
    #[must_use]
    pub fn with_path(mut self, prefix: impl Into<String>, target: impl Into<String>) -> Self {
        self.paths.insert(prefix.into(), target.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `name_with_ext` to a URL.
    ///
    /// The extension is split off the last path segment, the longest matching
    /// `paths` prefix of the remaining name is substituted, and the base URL
    /// is prepended unless the result is already absolute.
    pub fn to_url(&self, name_with_ext: &str) -> Result<String, LoaderError> {
        if name_with_ext.is_empty() {
            return Err(LoaderError::Unresolvable(name_with_ext.to_string()));
        }

        let (name, ext) = split_extension(name_with_ext);

        if is_absolute(name) {
            return Ok(format!("{name}{ext}"));
        }

        let segments: Vec<&str> = name.split('/').collect();
        let mut mapped = segments.join("/");
        for end in (1..=segments.len()).rev() {
            let prefix = segments[..end].join("/");
            if let Some(target) = self.paths.get(&prefix) {
                let rest = &segments[end..];
                mapped = if rest.is_empty() {
                    target.clone()
                } else {
                    format!("{}/{}", target.trim_end_matches('/'), rest.join("/"))
                };
                break;
            }
        }

        let url = format!("{mapped}{ext}");
        if is_absolute(&url) {
            Ok(url)
        } else {
            Ok(format!("{}{url}", self.base_url))
        }
    }
}

/// Split `dir/name.ext` into `("dir/name", ".ext")`. A leading dot of a
/// segment (`./x`, `.hidden`) is not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    let segment_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[segment_start..].rfind('.') {
        Some(dot) if dot > 0 => name.split_at(segment_start + dot),
        _ => (name, ""),
    }
}

/// Rooted paths and anything with a scheme (`http:`, `file:`) are left alone.
fn is_absolute(url: &str) -> bool {
    if url.starts_with('/') {
        return true;
    }
    match url.find(':') {
        Some(colon) => url[..colon]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        None => false,
    }
}

/// In-process loader: resolves with a [`PathConfig`] and keeps text modules in memory.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    paths: PathConfig,
    modules: RwLock<HashMap<String, String>>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new(paths: PathConfig) -> Self {
        Self {
            paths,
            modules: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names of all defined modules, sorted.
    #[must_use]
    pub fn defined_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl HostLoader for ModuleRegistry {
    fn to_url(&self, name_with_ext: &str) -> Result<String, LoaderError> {
        self.paths.to_url(name_with_ext)
    }

    fn define_from_text(&self, name: &str, text: &str) -> Result<(), LoaderError> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn request(&self, name: &str) -> Result<LoadedModule, LoaderError> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        modules
            .get(name)
            .map(|text| LoadedModule {
                name: name.to_string(),
                text: text.clone(),
            })
            .ok_or_else(|| LoaderError::NotDefined(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(PathConfig::new("src").base_url(), "src/");
        assert_eq!(PathConfig::new("src/").base_url(), "src/");
        assert_eq!(PathConfig::new("").base_url(), "");
    }

    #[test]
    fn test_to_url_plain_name() {
        let paths = PathConfig::new("./");
        assert_eq!(
            paths.to_url("core/constants.coffee").unwrap(),
            "./core/constants.coffee"
        );
    }

    #[test]
    fn test_to_url_longest_prefix_wins() {
        let paths = PathConfig::new("static/")
            .with_path("model", "modules/models")
            .with_path("model/todo", "modules/todo_model");

        assert_eq!(
            paths.to_url("model/todo.coffee").unwrap(),
            "static/modules/todo_model.coffee"
        );
        assert_eq!(
            paths.to_url("model/news.coffee").unwrap(),
            "static/modules/models/news.coffee"
        );
    }

    #[test]
    fn test_to_url_absolute_targets_skip_base() {
        let paths = PathConfig::new("static/")
            .with_path("cdn", "https://cdn.example.com/lib");

        assert_eq!(
            paths.to_url("cdn/jquery.coffee").unwrap(),
            "https://cdn.example.com/lib/jquery.coffee"
        );
        assert_eq!(
            paths.to_url("/abs/main.coffee").unwrap(),
            "/abs/main.coffee"
        );
    }

    #[test]
    fn test_to_url_keeps_dots_in_directories() {
        let paths = PathConfig::new("");
        assert_eq!(
            paths.to_url("../shared/util.coffee").unwrap(),
            "../shared/util.coffee"
        );
        assert_eq!(paths.to_url("lib.v2/x").unwrap(), "lib.v2/x");
    }

    #[test]
    fn test_to_url_empty_name() {
        assert_eq!(
            PathConfig::new("src").to_url(""),
            Err(LoaderError::Unresolvable(String::new()))
        );
    }

    #[test]
    fn test_registry_define_and_request() {
        let registry = ModuleRegistry::new(PathConfig::new("src"));
        assert!(!registry.is_defined("core/constants"));

        registry
            .define_from_text("core/constants", "define({});")
            .unwrap();

        let module = registry.request("core/constants").unwrap();
        assert_eq!(module.text, "define({});");
        assert_eq!(registry.defined_names(), vec!["core/constants".to_string()]);
    }

    #[test]
    fn test_registry_request_undefined() {
        let registry = ModuleRegistry::new(PathConfig::default());
        assert_eq!(
            registry.request("missing"),
            Err(LoaderError::NotDefined("missing".to_string()))
        );
    }
}
