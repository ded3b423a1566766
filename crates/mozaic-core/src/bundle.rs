//! Static bundle emission.
//!
//! A bundle is a plain concatenation of module texts. Each module's anonymous
//! `define(...)` call gets its id inserted so the bundle can be loaded without
//! running the plugin again:
//!
//! ```text
//! define(['core/constants'], function (c) { ... });
//!   ->
//! define('cs!main', ['core/constants'], function (c) { ... });
//! ```

/// Sink for modules written out of a build cache.
pub trait BundleWriter {
    /// Write `text` as the module addressed by `id`.
    fn as_module(&mut self, id: &str, text: &str);
}

/// In-memory bundle.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    modules: Vec<(String, String)>,
}

impl Bundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of written modules, in write order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.modules.iter().map(|(id, _)| id.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Concatenated bundle text.
    #[must_use]
    pub fn finish(&self) -> String {
        let mut out = String::new();
        for (_, text) in &self.modules {
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

impl BundleWriter for Bundle {
    fn as_module(&mut self, id: &str, text: &str) {
        self.modules.push((id.to_string(), name_anonymous_define(id, text)));
    }
}

/// Insert `id` into the first anonymous `define(` call of `text`.
///
/// Text without an anonymous define (already named, or not an AMD module) is
/// returned unchanged.
#[must_use]
pub fn name_anonymous_define(id: &str, text: &str) -> String {
    const CALL: &str = "define(";

    let mut search_from = 0;
    while let Some(found) = text[search_from..].find(CALL) {
        let start = search_from + found;
        let args_start = start + CALL.len();
        search_from = args_start;

        // `redefine(`, `obj.define(` and `$define(` are not the AMD define
        let standalone = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.')));
        if !standalone {
            continue;
        }

        let first_arg = text[args_start..].trim_start();
        if first_arg.starts_with('\'') || first_arg.starts_with('"') {
            // Already named
            return text.to_string();
        }

        let escaped = id.replace('\\', "\\\\").replace('\'', "\\'");
        let mut named = String::with_capacity(text.len() + escaped.len() + 4);
        named.push_str(&text[..args_start]);
        named.push('\'');
        named.push_str(&escaped);
        named.push_str("', ");
        named.push_str(&text[args_start..]);
        return named;
    }

    text.to_string()
}
