//! Virtual style entries and the registry that tracks them.
//!
//! A page opts into the generated stylesheet by importing a virtual
//! specifier. Recognized forms:
//!
//! | Specifier                              | Resolved id            | Layer      |
//! |----------------------------------------|------------------------|------------|
//! | `uno.css`, `virtual:uno.css`           | `/__uno.css`           | `__ALL__`  |
//! | `uno:<layer>.css`, `virtual:uno:...`   | `/__uno_<layer>.css`   | `<layer>`  |
//! | `/__uno.css`, `/__uno_<layer>.css`     | itself (query dropped) | as above   |

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

/// Layer marker for the entry that carries every layer without its own entry.
pub const LAYER_MARK_ALL: &str = "__ALL__";

/// Alias specifiers written by users in imports.
static VIRTUAL_ENTRY_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:virtual:)?uno(?::(.+))?\.css(?:\?.*)?$").unwrap());

/// Already-resolved ids (as requested back by the browser).
static RESOLVED_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\]__uno(?:_(.+?))?\.css(?:\?.*)?$").unwrap());

/// A recognized virtual style module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEntry {
    pub id: String,
    pub layer: String,
}

impl VirtualEntry {
    fn new(id: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer: layer.into(),
        }
    }

    /// Whether this entry stands for the concatenation of all layers.
    pub fn is_all_layers(&self) -> bool {
        self.layer == LAYER_MARK_ALL
    }
}

/// Resolve a module specifier to a virtual entry, if it denotes one.
pub fn resolve_entry(specifier: &str) -> Option<VirtualEntry> {
    if let Some(caps) = RESOLVED_ID_RE.captures(specifier) {
        let layer = caps.get(1).map_or(LAYER_MARK_ALL, |m| m.as_str());
        return Some(VirtualEntry::new(get_path(specifier), layer));
    }

    let caps = VIRTUAL_ENTRY_ALIAS.captures(specifier)?;
    Some(match caps.get(1) {
        Some(layer) => VirtualEntry::new(format!("/__uno_{}.css", layer.as_str()), layer.as_str()),
        None => VirtualEntry::new("/__uno.css", LAYER_MARK_ALL),
    })
}

/// Strip a `?query` suffix from a module id.
pub fn get_path(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}

/// Resolved id → entry mapping for the dev session.
///
/// Entries accumulate for the lifetime of the session; re-resolving an id
/// overwrites its layer.
#[derive(Debug, Default)]
pub struct EntryRegistry {
    entries: FxHashMap<String, VirtualEntry>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: &VirtualEntry) {
        self.entries.insert(entry.id.clone(), entry.clone());
    }

    /// Layer for `id`, ignoring any query suffix.
    pub fn layer(&self, id: &str) -> Option<&str> {
        self.entries.get(get_path(id)).map(|entry| entry.layer.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(get_path(id))
    }

    /// Registered ids, sorted for stable payloads.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Distinct named layers that have an entry of their own, sorted.
    ///
    /// The all-layers entry leaves these out so a page importing both does
    /// not receive the same rules twice.
    pub fn separate_layers(&self) -> Vec<String> {
        let mut layers: Vec<_> = self
            .entries
            .values()
            .filter(|entry| !entry.is_all_layers())
            .map(|entry| entry.layer.clone())
            .collect();
        layers.sort();
        layers.dedup();
        layers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_alias_all_layers() {
        let entry = resolve_entry("uno.css").unwrap();
        assert_eq!(entry.id, "/__uno.css");
        assert!(entry.is_all_layers());

        let entry = resolve_entry("virtual:uno.css").unwrap();
        assert_eq!(entry.id, "/__uno.css");
        assert_eq!(entry.layer, LAYER_MARK_ALL);
    }

    #[test]
    fn test_resolve_alias_named_layer() {
        let entry = resolve_entry("uno:shortcuts.css").unwrap();
        assert_eq!(entry.id, "/__uno_shortcuts.css");
        assert_eq!(entry.layer, "shortcuts");

        let entry = resolve_entry("virtual:uno:default.css?inline").unwrap();
        assert_eq!(entry.id, "/__uno_default.css");
        assert_eq!(entry.layer, "default");
    }

    #[test]
    fn test_resolve_already_resolved_id() {
        let entry = resolve_entry("/__uno.css?t=1700000000000").unwrap();
        assert_eq!(entry.id, "/__uno.css");
        assert!(entry.is_all_layers());

        let entry = resolve_entry("/__uno_default.css").unwrap();
        assert_eq!(entry.layer, "default");

        let entry = resolve_entry(r"C:\app\__uno_preflights.css").unwrap();
        assert_eq!(entry.layer, "preflights");
    }

    #[test]
    fn test_resolve_unrecognized() {
        for spec in [
            "",
            "uno",
            "uno.js",
            "main.css",
            "/src/uno.css.ts",
            "virtual:unocss",
            "./uno.css",
            "/__unocss.css",
            "__uno.css",
        ] {
            assert!(resolve_entry(spec).is_none(), "unexpected match: {spec}");
        }
    }

    #[test]
    fn test_get_path() {
        assert_eq!(get_path("/__uno.css?t=1"), "/__uno.css");
        assert_eq!(get_path("/__uno.css"), "/__uno.css");
        assert_eq!(get_path("?x"), "");
    }

    #[test]
    fn test_registry_overwrite_and_lookup() {
        let mut registry = EntryRegistry::new();
        let entry = resolve_entry("uno:default.css").unwrap();
        registry.insert(&entry);
        registry.insert(&entry);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.layer("/__uno_default.css?t=5"), Some("default"));
        assert!(registry.layer("/__uno.css").is_none());
    }

    #[test]
    fn test_registry_distinct_layers() {
        let mut registry = EntryRegistry::new();
        for spec in ["uno.css", "uno:default.css", "/__uno_default.css", "uno:icons.css"] {
            registry.insert(&resolve_entry(spec).unwrap());
        }
        assert_eq!(registry.separate_layers(), vec!["default", "icons"]);
        assert_eq!(
            registry.ids(),
            vec!["/__uno.css", "/__uno_default.css", "/__uno_icons.css"]
        );
    }
}
