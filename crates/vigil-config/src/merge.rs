//! Layer tracking and deep merge of TOML trees.

use std::collections::HashMap;

use serde::Serialize;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `~/.vigil/config.toml` or `$VIGIL_HOME/config.toml`.
    User,
    /// A file passed explicitly to the loader.
    File,
    /// A `VIGIL_*` environment variable.
    Environment,
}

impl ConfigLayer {
    /// Check if this layer is a config file written by someone.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, Self::User | Self::File)
    }
}

/// Dotted field path to the layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Merge `overlay` into `base`, recording `layer` for every leaf it sets.
///
/// Tables merge per key. Scalars and arrays replace.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() => {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    },
                    Some(base_val) => {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer);
                    },
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer);
        },
    }
}

/// Record every leaf under `val` as set by `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_replaces_leaves_and_keeps_siblings() {
        let mut base = parse("[approval]\nttl_secs = 3600\nsweep_batch_limit = 0\n");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", ConfigLayer::Defaults, &mut sources);

        deep_merge_tracking(
            &mut base,
            &parse("[approval]\nttl_secs = 60\n"),
            "",
            ConfigLayer::User,
            &mut sources,
        );

        assert_eq!(base["approval"]["ttl_secs"].as_integer(), Some(60));
        assert_eq!(base["approval"]["sweep_batch_limit"].as_integer(), Some(0));
        assert_eq!(sources["approval.ttl_secs"], ConfigLayer::User);
        assert_eq!(sources["approval.sweep_batch_limit"], ConfigLayer::Defaults);
    }

    #[test]
    fn test_merge_adds_new_tables() {
        let mut base = parse("[approval]\nttl_secs = 1\n");
        let mut sources = FieldSources::new();
        deep_merge_tracking(
            &mut base,
            &parse("[storage]\nbackend = \"surrealkv\"\npath = \"/tmp/v\"\n"),
            "",
            ConfigLayer::File,
            &mut sources,
        );
        assert_eq!(base["storage"]["path"].as_str(), Some("/tmp/v"));
        assert_eq!(sources["storage.backend"], ConfigLayer::File);
        assert!(sources["storage.path"].is_file());
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"b=debug\"]\n");
        let mut sources = FieldSources::new();
        deep_merge_tracking(
            &mut base,
            &parse("[logging]\ndirectives = [\"c=trace\"]\n"),
            "",
            ConfigLayer::User,
            &mut sources,
        );
        assert_eq!(base["logging"]["directives"].as_array().unwrap().len(), 1);
    }
}
