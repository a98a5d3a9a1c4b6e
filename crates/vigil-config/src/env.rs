//! `VIGIL_*` environment variable fallbacks.
//!
//! Environment variables fill fields that no config file set. They never
//! override a value someone wrote in a file.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources};

/// How an environment value is written into the TOML tree.
#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: EnvKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VIGIL_LOG_LEVEL",
        field_path: "logging.level",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_APPROVAL_TTL_SECS",
        field_path: "approval.ttl_secs",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "VIGIL_AUDIT_RETENTION_KEEP",
        field_path: "audit.retention_keep",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "VIGIL_STORAGE_BACKEND",
        field_path: "storage.backend",
        kind: EnvKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_STORAGE_PATH",
        field_path: "storage.path",
        kind: EnvKind::Text,
    },
];

/// Snapshot the `VIGIL_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("VIGIL_"))
        .collect()
}

/// Apply environment fallbacks to fields no config file set.
///
/// Returns the number of variables applied.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count = 0usize;

    for mapping in ENV_MAPPINGS {
        if sources.get(mapping.field_path).is_some_and(|l| l.is_file()) {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let Some(value) = coerce(mapping.kind, raw) else {
            warn!(
                var = mapping.var_name,
                value = %raw,
                "ignoring environment variable with non-numeric value"
            );
            continue;
        };
        if set_field(merged, mapping.field_path, value) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applied env var fallback"
            );
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

fn coerce(kind: EnvKind, raw: &str) -> Option<toml::Value> {
    match kind {
        EnvKind::Text => Some(toml::Value::String(raw.to_owned())),
        EnvKind::Integer => raw.trim().parse::<i64>().ok().map(toml::Value::Integer),
    }
}

/// Write `value` at a dotted `path`, creating intermediate tables. Returns
/// `false` if a non-table value sits on the path.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return true;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::record_leaves;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_default_fields() {
        let mut tree: toml::Value = toml::from_str("[approval]\nttl_secs = 3600\n").unwrap();
        let mut sources = FieldSources::new();
        record_leaves(&tree, "", ConfigLayer::Defaults, &mut sources);

        let applied = apply_env_fallbacks(
            &mut tree,
            &mut sources,
            &env(&[("VIGIL_APPROVAL_TTL_SECS", "90"), ("VIGIL_STORAGE_PATH", "/var/lib/vigil")]),
        );

        assert_eq!(applied, 2);
        assert_eq!(tree["approval"]["ttl_secs"].as_integer(), Some(90));
        assert_eq!(tree["storage"]["path"].as_str(), Some("/var/lib/vigil"));
        assert_eq!(sources["approval.ttl_secs"], ConfigLayer::Environment);
    }

    #[test]
    fn test_env_never_overrides_files() {
        let mut tree: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".into(), ConfigLayer::User);

        let applied =
            apply_env_fallbacks(&mut tree, &mut sources, &env(&[("VIGIL_LOG_LEVEL", "trace")]));

        assert_eq!(applied, 0);
        assert_eq!(tree["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_non_numeric_integer_is_ignored() {
        let mut tree = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let applied = apply_env_fallbacks(
            &mut tree,
            &mut sources,
            &env(&[("VIGIL_AUDIT_RETENTION_KEEP", "lots")]),
        );
        assert_eq!(applied, 0);
        assert!(tree.get("audit").is_none());
    }

    #[test]
    fn test_set_field_refuses_scalar_parent() {
        let mut tree: toml::Value = toml::from_str("storage = 1\n").unwrap();
        assert!(!set_field(&mut tree, "storage.path", toml::Value::String("x".into())));
    }
}
