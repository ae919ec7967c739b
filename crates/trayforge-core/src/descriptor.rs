//! Item descriptor model.
//!
//! The configuration tree is an ordered list of key/value records; parsing
//! turns each record into a typed [`ItemDescriptor`]. Parsing is tolerant:
//! records with an unknown or missing `type` tag are skipped, and missing
//! fields fall back to empty defaults. Semantic invariants (non-blank titles,
//! non-empty commands, valid source types) are enforced later by the
//! composition engine, which records a failure per offending item instead of
//! rejecting the whole tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How an action's `command` string is interpreted when the action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// The command string is an inline script, handed verbatim to the runner.
    PythonCode,
    /// The command string is a filesystem path (environment-variable segments
    /// expanded) whose contents are read and executed at invocation time.
    File,
}

impl SourceType {
    /// Parses the configured `sourcetype` value. `python` is accepted as a
    /// legacy alias for `python_code`. Unknown values yield `None` and are
    /// rejected at composition time.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "python_code" | "python" => Some(Self::PythonCode),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// Canonical configuration spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PythonCode => "python_code",
            Self::File => "file",
        }
    }
}

/// One parsed menu item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDescriptor {
    /// Reference to a plugin module, resolved through the plugin catalog.
    ModuleRef {
        import_path: String,
        from_list: Vec<String>,
        title: Option<String>,
    },
    /// A leaf action bound to a deferred payload.
    Action {
        title: String,
        source_type: Option<SourceType>,
        command: String,
        tooltip: Option<String>,
    },
    /// A nested submenu with its own ordered children.
    Submenu {
        title: String,
        items: Vec<ItemDescriptor>,
    },
    /// A visual separator.
    Separator,
}

impl ItemDescriptor {
    /// Short tag used in logs and error records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModuleRef { .. } => "module",
            Self::Action { .. } => "action",
            Self::Submenu { .. } => "menu",
            Self::Separator => "separator",
        }
    }
}

/// Raw record shape as it appears in the configuration. All fields are
/// optional so that malformed records survive parsing and fail (or get
/// skipped) with a useful reason instead of a deserialization error.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    import_path: Option<String>,
    #[serde(default)]
    fromlist: Vec<String>,
    title: Option<String>,
    sourcetype: Option<String>,
    command: Option<String>,
    tooltip: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

/// Parses an ordered list of configuration records into descriptors.
///
/// Unreadable records and records with an unknown or missing `type` tag are
/// skipped with a debug log line; they never abort the parse.
pub fn parse_items(records: &[Value]) -> Vec<ItemDescriptor> {
    records.iter().filter_map(parse_item).collect()
}

fn parse_item(record: &Value) -> Option<ItemDescriptor> {
    let raw: RawItem = match RawItem::deserialize(record) {
        Ok(raw) => raw,
        Err(error) => {
            debug!(error = %error, "Skipping unreadable menu item record");
            return None;
        }
    };

    let Some(kind) = raw.kind.as_deref() else {
        debug!("Skipping menu item record without a type tag");
        return None;
    };

    match kind {
        "module" => Some(ItemDescriptor::ModuleRef {
            import_path: raw.import_path.unwrap_or_default(),
            from_list: raw.fromlist,
            title: raw.title,
        }),
        "action" => Some(ItemDescriptor::Action {
            title: raw.title.unwrap_or_default(),
            source_type: raw.sourcetype.as_deref().and_then(SourceType::parse),
            command: raw.command.unwrap_or_default(),
            tooltip: raw.tooltip,
        }),
        "menu" => Some(ItemDescriptor::Submenu {
            title: raw.title.unwrap_or_default(),
            items: parse_items(&raw.items),
        }),
        "separator" => Some(ItemDescriptor::Separator),
        other => {
            debug!(kind = other, "Skipping menu item with unknown type tag");
            None
        }
    }
}
