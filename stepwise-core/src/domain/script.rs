//! Script file naming convention
//!
//! Script files are named `{sort-key}_{name}[_up|_down].sql`. Everything
//! that classifies or builds a script file name goes through this module so
//! the convention is defined in exactly one place.

use std::sync::LazyLock;

use regex::Regex;

/// Extension every script file carries
pub const SCRIPT_EXTENSION: &str = ".sql";

const UP_SUFFIX: &str = "_up";
const DOWN_SUFFIX: &str = "_down";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// Direction of a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Applies the migration; an unsuffixed `.sql` file counts as up
    Up,
    /// Reverts the migration
    Down,
}

impl ScriptKind {
    fn suffix(&self) -> &'static str {
        match self {
            ScriptKind::Up => UP_SUFFIX,
            ScriptKind::Down => DOWN_SUFFIX,
        }
    }
}

/// A script file name split into its logical migration name and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptName {
    pub name: String,
    pub kind: ScriptKind,
}

/// Classify a file name
///
/// Returns `None` for anything that is not a script (wrong extension or
/// nothing left once the suffixes are stripped).
pub fn parse_script_name(file_name: &str) -> Option<ScriptName> {
    let stem = file_name.strip_suffix(SCRIPT_EXTENSION)?;

    let (name, kind) = if let Some(name) = stem.strip_suffix(DOWN_SUFFIX) {
        (name, ScriptKind::Down)
    } else {
        (stem.strip_suffix(UP_SUFFIX).unwrap_or(stem), ScriptKind::Up)
    };

    if name.is_empty() {
        return None;
    }

    Some(ScriptName {
        name: name.to_string(),
        kind,
    })
}

/// File name of the down script paired with a logged migration name
pub fn down_script_name(name: &str) -> String {
    format!("{}{}{}", name, DOWN_SUFFIX, SCRIPT_EXTENSION)
}

/// Replace every run of non-alphanumeric characters with a single underscore
pub fn sanitize_name(raw: &str) -> String {
    NON_ALPHANUMERIC.replace_all(raw, "_").into_owned()
}

/// Build a script file name
///
/// An empty `prefix` is left out; `kind: None` produces an unsuffixed
/// (implicitly up) script.
pub fn script_file_name(prefix: &str, name: &str, kind: Option<ScriptKind>) -> String {
    let mut file_name = String::new();

    if !prefix.is_empty() {
        file_name.push_str(prefix);
        file_name.push('_');
    }

    file_name.push_str(&sanitize_name(name));

    if let Some(kind) = kind {
        file_name.push_str(kind.suffix());
    }

    file_name.push_str(SCRIPT_EXTENSION);
    file_name
}
