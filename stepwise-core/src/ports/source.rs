//! Script source port - where migration scripts come from

use crate::domain::result::Result;

/// Directory-like collection of script files
pub trait ScriptSource {
    /// Names of all entries in the root, in no particular order
    fn list(&self) -> Result<Vec<String>>;

    /// Full contents of a named entry
    fn read(&self, name: &str) -> Result<String>;

    /// Whether a named entry exists
    fn exists(&self, name: &str) -> bool;
}
