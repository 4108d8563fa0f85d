//! Migration record domain model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// One applied migration as kept in the log
///
/// `name` is the script file name without the `_up`/`_down` suffix and the
/// `.sql` extension, so `123_create_table_up.sql` is logged as
/// `123_create_table`. `step` is the batch the migration was applied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub name: String,
    pub step: u32,
}

impl MigrationRecord {
    pub fn new(name: impl Into<String>, step: u32) -> Self {
        Self {
            name: name.into(),
            step,
        }
    }

    /// Check that the record can be stored and read back by every log backend
    ///
    /// Steps start at 1 (0 means "nothing applied"). Names must not contain
    /// the file log's field or line separators.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::malformed(format!(
                "migration '{}' has step 0, steps start at 1",
                self.name
            )));
        }
        if let Some(c) = self.name.chars().find(|c| matches!(c, ',' | '\n' | '\r')) {
            return Err(Error::malformed(format!(
                "migration name {:?} contains {:?}",
                self.name, c
            )));
        }
        Ok(())
    }

    /// Parse one line of the file log (`{step},{name}`)
    pub fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 2 {
            return Err(Error::malformed(format!("log line malformed: {}", line)));
        }

        let step = parts[0]
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::malformed(format!("log line step invalid: {} ({})", line, e)))?;

        let record = Self::new(parts[1], step);
        record.validate()?;
        Ok(record)
    }

    /// Format as one line of the file log, without the trailing newline
    pub fn to_line(&self) -> String {
        format!("{},{}", self.step, self.name)
    }
}

impl fmt::Display for MigrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (step {})", self.name, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let record = MigrationRecord::new("1_create_users", 3);
        assert_eq!(record.to_line(), "3,1_create_users");
        assert_eq!(MigrationRecord::from_line("3,1_create_users").unwrap(), record);
    }

    #[test]
    fn test_name_may_contain_spaces() {
        let record = MigrationRecord::from_line("1,migration A").unwrap();
        assert_eq!(record.name, "migration A");
        assert_eq!(record.step, 1);
    }

    #[test]
    fn test_wrong_field_count_is_malformed() {
        for line in ["1", "1,a,b", ""] {
            let err = MigrationRecord::from_line(line).unwrap_err();
            assert!(matches!(err, Error::MalformedRecord(_)), "line {:?}", line);
        }
    }

    #[test]
    fn test_non_numeric_step_is_malformed() {
        let err = MigrationRecord::from_line("one,create_users").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));

        let err = MigrationRecord::from_line("-1,create_users").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
    }

    #[test]
    fn test_step_zero_is_malformed() {
        let err = MigrationRecord::from_line("0,1_a").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
        assert!(MigrationRecord::new("1_a", 0).validate().is_err());
        assert!(MigrationRecord::new("1_a", 1).validate().is_ok());
    }

    #[test]
    fn test_separators_in_name_are_rejected() {
        for name in ["1_a,b", "1_a\nb", "1_a\r"] {
            let err = MigrationRecord::new(name, 1).validate().unwrap_err();
            assert!(matches!(err, Error::MalformedRecord(_)), "name {:?}", name);
        }
        assert!(MigrationRecord::new("migration A", 1).validate().is_ok());
    }
}
