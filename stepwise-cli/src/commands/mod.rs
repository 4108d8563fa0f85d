//! CLI command implementations

pub mod create;
pub mod init;
pub mod migrate;
pub mod rollback;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use stepwise_core::StepwiseContext;

/// Open the stepwise project in `project_dir`
pub fn get_context(project_dir: &Path) -> Result<StepwiseContext> {
    StepwiseContext::new(project_dir).with_context(|| {
        format!(
            "Failed to open stepwise project in {}",
            project_dir.display()
        )
    })
}
