//! Generation of paired commit/rollback artifacts.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{
    change::CREATED_FORMAT,
    error::Result,
    runner::Direction,
};

const MODULE_COMMIT_TEMPLATE: &str = "module.exports = {\n  description: '',\n  async commit(tool) {\n  },\n};\n";

const MODULE_ROLLBACK_TEMPLATE: &str = "module.exports = {\n  description: '',\n  async rollback(tool) {\n  },\n};\n";

const SHELL_TEMPLATE: &str = "#!/bin/sh\nset -eu\n";

#[derive(Debug, Clone)]
pub struct Options {
    pub extension: String,
    /// Unix permission bits; `0o755` for shell artifacts.
    pub mode: u32,
    /// Overrides the embedded templates with `commit.<ext>` /
    /// `rollback.<ext>` files from this directory.
    pub template_dir: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            extension: "js".to_owned(),
            mode: 0o644,
            template_dir: None,
        }
    }
}

async fn template(direction: Direction, options: &Options) -> Result<String> {
    if let Some(dir) = &options.template_dir {
        let source = dir.join(format!("{}.{}", direction.as_str(), options.extension));
        if tokio::fs::try_exists(&source).await? {
            return Ok(tokio::fs::read_to_string(&source).await?);
        }
    }

    Ok(match (options.extension.as_str(), direction) {
        ("sh", _) => SHELL_TEMPLATE.to_owned(),
        (_, Direction::Commit) => MODULE_COMMIT_TEMPLATE.to_owned(),
        (_, Direction::Rollback) => MODULE_ROLLBACK_TEMPLATE.to_owned(),
    })
}

/// Writes `<timestamp>.<name>.commit.<ext>` and its rollback twin into
/// `dir`, returning the created paths.
pub async fn create_pair(dir: &Path, name: &str, options: &Options) -> Result<Vec<PathBuf>> {
    let stamp = Utc::now().format(CREATED_FORMAT);
    let mut created = Vec::with_capacity(2);

    for direction in [Direction::Commit, Direction::Rollback] {
        let file = dir.join(format!(
            "{stamp}.{name}.{}.{}",
            direction.as_str(),
            options.extension
        ));

        tokio::fs::write(&file, template(direction, options).await?).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            tokio::fs::set_permissions(&file, std::fs::Permissions::from_mode(options.mode))
                .await?;
        }

        created.push(file);
    }

    Ok(created)
}
