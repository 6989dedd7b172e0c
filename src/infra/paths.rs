use dirs::home_dir;
use std::path::PathBuf;
use thiserror::Error;

// Store-root configuration, resolved once in main and passed to every
// component so tests can point the whole stack at a fixture tree.
#[derive(Clone, Debug)]
pub struct HistoryPaths {
    claude_dir: PathBuf,
}

impl HistoryPaths {
    pub fn new(claude_dir: PathBuf) -> Self {
        Self { claude_dir }
    }

    pub fn claude_dir(&self) -> &PathBuf {
        &self.claude_dir
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.claude_dir.join("projects")
    }

    pub fn history_log_path(&self) -> PathBuf {
        self.claude_dir.join("history.jsonl")
    }
}

#[derive(Debug, Error)]
pub enum ResolveClaudeDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_claude_dir() -> Result<PathBuf, ResolveClaudeDirError> {
    if let Some(override_dir) = std::env::var_os("CLAUDE_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveClaudeDirError::HomeDirNotFound);
    };

    Ok(home.join(".claude"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_hang_off_the_root() {
        let paths = HistoryPaths::new(PathBuf::from("/tmp/claude"));
        assert_eq!(paths.projects_dir(), PathBuf::from("/tmp/claude/projects"));
        assert_eq!(
            paths.history_log_path(),
            PathBuf::from("/tmp/claude/history.jsonl")
        );
    }
}
