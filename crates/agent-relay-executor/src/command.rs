//! Command building utilities.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Command build error.
#[derive(Debug, Error)]
pub enum CommandBuildError {
    #[error("Base command cannot be parsed: {0}")]
    InvalidBase(String),
    #[error("Base command is empty after parsing")]
    EmptyCommand,
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
}

/// Parsed command parts (program + args).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParts {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandParts {
    /// Create new command parts.
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Resolve the program to an absolute path.
    ///
    /// # Errors
    /// Returns error if executable not found.
    pub async fn into_resolved(self) -> Result<(PathBuf, Vec<String>), CommandBuildError> {
        let Self { program, args } = self;
        let executable = resolve_executable_path(&program)
            .await
            .ok_or(CommandBuildError::ExecutableNotFound(program))?;
        Ok((executable, args))
    }
}

/// Builder for constructing commands.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    /// Base executable command.
    pub base: String,
    /// Optional parameters to append.
    pub params: Option<Vec<String>>,
}

impl CommandBuilder {
    /// Create a new command builder.
    #[must_use]
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self {
            base: base.into(),
            params: None,
        }
    }

    /// Add parameters.
    #[must_use]
    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Extend parameters.
    #[must_use]
    pub fn extend_params<I>(mut self, more: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let extra: Vec<String> = more.into_iter().map(Into::into).collect();
        match &mut self.params {
            Some(p) => p.extend(extra),
            None => self.params = Some(extra),
        }
        self
    }

    /// Build command for a new conversation.
    ///
    /// # Errors
    /// Returns error if command is invalid.
    pub fn build_initial(&self) -> Result<CommandParts, CommandBuildError> {
        self.build(&[])
    }

    /// Build command resuming `session_id`.
    ///
    /// # Errors
    /// Returns error if command is invalid.
    pub fn build_follow_up(&self, session_id: &str) -> Result<CommandParts, CommandBuildError> {
        self.build(&["--resume".to_string(), session_id.to_string()])
    }

    fn build(&self, additional_args: &[String]) -> Result<CommandParts, CommandBuildError> {
        let mut parts = split_command_line(&self.base)?;
        if let Some(ref params) = self.params {
            parts.extend(params.iter().cloned());
        }
        parts.extend(additional_args.iter().cloned());

        if parts.is_empty() {
            return Err(CommandBuildError::EmptyCommand);
        }

        let program = parts.remove(0);
        Ok(CommandParts::new(program, parts))
    }
}

fn split_command_line(input: &str) -> Result<Vec<String>, CommandBuildError> {
    #[cfg(windows)]
    {
        let parts = winsplit::split(input);
        if parts.is_empty() {
            Err(CommandBuildError::EmptyCommand)
        } else {
            Ok(parts)
        }
    }

    #[cfg(not(windows))]
    {
        shlex::split(input).ok_or_else(|| CommandBuildError::InvalidBase(input.to_string()))
    }
}

/// Resolve an executable by name.
///
/// Absolute paths are used as-is when they exist; anything else is looked up
/// on `PATH`.
pub async fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(Result::ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_initial() {
        let parts = CommandBuilder::new("claude")
            .params(["--output-format", "stream-json"])
            .build_initial()
            .unwrap();
        assert_eq!(parts.program, "claude");
        assert_eq!(parts.args, vec!["--output-format", "stream-json"]);
    }

    #[test]
    fn test_build_follow_up_appends_resume() {
        let parts = CommandBuilder::new("npx -y @anthropic-ai/claude-code")
            .params(["--verbose"])
            .build_follow_up("abc-123")
            .unwrap();
        assert_eq!(parts.program, "npx");
        assert_eq!(
            parts.args,
            vec!["-y", "@anthropic-ai/claude-code", "--verbose", "--resume", "abc-123"]
        );
    }

    #[test]
    fn test_extend_params() {
        let parts = CommandBuilder::new("claude")
            .extend_params(["--a"])
            .extend_params(["--b"])
            .build_initial()
            .unwrap();
        assert_eq!(parts.args, vec!["--a", "--b"]);
    }

    #[test]
    fn test_empty_base_is_rejected() {
        assert!(matches!(
            CommandBuilder::new("").build_initial(),
            Err(CommandBuildError::EmptyCommand)
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        assert!(matches!(
            CommandBuilder::new("claude \"oops").build_initial(),
            Err(CommandBuildError::InvalidBase(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_missing_executable() {
        assert!(resolve_executable_path("").await.is_none());
        assert!(
            resolve_executable_path("definitely-not-a-real-binary-4821")
                .await
                .is_none()
        );
    }
}
