//! Agent runtime configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings file for native Claude Code.
pub const SETTINGS_AGENT_PATH: &str = ".claude/settings_agent.json";

/// Settings file that routes the agent through OpenRouter.
pub const SETTINGS_AGENT_OPENROUTER_PATH: &str = ".claude/settings_agent_openrouter.json";

/// Name of the built-in Claude Code system prompt preset.
pub const CLAUDE_CODE_PRESET: &str = "claude_code";

/// Permission/settings profile handed to the agent runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsProfile {
    /// Native Claude Code settings.
    Native,
    /// Settings that point the agent at OpenRouter.
    OpenRouter,
}

impl SettingsProfile {
    /// Profile selected at build time by the `openrouter` feature.
    pub const ACTIVE: Self = if cfg!(feature = "openrouter") {
        Self::OpenRouter
    } else {
        Self::Native
    };

    /// Path of the settings file, relative to the agent's working directory.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Native => SETTINGS_AGENT_PATH,
            Self::OpenRouter => SETTINGS_AGENT_OPENROUTER_PATH,
        }
    }
}

/// System prompt configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemPrompt {
    /// A preset built into the agent runtime, optionally extended.
    Preset {
        preset: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        append: Option<String>,
    },
    /// Replace the system prompt entirely.
    Custom { text: String },
}

impl SystemPrompt {
    /// The stock Claude Code preset.
    #[must_use]
    pub fn claude_code() -> Self {
        Self::Preset {
            preset: CLAUDE_CODE_PRESET.to_string(),
            append: None,
        }
    }
}

/// Options for opening an agent connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOptions {
    /// System prompt selection.
    pub system_prompt: SystemPrompt,
    /// Settings file passed to the runtime.
    pub settings: PathBuf,
    /// Which setting sources the runtime should load.
    pub setting_sources: Vec<String>,
    /// Session to resume, if any.
    #[serde(default)]
    pub resume: Option<String>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::for_profile(SettingsProfile::ACTIVE)
    }
}

impl AgentOptions {
    /// The relay's fixed configuration for a given settings profile.
    #[must_use]
    pub fn for_profile(profile: SettingsProfile) -> Self {
        Self {
            system_prompt: SystemPrompt::claude_code(),
            settings: PathBuf::from(profile.path()),
            setting_sources: vec!["project".to_string()],
            resume: None,
        }
    }

    /// Attach (or clear) the resume token.
    #[must_use]
    pub fn with_resume(mut self, resume: Option<String>) -> Self {
        self.resume = resume;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_use_active_profile() {
        let options = AgentOptions::default();
        assert_eq!(options.settings, PathBuf::from(SettingsProfile::ACTIVE.path()));
        assert_eq!(options.setting_sources, vec!["project".to_string()]);
        assert_eq!(options.system_prompt, SystemPrompt::claude_code());
        assert!(options.resume.is_none());
    }

    #[test]
    fn test_profile_paths() {
        assert_eq!(SettingsProfile::Native.path(), ".claude/settings_agent.json");
        assert_eq!(
            SettingsProfile::OpenRouter.path(),
            ".claude/settings_agent_openrouter.json"
        );
    }

    #[test]
    fn test_with_resume() {
        let options = AgentOptions::default().with_resume(Some("abc".into()));
        assert_eq!(options.resume.as_deref(), Some("abc"));
        assert!(options.with_resume(None).resume.is_none());
    }
}
