use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use deck_core::CollisionPolicy;
use engine_logging::engine_info;
use serde::Deserialize;

/// Optional defaults read from a RON file, e.g.
///
/// ```ron
/// (
///     base_url: Some("school.instructure.com"),
///     output_dir: Some("decks"),
///     policy: Some(prefix),
/// )
/// ```
///
/// Command-line flags and environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub policy: Option<CollisionPolicy>,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        engine_info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    /// Explicit values win over the file.
    pub fn overlay(self, base_url: Option<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.or(self.base_url),
            token: token.or(self.token),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_partial_file() {
        let settings = Settings::parse(
            r#"(
                base_url: Some("school.instructure.com"),
                policy: Some(numbered),
            )"#,
        )
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                base_url: Some("school.instructure.com".to_string()),
                token: None,
                output_dir: None,
                policy: Some(CollisionPolicy::Numbered),
            }
        );
    }

    #[test]
    fn empty_tuple_is_all_defaults() {
        assert_eq!(Settings::parse("()").unwrap(), Settings::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Settings::parse("(policy: Some(shuffled))").is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let file = Settings {
            base_url: Some("from-file.example.com".to_string()),
            token: Some("file-token-123".to_string()),
            output_dir: Some(PathBuf::from("decks")),
            policy: None,
        };

        let merged = file.overlay(Some("flag.example.com".to_string()), None);

        assert_eq!(merged.base_url.as_deref(), Some("flag.example.com"));
        assert_eq!(merged.token.as_deref(), Some("file-token-123"));
        assert_eq!(merged.output_dir, Some(PathBuf::from("decks")));
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = Settings::load(&temp.path().join("absent.ron")).unwrap_err();
        assert!(err.to_string().contains("absent.ron"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, r#"(output_dir: Some("slides"))"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.output_dir, Some(PathBuf::from("slides")));
    }
}
