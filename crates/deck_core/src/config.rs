use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{CourseId, ModuleId};

/// Tokens shorter than this are rejected before any request is made.
pub const MIN_TOKEN_LEN: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base url is empty")]
    EmptyBaseUrl,
    #[error("invalid base url {input:?}: {message}")]
    InvalidBaseUrl { input: String, message: String },
    #[error("api token appears to be invalid (shorter than 10 characters)")]
    TokenTooShort,
    #[error("course id must be a positive number, not {0:?}")]
    InvalidCourseId(String),
    #[error("unknown collision policy {0:?} (expected rename, prefix or numbered)")]
    UnknownPolicy(String),
}

/// Host of the LMS and the bearer credential used for every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: Url,
    pub token: String,
}

impl Connection {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(base_url)?;
        let token = token.trim();
        if token.len() < MIN_TOKEN_LEN {
            return Err(ConfigError::TokenTooShort);
        }
        Ok(Self {
            base_url,
            token: token.to_string(),
        })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Accepts `school.instructure.com` as well as full URLs. A missing scheme becomes
/// `https://` and a trailing slash is dropped.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    let with_scheme = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|err| ConfigError::InvalidBaseUrl {
        input: raw.to_string(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            input: raw.to_string(),
            message: "missing host".to_string(),
        });
    }
    Ok(url)
}

pub fn parse_course_id(raw: &str) -> Result<CourseId, ConfigError> {
    let trimmed = raw.trim();
    match trimmed.parse::<CourseId>() {
        Ok(id) if id > 0 && trimmed.bytes().all(|b| b.is_ascii_digit()) => Ok(id),
        _ => Err(ConfigError::InvalidCourseId(raw.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModuleSelection {
    #[default]
    All,
    Only(BTreeSet<ModuleId>),
}

impl ModuleSelection {
    /// An empty id list selects every module.
    pub fn from_ids(ids: impl IntoIterator<Item = ModuleId>) -> Self {
        let ids: BTreeSet<ModuleId> = ids.into_iter().collect();
        if ids.is_empty() {
            ModuleSelection::All
        } else {
            ModuleSelection::Only(ids)
        }
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        match self {
            ModuleSelection::All => true,
            ModuleSelection::Only(ids) => ids.contains(&id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Populate a directory tree rooted at the given path.
    Directory(PathBuf),
    /// Build a single zip archive in memory.
    Archive,
}

/// Naming strategy applied when two output files would share a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    #[default]
    Rename,
    Prefix,
    Numbered,
}

impl FromStr for CollisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" | "simple" => Ok(CollisionPolicy::Rename),
            "prefix" => Ok(CollisionPolicy::Prefix),
            "numbered" | "number" => Ok(CollisionPolicy::Numbered),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Rename => write!(f, "rename"),
            CollisionPolicy::Prefix => write!(f, "prefix"),
            CollisionPolicy::Numbered => write!(f, "numbered"),
        }
    }
}

/// Everything one run needs besides the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    pub course_id: CourseId,
    pub modules: ModuleSelection,
    pub output: OutputMode,
    pub collision: CollisionPolicy,
}

impl HarvestRequest {
    pub fn new(course_id: CourseId, output: OutputMode) -> Self {
        Self {
            course_id,
            modules: ModuleSelection::All,
            output,
            collision: CollisionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub connection: Connection,
    pub request: HarvestRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        let url = normalize_base_url("school.instructure.com/").unwrap();
        assert_eq!(url.as_str(), "https://school.instructure.com/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = normalize_base_url(" http://localhost:8080 ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert_eq!(normalize_base_url("  "), Err(ConfigError::EmptyBaseUrl));
    }

    #[test]
    fn short_token_is_rejected() {
        assert_eq!(
            Connection::new("school.instructure.com", "abc"),
            Err(ConfigError::TokenTooShort)
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let conn = Connection::new("school.instructure.com", "0123456789abcdef").unwrap();
        let rendered = format!("{conn:?}");
        assert!(!rendered.contains("0123456789abcdef"));
    }

    #[test]
    fn course_id_must_be_numeric() {
        assert_eq!(parse_course_id(" 12345 "), Ok(12345));
        assert!(parse_course_id("CS101").is_err());
        assert!(parse_course_id("+5").is_err());
        assert!(parse_course_id("0").is_err());
    }

    #[test]
    fn policies_parse_case_insensitively() {
        assert_eq!("Numbered".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Numbered));
        assert_eq!("prefix".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Prefix));
        assert!("zip".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn empty_selection_means_all_modules() {
        assert_eq!(ModuleSelection::from_ids(Vec::new()), ModuleSelection::All);
        let only = ModuleSelection::from_ids([3, 1]);
        assert!(only.contains(3));
        assert!(!only.contains(2));
    }
}
