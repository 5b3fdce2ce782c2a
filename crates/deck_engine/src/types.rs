use std::fmt;
use std::path::PathBuf;

use deck_core::Course;

use crate::output::OutputError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    /// Target of the `rel="next"` entry of the `Link` header, resolved against
    /// the final URL.
    pub next_page: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// 401: the bearer token was rejected.
    Unauthorized,
    /// 404: the resource does not exist or is not visible to the token.
    NotFound,
    /// Any other non-2xx status.
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl FailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            other => FailureKind::HttpStatus(other),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Unauthorized => write!(f, "authentication failed"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Course, module or item listing failed. Always fatal.
    #[error("api request failed: {0}")]
    Api(#[from] FetchError),
    /// Downloading the bytes of a resolved file failed. Always fatal.
    #[error("failed to retrieve {name}: {source}")]
    Retrieval {
        name: String,
        #[source]
        source: FetchError,
    },
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl HarvestError {
    pub fn failure_kind(&self) -> Option<&FailureKind> {
        match self {
            HarvestError::Api(err) | HarvestError::Retrieval { source: err, .. } => Some(&err.kind),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.failure_kind() == Some(&FailureKind::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        self.failure_kind() == Some(&FailureKind::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputArtifact {
    Directory(PathBuf),
    Archive(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub course: Course,
    pub modules_visited: usize,
    /// Distinct download URLs retrieved; equals the number of stored files.
    pub files_retrieved: usize,
    /// File references that reached the dedup check, duplicates included.
    pub references_seen: usize,
    pub duplicates_skipped: usize,
    pub filtered_out: usize,
    pub unresolved: usize,
    pub artifact: OutputArtifact,
}
