use std::fmt;

use crate::view::PageKind;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    DocumentNotObject,
    DocumentHeaderInvalid,
    PayloadInvalid,
    FetchTransport,
    FetchStatus,
    FetchDecode,
    TemplateEngineFailed,
    InvalidUrl,
    NavigationSuperseded,
}

impl ErrorCode {
    pub const ALL: [Self; 10] = [
        Self::ConfigParseError,
        Self::DocumentNotObject,
        Self::DocumentHeaderInvalid,
        Self::PayloadInvalid,
        Self::FetchTransport,
        Self::FetchStatus,
        Self::FetchDecode,
        Self::TemplateEngineFailed,
        Self::InvalidUrl,
        Self::NavigationSuperseded,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::DocumentNotObject => "E2001",
            Self::DocumentHeaderInvalid => "E2002",
            Self::PayloadInvalid => "E2003",
            Self::FetchTransport => "E3001",
            Self::FetchStatus => "E3002",
            Self::FetchDecode => "E3003",
            Self::TemplateEngineFailed => "E4002",
            Self::InvalidUrl => "E5001",
            Self::NavigationSuperseded => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::DocumentNotObject => "Document is not a JSON object",
            Self::DocumentHeaderInvalid => "Document header is malformed",
            Self::PayloadInvalid => "Page payload is malformed",
            Self::FetchTransport => "Request failed",
            Self::FetchStatus => "Server returned an error status",
            Self::FetchDecode => "Response is not valid JSON",
            Self::TemplateEngineFailed => "Template rendering failed",
            Self::InvalidUrl => "Invalid URL",
            Self::NavigationSuperseded => "Navigation superseded",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .tickview/config.toml and retry."),
            Self::DocumentNotObject | Self::DocumentHeaderInvalid => {
                Some("Check that the server answered with a page document.")
            }
            Self::PayloadInvalid => {
                Some("Compare the document fields with what its template expects.")
            }
            Self::FetchTransport => Some("Check that the server is reachable."),
            Self::FetchStatus => None,
            Self::FetchDecode => Some("Make sure the URL serves JSON when given ?format=json."),
            Self::TemplateEngineFailed => None,
            Self::InvalidUrl => Some("Use an absolute URL or a path under base_url."),
            Self::NavigationSuperseded => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure to decode or reshape a page document.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("malformed document header: {0}")]
    Header(#[source] serde_json::Error),
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: PageKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ViewError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotAnObject => ErrorCode::DocumentNotObject,
            Self::Header(_) => ErrorCode::DocumentHeaderInvalid,
            Self::Payload { .. } => ErrorCode::PayloadInvalid,
        }
    }
}

/// Failure of a JSON fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("response is not JSON: {0}")]
    Decode(String),
}

impl FetchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::FetchTransport,
            Self::Status(_) => ErrorCode::FetchStatus,
            Self::Decode(_) => ErrorCode::FetchDecode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template engine failed: {0}")]
    Engine(String),
}

impl TemplateError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Engine(_) => ErrorCode::TemplateEngineFailed,
        }
    }
}

/// Failure to draw a page onto a surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl RenderError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::View(e) => e.code(),
            Self::Template(e) => e.code(),
        }
    }
}

/// Failure of a navigation driven end to end.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("navigation {generation} was superseded")]
    Superseded { generation: u64 },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl NavError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::Superseded { .. } => ErrorCode::NavigationSuperseded,
            Self::Fetch(e) => e.code(),
            Self::View(e) => e.code(),
            Self::Render(e) => e.code(),
        }
    }
}
