//! Error classification shared by the settlement components.
//!
//! Every module defines its own `thiserror` enum; each of them can be
//! collapsed into an [`ErrorKind`] so callers decide how to respond without
//! matching on module-specific variants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Order, refund, merchant, country or cost rule is absent.
    NotFound,
    /// Request data is inconsistent or unacceptable.
    Validation,
    /// Currency conversion or rate lookup failed.
    ExchangeFailure,
    /// The gateway reported a non-terminal state; retry later.
    Temporary,
    /// Persistence failure or anything unexpected.
    System,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::ExchangeFailure => 424,
            Self::Temporary => 410,
            Self::System => 500,
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::ExchangeFailure => "exchange_failure",
            Self::Temporary => "temporary",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(ErrorKind::NotFound.http_status_code(), 404);
        assert_eq!(ErrorKind::Validation.http_status_code(), 400);
        assert_eq!(ErrorKind::ExchangeFailure.http_status_code(), 424);
        assert_eq!(ErrorKind::Temporary.http_status_code(), 410);
        assert_eq!(ErrorKind::System.http_status_code(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::ExchangeFailure.to_string(), "exchange_failure");
    }
}
