//! Request key generation.

use crate::transport::HttpMethod;
use std::fmt;

/// Identity of a request for caching and de-duplication.
///
/// Two safe requests with equal keys are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub method: HttpMethod,
    pub path: String,
}

impl RequestKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
