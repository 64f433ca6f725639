use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a route string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {0:?} must have exactly three dot-delimited segments")]
    SegmentCount(String),
    #[error("route {0:?} has an empty segment")]
    EmptySegment(String),
}

/// Dot-delimited logical address of a remote handler.
///
/// A route always has exactly three segments, `kind.service.method`: the
/// server kind discovery resolves against, the service on that server, and
/// the handler method inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    kind: String,
    service: String,
    method: String,
}

impl Route {
    /// Server kind the route targets.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('.').collect();
        let [kind, service, method] = segments[..] else {
            return Err(RouteError::SegmentCount(s.to_string()));
        };
        if kind.is_empty() || service.is_empty() || method.is_empty() {
            return Err(RouteError::EmptySegment(s.to_string()));
        }
        Ok(Self {
            kind: kind.to_string(),
            service: service.to_string(),
            method: method.to_string(),
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.kind, self.service, self.method)
    }
}
