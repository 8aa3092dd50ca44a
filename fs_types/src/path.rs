//! Logical path and authority types
//!
//! A logical path is what the host framework hands the bridge: an
//! optional authority (`name[:port]`) plus a hierarchical path string.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing an authority string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorityParseError {
    /// Authority is empty
    #[error("Empty authority")]
    Empty,

    /// Host component contains an illegal character
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    /// Port component is not a valid decimal port number
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// The addressing component of a logical path's origin: `name[:port]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Authority {
    /// Host or partition name
    pub host: String,
    /// Optional port
    pub port: Option<u16>,
}

impl Authority {
    /// Creates an authority without a port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    /// Creates an authority with a port
    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
        }
    }
}

impl FromStr for Authority {
    type Err = AuthorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AuthorityParseError::Empty);
        }

        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AuthorityParseError::InvalidPort(port.to_string()))?;
                (host, Some(port))
            }
            None => (s, None),
        };

        if host.is_empty() || host.contains('/') || host.contains('\0') {
            return Err(AuthorityParseError::InvalidHost(host.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// A hierarchical path as seen by the host framework
///
/// Immutable once constructed. The backend-native rendition of this
/// path is produced exclusively by the bridge's path translator and is
/// never exposed back through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPath {
    authority: Option<Authority>,
    path: String,
}

impl LogicalPath {
    /// Creates a logical path with no authority
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            authority: None,
            path: path.into(),
        }
    }

    /// Creates a logical path addressed at an authority
    pub fn with_authority(authority: Authority, path: impl Into<String>) -> Self {
        Self {
            authority: Some(authority),
            path: path.into(),
        }
    }

    /// Returns the authority, if any
    pub fn authority(&self) -> Option<&Authority> {
        self.authority.as_ref()
    }

    /// Returns the hierarchical path string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the containing directory, or `None` at the root
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.path.trim_end_matches('/');
        let idx = trimmed.rfind('/')?;
        let parent = if idx == 0 { "/" } else { &trimmed[..idx] };
        Some(Self {
            authority: self.authority.clone(),
            path: parent.to_string(),
        })
    }

    /// Returns a new path with one entry name appended
    ///
    /// Used when expanding directory listings into child paths.
    pub fn child(&self, name: &str) -> Self {
        let path = if self.path.ends_with('/') {
            format!("{}{}", self.path, name)
        } else {
            format!("{}/{}", self.path, name)
        };
        Self {
            authority: self.authority.clone(),
            path,
        }
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.authority {
            Some(authority) => write!(f, "//{}{}", authority, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authority_without_port() {
        let authority: Authority = "partition1".parse().unwrap();
        assert_eq!(authority.host, "partition1");
        assert_eq!(authority.port, None);
    }

    #[test]
    fn test_parse_authority_with_port() {
        let authority: Authority = "node0:9870".parse().unwrap();
        assert_eq!(authority.host, "node0");
        assert_eq!(authority.port, Some(9870));
    }

    #[test]
    fn test_parse_empty_authority() {
        let result = "".parse::<Authority>();
        assert_eq!(result, Err(AuthorityParseError::Empty));
    }

    #[test]
    fn test_parse_bad_port() {
        let result = "node0:banana".parse::<Authority>();
        assert!(matches!(result, Err(AuthorityParseError::InvalidPort(_))));
    }

    #[test]
    fn test_parse_host_with_slash() {
        let result = "node0/extra".parse::<Authority>();
        assert!(matches!(result, Err(AuthorityParseError::InvalidHost(_))));
    }

    #[test]
    fn test_authority_display_round_trip() {
        let authority = Authority::with_port("node0", 7000);
        assert_eq!(authority.to_string(), "node0:7000");
        assert_eq!(
            authority.to_string().parse::<Authority>().unwrap(),
            authority
        );
    }

    #[test]
    fn test_child_appends_segment() {
        let parent = LogicalPath::new("/data/logs");
        let child = parent.child("today.log");
        assert_eq!(child.path(), "/data/logs/today.log");
    }

    #[test]
    fn test_child_of_trailing_slash() {
        let parent = LogicalPath::new("/data/");
        let child = parent.child("x");
        assert_eq!(child.path(), "/data/x");
    }

    #[test]
    fn test_child_keeps_authority() {
        let parent =
            LogicalPath::with_authority(Authority::new("part1"), "/tmp");
        let child = parent.child("file");
        assert_eq!(child.authority().unwrap().host, "part1");
        assert_eq!(child.path(), "/tmp/file");
    }

    #[test]
    fn test_parent_walks_up() {
        let path = LogicalPath::new("/a/b/c");
        let parent = path.parent().unwrap();
        assert_eq!(parent.path(), "/a/b");
        assert_eq!(parent.parent().unwrap().path(), "/a");
        assert_eq!(parent.parent().unwrap().parent().unwrap().path(), "/");
    }

    #[test]
    fn test_parent_of_root_is_none() {
        assert_eq!(LogicalPath::new("/").parent(), None);
    }

    #[test]
    fn test_display_with_authority() {
        let path = LogicalPath::with_authority(Authority::new("part1"), "/tmp/a");
        assert_eq!(path.to_string(), "//part1/tmp/a");
    }
}
