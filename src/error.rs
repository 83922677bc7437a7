#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Serialize,
    Path,
    Resolve,
    Depth,
    Export,
}

/// Error raised while parsing, rehydrating, or exporting a document.
///
/// `path` and `segment` are populated for resolution failures: `path` holds
/// the offending reference string as it appeared in the input, `segment` the
/// zero-based index of the segment that failed to resolve.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub path: Option<String>,
    pub segment: Option<usize>,
}

impl Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
            path: None,
            segment: None,
        }
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Serialize,
            message: message.into(),
            path: None,
            segment: None,
        }
    }

    pub fn path(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Path,
            message: message.into(),
            path: None,
            segment: None,
        }
    }

    pub fn resolve(path: impl Into<String>, segment: usize, message: impl Into<String>) -> Self {
        let path = path.into();
        let message = message.into();
        Self {
            kind: ErrorKind::Resolve,
            message: format!("cannot resolve `{path}` at segment {segment}: {message}"),
            path: Some(path),
            segment: Some(segment),
        }
    }

    pub fn depth(limit: usize) -> Self {
        Self {
            kind: ErrorKind::Depth,
            message: format!("nesting exceeds depth limit of {limit}"),
            path: None,
            segment: None,
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Export,
            message: message.into(),
            path: None,
            segment: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[rstest::rstest]
    fn test_resolve_error_carries_context() {
        let err = Error::resolve("$[5]", 0, "index 5 out of bounds for array of length 0");
        assert_eq!(err.kind, ErrorKind::Resolve);
        assert_eq!(err.path.as_deref(), Some("$[5]"));
        assert_eq!(err.segment, Some(0));
        assert!(err.to_string().contains("$[5]"));
        assert!(err.to_string().contains("segment 0"));
    }

    #[rstest::rstest]
    fn test_builders_set_kind() {
        assert_eq!(Error::parse("x").kind, ErrorKind::Parse);
        assert_eq!(Error::path("x").kind, ErrorKind::Path);
        assert_eq!(Error::depth(128).kind, ErrorKind::Depth);
        assert_eq!(Error::export("x").kind, ErrorKind::Export);
    }

    #[rstest::rstest]
    fn test_with_path_attaches_path() {
        let err = Error::path("not a reference").with_path("$[oops");
        assert_eq!(err.path.as_deref(), Some("$[oops"));
        assert_eq!(err.segment, None);
    }
}
