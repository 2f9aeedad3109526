use std::fmt;

#[derive(Debug)]
pub enum ReportError {
    /// Missing or unreadable static asset (font file, theme). Fatal: no
    /// document is produced.
    Asset(String),
    InvalidConfiguration(String),
    /// Backstop for a flowable that fits no page at all. Unreachable through
    /// the composer, which degrades oversized cards to the unboxed path.
    UnplaceableFlowable(String),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Asset(message) => write!(f, "asset error: {}", message),
            ReportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ReportError::UnplaceableFlowable(message) => {
                write!(f, "flowable cannot fit on any page: {}", message)
            }
            ReportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(value: std::io::Error) -> Self {
        ReportError::Io(value)
    }
}
