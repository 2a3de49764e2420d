use thiserror::Error;

#[derive(Error, Debug)]
pub enum YawiError {
    /// A required environment variable is missing.
    #[error("{0}")]
    Configuration(String),

    /// Dial, write or read on the transport failed.
    #[error("{context}")]
    Connection {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer answered, but not in the expected shape.
    #[error("{0}")]
    Protocol(String),

    /// The query worked and there is no focused window.
    #[error("{0}")]
    NotFound(String),

    /// The service is reachable but the capability behind it is missing.
    #[error("{0}")]
    Unavailable(String),

    #[error("unable to detect supported platform\nSupported: {supported}")]
    UnsupportedPlatform { supported: String },
}

impl YawiError {
    pub fn connection(context: impl Into<String>, source: std::io::Error) -> Self {
        YawiError::Connection {
            context: context.into(),
            source,
        }
    }

    pub fn timed_out(context: impl Into<String>) -> Self {
        let context = context.into();
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed");
        YawiError::Connection { context, source }
    }
}

pub type Result<T> = std::result::Result<T, YawiError>;

#[macro_export]
macro_rules! yawi_error {
    (configuration, $($arg:tt)*) => {
        $crate::error::YawiError::Configuration(format!($($arg)*))
    };
    (protocol, $($arg:tt)*) => {
        $crate::error::YawiError::Protocol(format!($($arg)*))
    };
    (not_found, $($arg:tt)*) => {
        $crate::error::YawiError::NotFound(format!($($arg)*))
    };
    (unavailable, $($arg:tt)*) => {
        $crate::error::YawiError::Unavailable(format!($($arg)*))
    };
}
