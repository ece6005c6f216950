use thiserror::Error;

/// Fatal errors that abort a batch run before or instead of processing jobs.
///
/// Per-job failures never show up here; they are carried as
/// [`ImportOutcome`](crate::hub::ImportOutcome) values and end up in the report.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Either --config or --repo is required")]
    MissingSource,

    #[error("admin_secret is required")]
    MissingSecret,

    #[error("No imports specified")]
    NoImports,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Server at {base_url} not reachable after {waited_secs}s, aborting")]
    ServerUnavailable { base_url: String, waited_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ImportError {
    /// Configuration problems are detected before any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ImportError::MissingSource
                | ImportError::MissingSecret
                | ImportError::NoImports
                | ImportError::Config(_)
                | ImportError::Json(_)
                | ImportError::Toml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_unavailable_display() {
        let err = ImportError::ServerUnavailable {
            base_url: "http://localhost:3001".into(),
            waited_secs: 60,
        };
        assert_eq!(
            err.to_string(),
            "Server at http://localhost:3001 not reachable after 60s, aborting"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(ImportError::MissingSecret.is_configuration());
        assert!(ImportError::NoImports.is_configuration());
        assert!(ImportError::MissingSource.is_configuration());
        assert!(ImportError::Config("bad".into()).is_configuration());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImportError>();
    }
}
