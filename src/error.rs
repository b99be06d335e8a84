//! Error taxonomy for the sampler core.
//!
//! Only fatal conditions are errors. Diagnostic-classified sampler failures,
//! incomplete output and attempt timeouts are [`RunStatus`](crate::domain::RunStatus)
//! values that the retry loop consumes; they never surface here.

use std::path::PathBuf;

use crate::domain::ModelVariant;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A file or directory could not be created, opened or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed content: wrong row/column count, unparsable numbers,
    /// parameter-count mismatch, invalid request values.
    #[error("{0}")]
    Value(String),

    /// The sampler binary could not be spawned.
    #[error("Failed to launch sampler '{}': {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every attempt for one variant ended without a Good run.
    #[error("Sampler run exhausted for star {star_id} ({variant}) after {attempts} attempt(s)")]
    RunExhausted {
        star_id: String,
        variant: ModelVariant,
        attempts: usize,
    },

    #[error("Sampler run cancelled for star {star_id} ({variant})")]
    Cancelled {
        star_id: String,
        variant: ModelVariant,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    /// Stable process exit code for front-ends that wrap this library.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Io { .. } | PipelineError::Config(_) | PipelineError::Export(_) => 2,
            PipelineError::Value(_) => 3,
            PipelineError::Launch { .. }
            | PipelineError::RunExhausted { .. }
            | PipelineError::Cancelled { .. } => 4,
        }
    }

    /// True when the error means a required file was absent.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, PipelineError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_concern() {
        let io = PipelineError::io("x", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(io.exit_code(), 2);
        assert!(io.is_missing_file());
        assert_eq!(PipelineError::value("bad").exit_code(), 3);

        let exhausted = PipelineError::RunExhausted {
            star_id: "KIC123".to_string(),
            variant: ModelVariant::Full,
            attempts: 2,
        };
        assert_eq!(exhausted.exit_code(), 4);
        assert!(exhausted.to_string().contains("KIC123"));
        assert!(exhausted.to_string().contains("Full"));
    }
}
