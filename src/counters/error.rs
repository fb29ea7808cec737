// Collection failures. Any of these abandons the current sampling cycle.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {source_name}: {detail}")]
    Parse {
        source_name: &'static str,
        detail: String,
    },

    #[error("statvfs {mount_point}: {source}")]
    Statvfs {
        mount_point: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}`: {detail}")]
    Command { command: String, detail: String },

    #[error("host identity: {0}")]
    Identity(String),

    #[error("blocking task: {0}")]
    Join(String),
}

impl CollectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            source_name,
            detail: detail.into(),
        }
    }
}
