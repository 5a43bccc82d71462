use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Jail(#[from] nsjail::NsJailError),
}
