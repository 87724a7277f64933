// How failures are classified during an import run:
// - `FatalError` stops the run before or during processing.
// - `RecordError` skips one recipe and counts it as failed.
// - `ImageError` is reported and otherwise ignored.

use std::fmt;

use thiserror::Error;

use crate::api::ClientError;
use crate::archive::ArchiveError;
use crate::record::DecodeError;
use crate::translate::TranslationError;

#[derive(Debug, Error)]
pub enum FatalError {
    #[error("cannot read recipe archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("cannot authenticate with the Mealie server: {0}")]
    Auth(#[from] ClientError),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("server rejected recipe (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("could not reach server: {0}")]
    Transport(#[source] ClientError),
}

/// Which best-effort image step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStep {
    Upload,
    Fetch,
}

impl fmt::Display for ImageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageStep::Upload => f.write_str("image upload"),
            ImageStep::Fetch => f.write_str("image fetch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("embedded photo is not valid base64: {0}")]
    EmbeddedImage(#[from] base64::DecodeError),

    #[error("{step} rejected (status {status}): {body}")]
    Rejected {
        step: ImageStep,
        status: u16,
        body: String,
    },

    #[error("{step} could not reach server: {source}")]
    Transport {
        step: ImageStep,
        #[source]
        source: ClientError,
    },
}
