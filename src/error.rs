// error.rs: failure taxonomy for the verifiers
//
// Every error carries the caller's `ErrPrefix` verbatim in front of its
// message so a multi-stage pipeline can attribute it to a stage.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::runner::CommandError;

/// Caller-supplied context prepended to every failure message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ErrPrefix(String);

impl ErrPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn wrap(&self, kind: ErrorKind) -> Error {
        Error {
            prefix: self.clone(),
            kind,
        }
    }
}

impl fmt::Display for ErrPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrPrefix {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ErrPrefix {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Error)]
#[error("{prefix}{kind}")]
pub struct Error {
    prefix: ErrPrefix,
    #[source]
    kind: ErrorKind,
}

impl Error {
    pub fn prefix(&self) -> &ErrPrefix {
        &self.prefix
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ErrorKind {
    // Input errors.
    #[error("empty revision provided, provide either a COMMIT or TAG")]
    EmptyRevision,

    #[error("invalid revision {revision} provided ({object_type}), provide either a COMMIT or TAG")]
    InvalidRevision {
        revision: String,
        object_type: String,
    },

    #[error("{what} {} does not exist", .path.display())]
    MissingPath { what: &'static str, path: PathBuf },

    #[error("unable to classify revision {revision} in {}: {source}", .dir.display())]
    Classify {
        revision: String,
        dir: PathBuf,
        #[source]
        source: CommandError,
    },

    // Resource and trust-setup errors.
    #[error("Error '{0}' creating temp dir for keyring")]
    TempDir(#[source] io::Error),

    #[error("Error '{0}' writing keyring configuration")]
    KeyringSetup(#[source] io::Error),

    #[error("Error '{0}' creating keyring")]
    KeyringCreate(#[source] CommandError),

    #[error("Error '{source}' importing public-key {}", .key.display())]
    KeyImport {
        key: PathBuf,
        #[source]
        source: CommandError,
    },

    // Verification failures.
    #[error("Signature check of {} could not run: {source}", .rpm.display())]
    RpmCheck {
        rpm: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("Signature check of {} failed. rpm -K output:\n{output}", .rpm.display())]
    RpmSignature { rpm: PathBuf, output: String },

    #[error(
        "Error verifying signature {} for tarball {} with pubkey {}.\ngpg --verify err: {source}\nstdout:{}",
        .signature.display(), .tarball.display(), .key.display(), .source.stdout()
    )]
    TarballSignature {
        tarball: PathBuf,
        signature: PathBuf,
        key: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("error during verifying git repo at {}: {source}", .dir.display())]
    GitSignature {
        dir: PathBuf,
        #[source]
        source: CommandError,
    },
}

impl ErrorKind {
    /// True for errors raised from caller input alone, before any external
    /// tool runs. A failed classification query (`Classify`) is not one.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::EmptyRevision
                | ErrorKind::InvalidRevision { .. }
                | ErrorKind::MissingPath { .. }
        )
    }
}
