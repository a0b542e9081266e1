// lib.rs: signature verification for build inputs
//
// Establishes trust in RPM packages, source tarballs and git revisions
// before a build consumes them:
//
//   rpm.rs      rpm -K check against rpm's own keyring
//   tarball.rs  gpg --verify of a detached signature
//   git.rs      revision classification, version tokens, verify-commit/tag
//   keyring.rs  per-call GnuPG keyring holding only the supplied key
//   runner.rs   external process invocation
//
// Tarball and git checks never consult the operator's default keyring.

mod config;
mod error;
mod git;
mod keyring;
mod rpm;
mod runner;
mod tarball;
mod verifier;

#[cfg(test)]
mod testing;

pub use config::{Config, ToolPaths};
pub use error::{ErrPrefix, Error, ErrorKind, Result};
pub use git::{derive_version, GitSpec, RevisionKind};
pub use keyring::EphemeralKeyring;
pub use rpm::RPM_SIGNATURE_MARKER;
pub use runner::{CommandError, CommandRunner, SystemRunner, ToolCommand};
pub use verifier::Verifier;
