// git.rs: git revision classification, version derivation and signature check
//
// A revision is classified by asking the clone itself: an exact
// refs/tags/<rev> ref makes it a tag (annotated or lightweight), otherwise
// `git cat-file -t` must report a commit or tag object. Anything else is
// rejected before any keyring is built or verify verb is run.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::error::{ErrPrefix, ErrorKind, Result};
use crate::runner::{CommandRunner, ToolCommand};
use crate::verifier::{require_path, Verifier};

/// A git revision inside an existing local clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSpec {
    /// Commit hash (short or full) or tag name.
    pub revision: String,
    pub cloned_dir: PathBuf,
}

impl GitSpec {
    pub fn new(revision: impl Into<String>, cloned_dir: impl Into<PathBuf>) -> Self {
        Self {
            revision: revision.into(),
            cloned_dir: cloned_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
    Commit,
    Tag,
}

impl RevisionKind {
    fn verify_verb(self) -> &'static str {
        match self {
            RevisionKind::Commit => "verify-commit",
            RevisionKind::Tag => "verify-tag",
        }
    }
}

/// Stable version token for a classified revision.
///
/// Tags are returned unchanged. Commit hashes no longer than `short_len`
/// are returned unchanged; longer ones are cut to `short_len` characters.
/// A `short_len` of zero is treated as one.
pub fn derive_version(
    kind: RevisionKind,
    revision: &str,
    short_len: usize,
) -> std::result::Result<String, ErrorKind> {
    if revision.is_empty() {
        return Err(ErrorKind::EmptyRevision);
    }
    match kind {
        RevisionKind::Tag => Ok(revision.to_string()),
        RevisionKind::Commit => {
            if !is_hex(revision) {
                return Err(ErrorKind::InvalidRevision {
                    revision: revision.to_string(),
                    object_type: "not a commit hash".to_string(),
                });
            }
            let short_len = short_len.max(1);
            // hex is ASCII, so byte and char offsets agree
            Ok(revision[..revision.len().min(short_len)].to_string())
        }
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Reject revisions that cannot name an object or could be read as options.
fn check_revision_shape(revision: &str) -> std::result::Result<(), ErrorKind> {
    if revision.is_empty() {
        return Err(ErrorKind::EmptyRevision);
    }
    if revision.starts_with('-') || revision.chars().any(char::is_whitespace) {
        return Err(ErrorKind::InvalidRevision {
            revision: revision.to_string(),
            object_type: "not a revision name".to_string(),
        });
    }
    Ok(())
}

impl<R: CommandRunner> Verifier<R> {
    fn git_in(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.config().tools.git).current_dir(dir)
    }

    fn git_query(&self, spec: &GitSpec, args: &[&str], prefix: &ErrPrefix) -> Result<String> {
        let cmd = self.git_in(&spec.cloned_dir).args(args);
        self.runner().capture(&cmd).map_err(|source| {
            prefix.wrap(ErrorKind::Classify {
                revision: spec.revision.clone(),
                dir: spec.cloned_dir.clone(),
                source,
            })
        })
    }

    /// Decide whether `spec.revision` names a commit or a tag in its clone.
    pub fn classify_revision(&self, spec: &GitSpec, prefix: &ErrPrefix) -> Result<RevisionKind> {
        check_revision_shape(&spec.revision).map_err(|kind| prefix.wrap(kind))?;

        let tag_ref = format!("refs/tags/{}", spec.revision);
        let refs = self.git_query(
            spec,
            &["for-each-ref", "--format=%(refname)", &tag_ref],
            prefix,
        )?;
        if refs.lines().any(|line| line.trim() == tag_ref) {
            debug!("{} is a tag in {}", spec.revision, spec.cloned_dir.display());
            return Ok(RevisionKind::Tag);
        }

        let object_type = self.git_query(spec, &["cat-file", "-t", &spec.revision], prefix)?;
        let kind = match object_type.trim() {
            "commit" => RevisionKind::Commit,
            "tag" => RevisionKind::Tag,
            other => {
                return Err(prefix.wrap(ErrorKind::InvalidRevision {
                    revision: spec.revision.clone(),
                    object_type: other.to_string(),
                }))
            }
        };
        debug!(
            "{} is a {:?} in {}",
            spec.revision,
            kind,
            spec.cloned_dir.display()
        );
        Ok(kind)
    }

    /// Version token for `spec.revision`: the tag name, or the commit hash
    /// at the repository's short length (or the configured one).
    pub fn version_from_revision(&self, spec: &GitSpec, prefix: &ErrPrefix) -> Result<String> {
        let kind = self.classify_revision(spec, prefix)?;
        if kind == RevisionKind::Tag {
            return derive_version(kind, &spec.revision, 0).map_err(|k| prefix.wrap(k));
        }

        // Branch names and rev expressions resolve to their commit hash.
        let hash = if is_hex(&spec.revision) {
            spec.revision.clone()
        } else {
            let commitish = format!("{}^{{commit}}", spec.revision);
            self.git_query(spec, &["rev-parse", "--verify", &commitish], prefix)?
                .trim()
                .to_string()
        };

        let short_len = match self.config().short_commit_len {
            Some(len) => len,
            None => self
                .git_query(spec, &["rev-parse", "--short", &hash], prefix)?
                .trim()
                .len(),
        };
        derive_version(kind, &hash, short_len).map_err(|k| prefix.wrap(k))
    }

    /// Verify that the commit or tag `spec.revision` is signed by the key at
    /// `public_key_path`.
    pub fn verify_git_signature(
        &self,
        public_key_path: &Path,
        spec: &GitSpec,
        prefix: &ErrPrefix,
    ) -> Result<()> {
        require_path("public-key", public_key_path, prefix)?;
        require_path("cloned repository", &spec.cloned_dir, prefix)?;
        let kind = self.classify_revision(spec, prefix)?;

        let keyring = self.ephemeral_keyring(public_key_path, prefix)?;
        let (var, home) = keyring.gnupg_env();
        let verify = self
            .git_in(&spec.cloned_dir)
            .env(var, home)
            .args([kind.verify_verb(), "-v", spec.revision.as_str()]);
        self.runner().run(&verify).map_err(|source| {
            prefix.wrap(ErrorKind::GitSignature {
                dir: spec.cloned_dir.clone(),
                source,
            })
        })?;

        info!(
            "verified {:?} {} in {}",
            kind,
            spec.revision,
            spec.cloned_dir.display()
        );
        Ok(())
    }
}
