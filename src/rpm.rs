// rpm.rs: RPM package signature check
//
// Relies on the keys already imported into rpm's own database; no ephemeral
// keyring is involved. Success is the literal marker in `rpm -K` output,
// since rpm exits 0 for packages whose signatures were merely not checked.

use log::info;
use std::path::Path;

use crate::error::{ErrPrefix, ErrorKind, Result};
use crate::runner::{CommandRunner, ToolCommand};
use crate::verifier::{require_path, Verifier};

/// Text `rpm -K` prints when both digests and signatures verified.
pub const RPM_SIGNATURE_MARKER: &str = "digests signatures OK";

impl<R: CommandRunner> Verifier<R> {
    /// Verify that the RPM at `rpm_path` is signed with a key in rpm's
    /// keyring and that its digests and signatures are valid.
    pub fn verify_rpm_signature(&self, rpm_path: &Path, prefix: &ErrPrefix) -> Result<()> {
        require_path("rpm", rpm_path, prefix)?;

        let cmd = ToolCommand::new(&self.config().tools.rpm)
            .arg("-K")
            .arg(rpm_path);
        let output = self.runner().capture(&cmd).map_err(|source| {
            prefix.wrap(ErrorKind::RpmCheck {
                rpm: rpm_path.to_path_buf(),
                source,
            })
        })?;

        if !output.contains(RPM_SIGNATURE_MARKER) {
            return Err(prefix.wrap(ErrorKind::RpmSignature {
                rpm: rpm_path.to_path_buf(),
                output,
            }));
        }

        info!("verified rpm signature of {}", rpm_path.display());
        Ok(())
    }
}
