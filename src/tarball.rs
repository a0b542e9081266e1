// tarball.rs: detached-signature check for source tarballs

use log::info;
use std::path::Path;

use crate::error::{ErrPrefix, ErrorKind, Result};
use crate::runner::CommandRunner;
use crate::verifier::{require_path, Verifier};

impl<R: CommandRunner> Verifier<R> {
    /// Verify the detached signature `signature_path` of `tarball_path`
    /// using only the public key at `public_key_path`.
    pub fn verify_tarball_signature(
        &self,
        tarball_path: &Path,
        signature_path: &Path,
        public_key_path: &Path,
        prefix: &ErrPrefix,
    ) -> Result<()> {
        require_path("tarball", tarball_path, prefix)?;
        require_path("signature", signature_path, prefix)?;

        let keyring = self.ephemeral_keyring(public_key_path, prefix)?;
        let verify = keyring
            .gpg_command()
            .arg("--verify")
            .arg(signature_path)
            .arg(tarball_path);
        self.runner().capture(&verify).map_err(|source| {
            prefix.wrap(ErrorKind::TarballSignature {
                tarball: tarball_path.to_path_buf(),
                signature: signature_path.to_path_buf(),
                key: public_key_path.to_path_buf(),
                source,
            })
        })?;

        info!(
            "verified signature {} of {}",
            signature_path.display(),
            tarball_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{arg_after, exit, touch, FakeRunner};

    struct Fixture {
        _dir: tempfile::TempDir,
        tarball: std::path::PathBuf,
        sig: std::path::PathBuf,
        key: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        Fixture {
            tarball: touch(dir.path(), "foo-1.0.tar.gz"),
            sig: touch(dir.path(), "foo-1.0.tar.gz.asc"),
            key: touch(dir.path(), "upstream.asc"),
            _dir: dir,
        }
    }

    #[test]
    fn verifies_against_ephemeral_keyring() {
        let f = fixture();
        let v = Verifier::with_runner(Config::default(), FakeRunner::succeeding());
        v.verify_tarball_signature(&f.tarball, &f.sig, &f.key, &ErrPrefix::default())
            .unwrap();

        let calls = v.runner().calls();
        assert_eq!(calls.len(), 3);
        let verify = &calls[2];
        assert_eq!(arg_after(verify, "--verify"), Some(f.sig.display().to_string()));
        assert_eq!(
            verify.get_args().last().unwrap(),
            f.tarball.as_os_str()
        );
        let home = arg_after(verify, "--homedir").unwrap();
        assert_eq!(arg_after(&calls[1], "--homedir"), Some(home.clone()));
        assert!(!Path::new(&home).exists());
    }

    #[test]
    fn bad_signature_reports_diagnostics_and_cleans_up() {
        let f = fixture();
        let v = Verifier::with_runner(
            Config::default(),
            FakeRunner::new(|cmd| {
                if cmd.has_arg("--verify") {
                    Err(exit(cmd, 1, "gpg: BAD signature from \"Upstream\"", "[GNUPG:] BADSIG"))
                } else {
                    Ok(String::new())
                }
            }),
        );
        let err = v
            .verify_tarball_signature(&f.tarball, &f.sig, &f.key, &ErrPrefix::new("srpm foo: "))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TarballSignature { .. }));
        let msg = err.to_string();
        assert!(msg.starts_with("srpm foo: Error verifying signature"));
        assert!(msg.contains("BAD signature"));
        assert!(msg.contains("[GNUPG:] BADSIG"));

        let home = arg_after(&v.runner().calls()[0], "--homedir").unwrap();
        assert!(!Path::new(&home).exists());
    }

    #[test]
    fn import_failure_prevents_verification() {
        let f = fixture();
        let v = Verifier::with_runner(
            Config::default(),
            FakeRunner::new(|cmd| {
                if cmd.has_arg("--import") {
                    Err(exit(cmd, 2, "gpg: no valid OpenPGP data found.", ""))
                } else {
                    Ok(String::new())
                }
            }),
        );
        let err = v
            .verify_tarball_signature(&f.tarball, &f.sig, &f.key, &ErrPrefix::default())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::KeyImport { .. }));
        let calls = v.runner().calls();
        assert!(calls.iter().all(|c| !c.has_arg("--verify")));
        let home = arg_after(&calls[0], "--homedir").unwrap();
        assert!(!Path::new(&home).exists());
    }

    #[test]
    fn missing_signature_is_an_input_error() {
        let f = fixture();
        let v = Verifier::with_runner(Config::default(), FakeRunner::succeeding());
        let err = v
            .verify_tarball_signature(
                &f.tarball,
                Path::new("/nonexistent/foo.asc"),
                &f.key,
                &ErrPrefix::default(),
            )
            .unwrap_err();
        assert!(err.kind().is_input_error());
        assert!(v.runner().calls().is_empty());
    }
}
