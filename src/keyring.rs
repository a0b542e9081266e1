// keyring.rs: call-scoped GnuPG keyrings
//
// A keyring lives in its own freshly created temporary directory and holds
// exactly the public key the caller supplied. The directory is removed when
// the handle is dropped, so every exit path of a verification (including
// `?` returns halfway through setup) cleans up.
//
// The keyring file is named only in the home directory's gpg.conf, which
// also disables the default keyring. Our own gpg calls (--homedir <home>)
// and a gpg spawned by git with GNUPGHOME=<home> read the same file and
// never the operator's keys. Naming it on the command line as well makes
// gpg register the keybox twice and fail.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{ErrPrefix, ErrorKind, Result};
use crate::runner::{CommandRunner, ToolCommand};

const TEMP_PREFIX: &str = "eext-keyring";
const KEYRING_FILE: &str = "eext.gpg";

pub struct EphemeralKeyring {
    dir: Option<TempDir>,
    home: PathBuf,
    keyring: PathBuf,
    gpg: String,
}

impl EphemeralKeyring {
    /// Create the keyring and import `public_key` into it.
    pub fn create<R>(
        runner: &R,
        gpg: &str,
        public_key: &Path,
        prefix: &ErrPrefix,
    ) -> Result<EphemeralKeyring>
    where
        R: CommandRunner + ?Sized,
    {
        if !public_key.exists() {
            return Err(prefix.wrap(ErrorKind::MissingPath {
                what: "public-key",
                path: public_key.to_path_buf(),
            }));
        }

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| prefix.wrap(ErrorKind::TempDir(e)))?;
        let home = dir.path().to_path_buf();
        let keyring = EphemeralKeyring {
            keyring: home.join(KEYRING_FILE),
            home,
            dir: Some(dir),
            gpg: gpg.to_string(),
        };
        debug!("created keyring home {}", keyring.home.display());

        keyring
            .write_gpg_conf()
            .map_err(|e| prefix.wrap(ErrorKind::KeyringSetup(e)))?;

        runner
            .capture(&keyring.gpg_command().arg("--fingerprint"))
            .map_err(|e| prefix.wrap(ErrorKind::KeyringCreate(e)))?;

        runner
            .capture(&keyring.gpg_command().arg("--import").arg(public_key))
            .map_err(|source| {
                prefix.wrap(ErrorKind::KeyImport {
                    key: public_key.to_path_buf(),
                    source,
                })
            })?;
        debug!(
            "imported {} into {}",
            public_key.display(),
            keyring.keyring.display()
        );

        Ok(keyring)
    }

    fn write_gpg_conf(&self) -> io::Result<()> {
        let conf = format!("no-default-keyring\nkeyring {}\n", self.keyring.display());
        fs::write(self.home.join("gpg.conf"), conf)
    }

    pub fn home_dir(&self) -> &Path {
        &self.home
    }

    pub fn keyring_file(&self) -> &Path {
        &self.keyring
    }

    /// A gpg invocation bound to this keyring and nothing else.
    pub fn gpg_command(&self) -> ToolCommand {
        ToolCommand::new(&self.gpg)
            .arg("--batch")
            .arg("--homedir")
            .arg(&self.home)
    }

    /// Environment that points a gpg started by another tool at this keyring.
    pub fn gnupg_env(&self) -> (&'static str, &Path) {
        ("GNUPGHOME", &self.home)
    }

    /// Remove the keyring now, reporting any removal error.
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                debug!("removing keyring home {}", self.home.display());
                dir.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for EphemeralKeyring {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            debug!("removing keyring home {}", self.home.display());
            if let Err(e) = dir.close() {
                warn!("failed to remove keyring home {}: {}", self.home.display(), e);
            }
        }
    }
}
