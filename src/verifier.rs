// verifier.rs: the verification context
//
// A `Verifier` owns the configuration and the command runner that every
// check uses. The checks themselves live in rpm.rs, tarball.rs and git.rs.

use std::path::Path;

use crate::config::Config;
use crate::error::{ErrPrefix, ErrorKind, Result};
use crate::keyring::EphemeralKeyring;
use crate::runner::{CommandRunner, SystemRunner};

pub struct Verifier<R = SystemRunner> {
    config: Config,
    runner: R,
}

impl Verifier<SystemRunner> {
    /// A verifier that spawns real processes, quiet or not per `config`.
    pub fn new(config: Config) -> Self {
        let runner = SystemRunner::new(config.quiet);
        Self { config, runner }
    }
}

impl<R: CommandRunner> Verifier<R> {
    pub fn with_runner(config: Config, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub(crate) fn ephemeral_keyring(
        &self,
        public_key: &Path,
        prefix: &ErrPrefix,
    ) -> Result<EphemeralKeyring> {
        EphemeralKeyring::create(&self.runner, &self.config.tools.gpg, public_key, prefix)
    }
}

pub(crate) fn require_path(what: &'static str, path: &Path, prefix: &ErrPrefix) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(prefix.wrap(ErrorKind::MissingPath {
            what,
            path: path.to_path_buf(),
        }))
    }
}
