// runner.rs: external tool invocation
//
// Every gpg, git and rpm call made by this crate goes through a
// `CommandRunner`. `SystemRunner` spawns real processes; tests substitute a
// recording fake. Output routing (quiet or not) is a property of the runner
// value, never of process-wide state.

use log::debug;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// A fully described invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the program from `dir` instead of the caller's working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    /// True if any argument equals `needle`.
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Running '{command}' failed with '{source}'")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Running '{command}': exited with exit-code {}{}", display_code(.code), display_stderr(.stderr))]
    Exit {
        command: String,
        /// None when the process was terminated by a signal.
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string())
}

// Streamed runs leave stderr on the terminal; only captured stderr is shown.
fn display_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\nstderr:\n{}", stderr)
    }
}

impl CommandError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Exit { code, .. } => *code,
            CommandError::Spawn { .. } => None,
        }
    }

    /// Stdout captured before the failure, if any.
    pub fn stdout(&self) -> &str {
        match self {
            CommandError::Exit { stdout, .. } => stdout,
            CommandError::Spawn { .. } => "",
        }
    }
}

/// Runs external programs on behalf of the verifiers.
pub trait CommandRunner: Send + Sync {
    /// Run to completion. Stderr is always surfaced; stdout is surfaced or
    /// discarded depending on the runner's configuration.
    fn run(&self, cmd: &ToolCommand) -> Result<(), CommandError>;

    /// Run to completion and return captured stdout.
    fn capture(&self, cmd: &ToolCommand) -> Result<String, CommandError>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    quiet: bool,
}

impl SystemRunner {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<(), CommandError> {
        debug!("running {}", cmd);
        let status = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(if self.quiet {
                Stdio::null()
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| CommandError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::Exit {
                command: cmd.to_string(),
                code: status.code(),
                stderr: String::new(),
                stdout: String::new(),
            });
        }
        Ok(())
    }

    fn capture(&self, cmd: &ToolCommand) -> Result<String, CommandError> {
        debug!("capturing {}", cmd);
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CommandError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(CommandError::Exit {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout,
            });
        }
        Ok(stdout)
    }
}
