// testing.rs: recording fake runner shared by the unit tests

use std::sync::Mutex;

use crate::runner::{CommandError, CommandRunner, ToolCommand};

type Responder = Box<dyn Fn(&ToolCommand) -> Result<String, CommandError> + Send + Sync>;

/// Records every invocation and answers from a closure instead of spawning.
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<ToolCommand>>,
    respond: Responder,
}

impl FakeRunner {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&ToolCommand) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Every command succeeds with empty output.
    pub(crate) fn succeeding() -> Self {
        Self::new(|_| Ok(String::new()))
    }

    pub(crate) fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, cmd: &ToolCommand) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push(cmd.clone());
        (self.respond)(cmd)
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<(), CommandError> {
        self.answer(cmd).map(|_| ())
    }

    fn capture(&self, cmd: &ToolCommand) -> Result<String, CommandError> {
        self.answer(cmd)
    }
}

pub(crate) fn exit(cmd: &ToolCommand, code: i32, stderr: &str, stdout: &str) -> CommandError {
    CommandError::Exit {
        command: cmd.to_string(),
        code: Some(code),
        stderr: stderr.to_string(),
        stdout: stdout.to_string(),
    }
}

/// The value following `flag` in a recorded command.
pub(crate) fn arg_after(cmd: &ToolCommand, flag: &str) -> Option<String> {
    let args = cmd.get_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|a| a.to_string_lossy().into_owned())
}

/// Creates an empty file at `name` inside `dir` and returns its path.
pub(crate) fn touch(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"").unwrap();
    path
}
