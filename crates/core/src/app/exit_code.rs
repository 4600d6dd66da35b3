use std::fmt;

/// Process exit codes observed by scripts driving the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExitCode {
    Success = 0,
    PartialSuccess = 1,
    UnrecognizedCommand = 2,
    Failure = 100,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Combines the exit codes set over one command invocation.
///
/// The first code set is kept; setting the same code again changes nothing;
/// setting a different one degrades the result to `PartialSuccess`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitCodeTracker {
    current: Option<ExitCode>,
}

impl ExitCodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: ExitCode) {
        self.current = match self.current {
            None => Some(code),
            Some(current) if current == code => Some(current),
            Some(_) => Some(ExitCode::PartialSuccess),
        };
    }

    /// Record that something went wrong without stopping the command.
    pub fn escalate(&mut self) {
        match self.current {
            Some(current) if current > ExitCode::PartialSuccess => {}
            _ => self.current = Some(ExitCode::PartialSuccess),
        }
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    pub fn value(&self) -> ExitCode {
        self.current.unwrap_or(ExitCode::Success)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
