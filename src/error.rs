//! Exit codes and top-level error reporting.

/// Exit codes for the pagewatch binary.
///
/// Every completed check exits with `Success`, including runs where the fetch
/// or the notification failed. `GeneralError` is reserved for runs that could
/// not complete: invalid configuration or an unusable history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The command ran to completion.
    Success = 0,
    /// The command could not run or could not persist its state.
    GeneralError = 1,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PW000",
            Self::GeneralError => "PW001",
        }
    }
}

/// Render an error chain as a single line for stderr.
///
/// `anyhow`'s alternate formatter joins causes with `": "`, which keeps the
/// failing path and the underlying I/O or parse error on the same line.
#[must_use]
pub fn report(err: &anyhow::Error, exit_code: ExitCode) -> String {
    format!("[{}] Error: {:#}", exit_code.code_prefix(), err)
}
