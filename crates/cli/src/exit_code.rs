//! Process exit codes
//!
//! Scripts rely on these values, so they must stay stable.

use osc_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments, invalid path or config
    UsageError = 2,
    /// Connection failure, timeout or pool exhaustion
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
    Conflict = 6,
    Interrupted = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a library error to the exit code the CLI reports for it
    pub fn from_error(error: &Error) -> Self {
        Self::from_i32(error.exit_code())
    }

    fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Success,
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            6 => Self::Conflict,
            130 => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
