use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a run (or prevent one from starting).
///
/// Running out of input is deliberately absent: reading past the end of
/// the input stream is not a failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("index {index} is out of range for a tape of {len} cells")]
    OutOfRange { index: isize, len: usize },

    #[error("command {:?} is already registered", char::from(*.0))]
    DuplicateCommand(u8),

    #[error("loop close without a matching loop open")]
    MissingLoopOpen,

    #[error("script ended with {0} unterminated loop(s)")]
    UnterminatedLoop(usize),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(usize),

    #[error("tape length must be at least one cell")]
    EmptyTape,

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange {
            index: isize::try_from(index).unwrap_or(isize::MAX),
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::DuplicateCommand(b'+').to_string(),
            "command '+' is already registered"
        );
        assert_eq!(
            Error::OutOfRange { index: -1, len: 5 }.to_string(),
            "index -1 is out of range for a tape of 5 cells"
        );
        assert_eq!(
            Error::UnterminatedLoop(2).to_string(),
            "script ended with 2 unterminated loop(s)"
        );
    }

    #[test]
    fn test_out_of_range_saturates() {
        match Error::out_of_range(usize::MAX, 3) {
            Error::OutOfRange { index, len } => {
                assert_eq!(index, isize::MAX);
                assert_eq!(len, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
