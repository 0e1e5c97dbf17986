use crate::tape::DEFAULT_TAPE_LEN;

/// Per-run parameters of an interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of cells on the tape.
    pub tape_len: usize,
    /// Maximum number of actions executed per run (`None` for unbounded).
    pub step_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_len: DEFAULT_TAPE_LEN, // 65536
            step_limit: None,
        }
    }
}
