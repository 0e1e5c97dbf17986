use std::fmt;
use std::ops::AddAssign;

/// Counters gathered over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Actions executed.
    pub executed: usize,
    /// Nodes in the execution record, loop nodes included.
    pub recorded: usize,
    /// Loop nodes in the execution record.
    pub loops: usize,
    /// Operations recorded while a loop body was being skipped.
    pub skipped: usize,
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Self) {
        self.executed += other.executed;
        self.recorded += other.recorded;
        self.loops += other.loops;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "executed={} recorded={} loops={} skipped={}",
            self.executed, self.recorded, self.loops, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let mut total = Stats::default();
        total += Stats { executed: 3, recorded: 2, loops: 1, skipped: 0 };
        total += Stats { executed: 1, recorded: 1, loops: 0, skipped: 4 };
        assert_eq!(total, Stats { executed: 4, recorded: 3, loops: 1, skipped: 4 });
    }

    #[test]
    fn test_display() {
        let stats = Stats { executed: 10, recorded: 5, loops: 1, skipped: 2 };
        assert_eq!(stats.to_string(), "executed=10 recorded=5 loops=1 skipped=2");
    }
}
