use crate::command::{Command, Kind};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::stats::Stats;
use crate::tape::Tape;

/// One script execution in progress: a tape and the record driving it.
///
/// Commands are fed in one at a time with [`Machine::step`]; each call
/// executes everything that can run before returning.
pub struct Machine<'r, 'io> {
    tape: Tape<'io>,
    record: Record<'r>,
    step_limit: Option<usize>,
    executed: usize,
}

impl<'r, 'io> Machine<'r, 'io> {
    pub fn new(tape: Tape<'io>, step_limit: Option<usize>) -> Self {
        Self {
            tape,
            record: Record::new(),
            step_limit,
            executed: 0,
        }
    }

    pub fn tape(&self) -> &Tape<'io> {
        &self.tape
    }

    pub fn record(&self) -> &Record<'r> {
        &self.record
    }

    /// Schedule `command`, then drain the record.
    pub fn step(&mut self, command: &'r Command) -> Result<()> {
        let structural = match command.kind() {
            Kind::Structural(s) => Some(*s),
            Kind::Simple(_) => None,
        };
        if let Some(s) = structural {
            s.on_link(&mut self.record);
        }
        self.record.append(command);
        if let Some(s) = structural {
            s.after_link(&mut self.record)?;
        }
        self.drain()
    }

    fn drain(&mut self) -> Result<()> {
        if self.record.is_skipping() {
            return Ok(());
        }
        while let Some(command) = self.record.advance() {
            if let Some(limit) = self.step_limit {
                if self.executed >= limit {
                    return Err(Error::StepLimitExceeded(limit));
                }
            }
            self.executed += 1;
            command.execute(&mut self.tape, &mut self.record)?;
        }
        Ok(())
    }

    /// End-of-script check: no loop may be left open.
    pub fn finish(&self) -> Result<()> {
        self.record.validate()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            executed: self.executed,
            recorded: self.record.len(),
            loops: self.record.loop_count(),
            skipped: self.record.skipped(),
        }
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.tape.flush()
    }
}
