use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::record::Record;
use crate::tape::Tape;

pub const PLUS: u8 = b'+';
pub const MINUS: u8 = b'-';
pub const GREATER: u8 = b'>';
pub const LESS: u8 = b'<';
pub const DOT: u8 = b'.';
pub const COMMA: u8 = b',';
pub const LBRACKET: u8 = b'[';
pub const RBRACKET: u8 = b']';

/// The body of a simple command. Shared between threads when a registry
/// serves a parallel batch, hence `Send + Sync`.
pub type Action = Arc<dyn Fn(&mut Tape<'_>) -> Result<()> + Send + Sync>;

/// Commands that shape the execution record as well as acting on the tape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Structural {
    LoopOpen,
    LoopClose,
}

impl Structural {
    /// Runs before the command's node is appended.
    pub(crate) fn on_link(self, record: &mut Record<'_>) {
        if self == Structural::LoopOpen {
            record.open_loop();
        }
    }

    /// Runs right after the command's node is appended.
    pub(crate) fn after_link(self, record: &mut Record<'_>) -> Result<()> {
        if self == Structural::LoopClose {
            record.close_loop()?;
        }
        Ok(())
    }

    /// Runs every time the node is reached while draining.
    pub(crate) fn act(self, tape: &Tape<'_>, record: &mut Record<'_>) {
        match self {
            Structural::LoopOpen => {
                if tape.current_byte() == 0 {
                    record.break_loop();
                }
            }
            Structural::LoopClose => record.end_loop(),
        }
    }
}

#[derive(Clone)]
pub enum Kind {
    Simple(Action),
    Structural(Structural),
}

/// A token bound to what it does.
#[derive(Clone)]
pub struct Command {
    token: u8,
    kind: Kind,
}

impl Command {
    /// A command with an action only. This is the form extensions take.
    pub fn simple<F>(token: u8, action: F) -> Self
    where
        F: Fn(&mut Tape<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            token,
            kind: Kind::Simple(Arc::new(action)),
        }
    }

    pub(crate) fn structural(token: u8, structural: Structural) -> Self {
        Self {
            token,
            kind: Kind::Structural(structural),
        }
    }

    pub fn token(&self) -> u8 {
        self.token
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub(crate) fn execute(&self, tape: &mut Tape<'_>, record: &mut Record<'_>) -> Result<()> {
        match &self.kind {
            Kind::Simple(action) => action(tape),
            Kind::Structural(s) => {
                s.act(tape, record);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Simple(_) => "simple",
            Kind::Structural(Structural::LoopOpen) => "loop-open",
            Kind::Structural(Structural::LoopClose) => "loop-close",
        };
        f.debug_struct("Command")
            .field("token", &char::from(self.token))
            .field("kind", &kind)
            .finish()
    }
}

fn increment(tape: &mut Tape<'_>) -> Result<()> {
    tape.set_current_byte(tape.current_byte().wrapping_add(1));
    Ok(())
}

fn decrement(tape: &mut Tape<'_>) -> Result<()> {
    tape.set_current_byte(tape.current_byte().wrapping_sub(1));
    Ok(())
}

fn pointer_right(tape: &mut Tape<'_>) -> Result<()> {
    tape.shift(1)
}

fn pointer_left(tape: &mut Tape<'_>) -> Result<()> {
    tape.shift(-1)
}

fn output(tape: &mut Tape<'_>) -> Result<()> {
    tape.emit_output_byte(tape.current_byte())
}

fn input(tape: &mut Tape<'_>) -> Result<()> {
    if let Some(byte) = tape.consume_input_byte()? {
        tape.set_current_byte(byte);
    }
    Ok(())
}

/// The eight built-in commands, in registration order.
pub fn builtins() -> Vec<Command> {
    vec![
        Command::simple(PLUS, increment),
        Command::simple(MINUS, decrement),
        Command::simple(GREATER, pointer_right),
        Command::simple(LESS, pointer_left),
        Command::simple(DOT, output),
        Command::simple(COMMA, input),
        Command::structural(LBRACKET, Structural::LoopOpen),
        Command::structural(RBRACKET, Structural::LoopClose),
    ]
}
