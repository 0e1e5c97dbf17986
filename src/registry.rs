use crate::command::{builtins, Command};
use crate::error::{Error, Result};

/// The fixed set of commands a script may use, indexed by token.
///
/// Built once, before any script runs, and read-only afterwards. Tokens
/// with no command are ignored by the interpreter.
#[derive(Clone)]
pub struct Registry {
    table: Vec<Option<Command>>,
    len: usize,
}

impl Registry {
    /// The eight built-in commands followed by `extensions`, in order.
    /// Fails if any token is registered twice.
    pub fn new<I>(extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut registry = Self::builtin();
        for command in extensions {
            registry.register(command)?;
        }
        tracing::debug!(commands = registry.len, "registry built");
        Ok(registry)
    }

    /// Only the built-in commands.
    pub fn builtin() -> Self {
        let mut registry = Self {
            table: vec![None; 256],
            len: 0,
        };
        for command in builtins() {
            let slot = &mut registry.table[command.token() as usize];
            debug_assert!(slot.is_none());
            *slot = Some(command);
            registry.len += 1;
        }
        registry
    }

    fn register(&mut self, command: Command) -> Result<()> {
        let slot = &mut self.table[command.token() as usize];
        if slot.is_some() {
            return Err(Error::DuplicateCommand(command.token()));
        }
        *slot = Some(command);
        self.len += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn lookup(&self, token: u8) -> Option<&Command> {
        self.table[token as usize].as_ref()
    }

    pub fn contains(&self, token: u8) -> bool {
        self.lookup(token).is_some()
    }

    /// Registered tokens in ascending byte order.
    pub fn tokens(&self) -> impl Iterator<Item = u8> + '_ {
        self.table.iter().flatten().map(Command::token)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
