use std::io::{self, BufReader, Read, Write};

use rayon::prelude::*;

use crate::command::Command;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::machine::Machine;
use crate::registry::Registry;
use crate::stats::Stats;
use crate::tape::Tape;

/// Runs scripts against a fixed registry.
///
/// The script is read one byte at a time and never buffered as a whole;
/// bytes without a registered command are ignored.
#[derive(Clone)]
pub struct Interpreter {
    registry: Registry,
    config: Config,
}

impl Interpreter {
    /// Built-in commands plus `extensions`, default configuration.
    pub fn new<I>(extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = Command>,
    {
        Self::with_config(Registry::new(extensions)?, Config::default())
    }

    /// Built-in commands only, default configuration.
    pub fn builtin() -> Self {
        Self {
            registry: Registry::builtin(),
            config: Config::default(),
        }
    }

    pub fn with_config(registry: Registry, config: Config) -> Result<Self> {
        if config.tape_len == 0 {
            return Err(Error::EmptyTape);
        }
        Ok(Self { registry, config })
    }

    /// Execute `script`, reading from `input` and writing to `output`.
    /// The output is flushed once the script has finished successfully.
    pub fn run<S, I, O>(&self, script: S, mut input: I, mut output: O) -> Result<Stats>
    where
        S: Read,
        I: Read,
        O: Write,
    {
        let mut machine = self.start(&mut input, &mut output)?;
        self.feed(&mut machine, script)?;
        let stats = machine.stats();
        tracing::debug!(%stats, "run finished");
        Ok(stats)
    }

    /// Run `script` and print the recorded skeleton instead of the output.
    pub fn outline<S: Read>(&self, script: S, input: &[u8]) -> Result<String> {
        let mut input = input;
        let mut output = io::sink();
        let mut machine = self.start(&mut input, &mut output)?;
        self.feed(&mut machine, script)?;
        Ok(machine.record().outline())
    }

    /// In-memory convenience wrapper around [`Interpreter::run`].
    pub fn run_bytes(&self, script: &[u8], input: &[u8]) -> Result<(Vec<u8>, Stats)> {
        let mut output = Vec::<u8>::new();
        let stats = self.run(script, input, &mut output)?;
        Ok((output, stats))
    }

    /// Run every script on its own tape, in parallel. Each script reads the
    /// same `input`. Results come back in the order of `scripts`.
    pub fn run_batch<T>(&self, scripts: &[T], input: &[u8]) -> Vec<Result<(Vec<u8>, Stats)>>
    where
        T: AsRef<[u8]> + Sync,
    {
        scripts
            .par_iter()
            .map(|script| self.run_bytes(script.as_ref(), input))
            .collect()
    }

    fn start<'io>(&self, input: &'io mut dyn Read, output: &'io mut dyn Write) -> Result<Machine<'_, 'io>> {
        tracing::debug!(
            tape_len = self.config.tape_len,
            step_limit = ?self.config.step_limit,
            "run started"
        );
        let tape = Tape::new(self.config.tape_len, input, output)?;
        Ok(Machine::new(tape, self.config.step_limit))
    }

    fn feed<'r, S: Read>(&'r self, machine: &mut Machine<'r, '_>, script: S) -> Result<()> {
        for token in BufReader::new(script).bytes() {
            if let Some(command) = self.registry.lookup(token?) {
                machine.step(command)?;
            }
        }
        machine.finish()?;
        machine.flush()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::reference;
    use crate::scriptgen::{GenConfig, ScriptGen};
    use proptest::prelude::*;

    const TOKENS: &[u8] = b"+-<>.,[] x";

    proptest! {
        #[test]
        fn generated_scripts_match_reference(
            seed in any::<u64>(),
            input in prop::collection::vec(any::<u8>(), 0..16)
        ) {
            let mut generator = ScriptGen::new(GenConfig::default(), seed);
            let script = generator.generate();
            let config = Config { tape_len: generator.max_cell() + 1, step_limit: None };
            let interpreter = Interpreter::with_config(Registry::builtin(), config).unwrap();
            let (output, _) = interpreter.run_bytes(&script, &input).unwrap();
            let expected = reference::run(&script, &input, config.tape_len).unwrap();
            prop_assert_eq!(output, expected);
        }

        #[test]
        fn random_scripts_never_panic(
            script in prop::collection::vec(prop::sample::select(TOKENS), 0..128)
        ) {
            let config = Config { tape_len: 32, step_limit: Some(8192) };
            let interpreter = Interpreter::with_config(Registry::builtin(), config).unwrap();
            match interpreter.run_bytes(&script, b"abc") {
                Ok((_, stats)) => prop_assert!(stats.executed <= 8192),
                Err(Error::OutOfRange { .. })
                | Err(Error::MissingLoopOpen)
                | Err(Error::UnterminatedLoop(_))
                | Err(Error::StepLimitExceeded(8192)) => {}
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        #[test]
        fn completed_runs_agree_with_reference(
            script in prop::collection::vec(prop::sample::select(TOKENS), 0..64)
        ) {
            let config = Config { tape_len: 32, step_limit: Some(4096) };
            let interpreter = Interpreter::with_config(Registry::builtin(), config).unwrap();
            if let Ok((output, _)) = interpreter.run_bytes(&script, b"xyz") {
                let expected = reference::run(&script, b"xyz", 32).unwrap();
                prop_assert_eq!(output, expected);
            }
        }

        #[test]
        fn extra_close_is_missing_open(prefix in "[+\\-.]{0,16}") {
            let script = format!("{prefix}[-]]");
            prop_assert!(matches!(
                Interpreter::builtin().run_bytes(script.as_bytes(), &[]),
                Err(Error::MissingLoopOpen)
            ));
        }

        #[test]
        fn trailing_open_is_unterminated(prefix in "[+\\-.]{0,16}", opens in 1usize..5) {
            let script = format!("{prefix}{}", "[".repeat(opens));
            prop_assert!(matches!(
                Interpreter::builtin().run_bytes(script.as_bytes(), &[]),
                Err(Error::UnterminatedLoop(n)) if n == opens
            ));
        }
    }
}
