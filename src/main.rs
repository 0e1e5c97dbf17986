use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use onepass::scriptgen::{GenConfig, ScriptGen};
use onepass::{Config, Interpreter, Registry, Stats};

#[derive(Parser)]
#[command(name = "onepass", about = "Single-pass interpreter for tape scripts")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run one or more scripts. Several scripts run in parallel.
    Run {
        /// Script files.
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// File supplying input bytes (empty input if absent).
        #[arg(long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        tape: TapeArgs,
    },
    /// Print the execution record of a script after running it.
    Outline {
        script: PathBuf,

        #[command(flatten)]
        tape: TapeArgs,
    },
    /// Generate random scripts and measure throughput.
    Bench {
        /// Random seed for reproducibility.
        #[arg(long)]
        seed: u64,

        /// Number of scripts to generate.
        #[arg(long, default_value_t = 1 << 12)]
        count: usize,

        /// Maximum loop nesting of generated scripts.
        #[arg(long, default_value_t = 3)]
        depth: usize,

        /// Maximum items per loop body.
        #[arg(long, default_value_t = 8)]
        body_len: usize,
    },
}

#[derive(Args)]
struct TapeArgs {
    /// Number of cells on the tape.
    #[arg(long, default_value_t = Config::default().tape_len)]
    tape_len: usize,

    /// Abort a run after this many executed actions.
    #[arg(long)]
    step_limit: Option<usize>,
}

impl TapeArgs {
    fn interpreter(&self) -> onepass::Result<Interpreter> {
        let config = Config {
            tape_len: self.tape_len,
            step_limit: self.step_limit,
        };
        Interpreter::with_config(Registry::builtin(), config)
    }
}

/// Install a stderr subscriber, only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Cmd::Run { scripts, input, tape } => run(&scripts, input.as_deref(), &tape),
        Cmd::Outline { script, tape } => outline(&script, &tape),
        Cmd::Bench {
            seed,
            count,
            depth,
            body_len,
        } => bench(seed, count, depth, body_len),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Pushes every write through to the inner writer, so a closed stdout
/// fails the output command that hit it instead of a later buffer flush.
struct Unbuffered<W>(W);

impl<W: Write> Write for Unbuffered<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.0.write(buf)?;
        self.0.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn run(scripts: &[PathBuf], input: Option<&Path>, tape: &TapeArgs) -> Result<(), String> {
    let interpreter = tape.interpreter().map_err(|e| e.to_string())?;
    let input = match input {
        Some(path) => read_file(path)?,
        None => Vec::new(),
    };

    if let [path] = scripts {
        // A single script is streamed, never loaded whole.
        let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
        let stdout = io::stdout();
        let stats = interpreter
            .run(BufReader::new(file), &input[..], Unbuffered(stdout.lock()))
            .map_err(|e| format!("{}: {e}", path.display()))?;
        tracing::info!(script = %path.display(), %stats, "done");
        return Ok(());
    }

    let sources = scripts
        .iter()
        .map(|p| read_file(p))
        .collect::<Result<Vec<_>, _>>()?;
    let results = interpreter.run_batch(&sources, &input);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (path, result) in scripts.iter().zip(results) {
        let (output, stats) = result.map_err(|e| format!("{}: {e}", path.display()))?;
        out.write_all(&output).map_err(|e| e.to_string())?;
        tracing::info!(script = %path.display(), %stats, "done");
    }
    out.flush().map_err(|e| e.to_string())
}

fn outline(script: &Path, tape: &TapeArgs) -> Result<(), String> {
    let interpreter = tape.interpreter().map_err(|e| e.to_string())?;
    let file = File::open(script).map_err(|e| format!("{}: {e}", script.display()))?;
    let listing = interpreter
        .outline(BufReader::new(file), &[])
        .map_err(|e| format!("{}: {e}", script.display()))?;
    print!("{listing}");
    Ok(())
}

fn bench(seed: u64, count: usize, depth: usize, body_len: usize) -> Result<(), String> {
    let config = GenConfig {
        max_depth: depth,
        body_len,
        ..GenConfig::default()
    };
    let mut generator = ScriptGen::new(config, seed);
    let scripts: Vec<Vec<u8>> = (0..count).map(|_| generator.generate()).collect();
    let script_bytes: usize = scripts.iter().map(Vec::len).sum();
    let interpreter = Interpreter::builtin();
    let input: Vec<u8> = (0..=255u8).collect();

    let start = std::time::Instant::now();
    let results = interpreter.run_batch(&scripts, &input);
    let elapsed = start.elapsed();

    let mut total = Stats::default();
    for result in results {
        let (_, stats) = result.map_err(|e| e.to_string())?;
        total += stats;
    }

    let scripts_per_sec = count as f64 / elapsed.as_secs_f64();
    let actions_per_sec = total.executed as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results:");
    eprintln!("  Scripts:           {count}");
    eprintln!("  Script bytes:      {script_bytes}");
    eprintln!("  Actions executed:  {}", total.executed);
    eprintln!("  Nodes recorded:    {}", total.recorded);
    eprintln!("  Skipped on scan:   {}", total.skipped);
    eprintln!("  Elapsed:           {elapsed:.2?}");
    eprintln!("  Scripts/sec:       {scripts_per_sec:.1}");
    eprintln!("  Actions/sec:       {actions_per_sec:.0}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use onepass::Error;

    /// Accepts writes into a buffer but fails every flush, like a pipe whose
    /// reader has gone away behind a buffered handle.
    #[derive(Default)]
    struct HungUp {
        writes: usize,
    }

    impl Write for HungUp {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_unbuffered_stops_at_first_output() {
        let mut sink = HungUp::default();
        let result = Interpreter::builtin().run(&b"+.+.+."[..], io::empty(), Unbuffered(&mut sink));
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(sink.writes, 1);
    }

    #[test]
    fn test_unbuffered_passes_bytes_through() {
        let mut out = Vec::<u8>::new();
        Interpreter::builtin()
            .run(&b"+.+."[..], io::empty(), Unbuffered(&mut out))
            .unwrap();
        assert_eq!(out, vec![1, 2]);
    }
}
