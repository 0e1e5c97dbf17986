use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::command::{COMMA, DOT, GREATER, LBRACKET, LESS, MINUS, PLUS, RBRACKET};

/// Bytes no built-in command uses, sprinkled in to exercise token skipping.
const NOISE: &[u8] = b" \n\tabz#";

/// Shape of generated scripts.
#[derive(Clone, Copy, Debug)]
pub struct GenConfig {
    /// Maximum nesting of executed loops.
    pub max_depth: usize,
    /// Maximum number of items in one body.
    pub body_len: usize,
    /// Maximum iteration count of one counter loop.
    pub max_count: u8,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            body_len: 8,
            max_count: 5,
        }
    }
}

/// Seeded generator of balanced, always-terminating scripts.
///
/// A body working on cell `p` is made of single-cell commands on `p`,
/// counter loops and dead loops. A counter loop clears `p+1`, loads it
/// with a small count and runs a nested body on `p+2` once per count. A
/// dead loop clears `p+1` and opens a loop there, so its contents
/// (arbitrary balanced tokens) are never executed. The cursor stays
/// within `[0, 2 * max_depth + 2]`.
pub struct ScriptGen {
    config: GenConfig,
    rng: SmallRng,
}

impl ScriptGen {
    pub fn new(config: GenConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        self.body(self.config.max_depth, &mut out);
        out
    }

    /// Highest cell a generated script can reach.
    pub fn max_cell(&self) -> usize {
        2 * self.config.max_depth + 2
    }

    fn body(&mut self, depth: usize, out: &mut Vec<u8>) {
        let items = self.rng.gen_range(1..=self.config.body_len.max(1));
        for _ in 0..items {
            let roll: f64 = self.rng.r#gen();
            if depth > 0 && roll < 0.25 {
                self.counter_loop(depth, out);
            } else if roll < 0.35 {
                self.dead_loop(out);
            } else if roll < 0.4 {
                out.push(NOISE[self.rng.gen_range(0..NOISE.len())]);
            } else {
                const LEAVES: [u8; 4] = [PLUS, MINUS, DOT, COMMA];
                out.push(LEAVES[self.rng.gen_range(0..LEAVES.len())]);
            }
        }
    }

    fn counter_loop(&mut self, depth: usize, out: &mut Vec<u8>) {
        let count = self.rng.gen_range(1..=self.config.max_count.max(1));
        out.extend_from_slice(&[GREATER, LBRACKET, MINUS, RBRACKET]);
        out.extend(std::iter::repeat_n(PLUS, count as usize));
        out.extend_from_slice(&[LBRACKET, GREATER]);
        self.body(depth - 1, out);
        out.extend_from_slice(&[LESS, MINUS, RBRACKET, LESS]);
    }

    fn dead_loop(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[GREATER, LBRACKET, MINUS, RBRACKET, LBRACKET]);
        let depth = self.rng.gen_range(0..=3);
        self.junk(depth, out);
        out.extend_from_slice(&[RBRACKET, LESS]);
    }

    /// Arbitrary balanced tokens; only ever placed where they never run.
    fn junk(&mut self, depth: usize, out: &mut Vec<u8>) {
        const TOKENS: [u8; 6] = [PLUS, MINUS, GREATER, LESS, DOT, COMMA];
        let items = self.rng.gen_range(0..=self.config.body_len);
        for _ in 0..items {
            if depth > 0 && self.rng.gen_bool(0.2) {
                out.push(LBRACKET);
                self.junk(depth - 1, out);
                out.push(RBRACKET);
            } else {
                out.push(TOKENS[self.rng.gen_range(0..TOKENS.len())]);
            }
        }
    }
}
