//! Conventional two-pass interpreter: builds the whole bracket-match table
//! up front, then executes with an instruction pointer. Only used to check
//! the single-pass engine in tests.

use crate::command::{COMMA, DOT, GREATER, LBRACKET, LESS, MINUS, PLUS, RBRACKET};

/// Build a bracket-match lookup table for the program.
///
/// `result[i]` is the index of the matching bracket for position `i`, or
/// `usize::MAX` if position `i` is not a bracket. Unbalanced programs are
/// rejected.
fn build_bracket_table(program: &[u8]) -> Result<Vec<usize>, String> {
    let mut table = vec![usize::MAX; program.len()];
    let mut stack = Vec::new();

    for (i, &b) in program.iter().enumerate() {
        match b {
            LBRACKET => stack.push(i),
            RBRACKET => {
                let open = stack.pop().ok_or_else(|| format!("unmatched ']' at {i}"))?;
                table[open] = i;
                table[i] = open;
            }
            _ => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(format!("unmatched '[' at {open}"));
    }
    Ok(table)
}

pub fn run(script: &[u8], input: &[u8], tape_len: usize) -> Result<Vec<u8>, String> {
    let bracket_match = build_bracket_table(script)?;
    let mut tape = vec![0u8; tape_len];
    let mut input = input.iter().copied();
    let mut output = Vec::new();
    let mut head: usize = 0;
    let mut ip: usize = 0;

    while ip < script.len() {
        match script[ip] {
            PLUS => tape[head] = tape[head].wrapping_add(1),
            MINUS => tape[head] = tape[head].wrapping_sub(1),
            GREATER => {
                if head + 1 >= tape_len {
                    return Err(format!("pointer past the end at {ip}"));
                }
                head += 1;
            }
            LESS => {
                head = head
                    .checked_sub(1)
                    .ok_or_else(|| format!("pointer below zero at {ip}"))?;
            }
            DOT => output.push(tape[head]),
            COMMA => {
                if let Some(b) = input.next() {
                    tape[head] = b;
                }
            }
            LBRACKET if tape[head] == 0 => {
                ip = bracket_match[ip];
            }
            RBRACKET if tape[head] != 0 => {
                ip = bracket_match[ip];
            }
            _ => {}
        }
        ip += 1;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_brackets_table() {
        let table = build_bracket_table(b"[[]]").unwrap();
        assert_eq!(table, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_bracket_table_unmatched() {
        assert!(build_bracket_table(b"[[]").is_err());
        assert!(build_bracket_table(b"[]]").is_err());
    }

    #[test]
    fn test_run() {
        assert_eq!(run(b"+++.>,++.", &[7], 16).unwrap(), vec![3, 9]);
        assert_eq!(run(b"[---[->-[[>++]]]]++.", &[], 16).unwrap(), vec![2]);
    }
}
