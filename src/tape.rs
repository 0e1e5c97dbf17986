use std::io::{ErrorKind, Read, Write};

use crate::error::{Error, Result};

/// Default number of cells on a tape.
pub const DEFAULT_TAPE_LEN: usize = 1 << 16;

/// The byte memory a script operates on, plus the streams it talks to.
///
/// The cursor always points at a valid cell: every move is checked
/// before it happens, so a failed move leaves the tape untouched.
/// Cell arithmetic wraps modulo 256.
///
/// All external I/O of a run goes through this type.
pub struct Tape<'io> {
    cells: Vec<u8>,
    cursor: usize,
    input: &'io mut dyn Read,
    output: &'io mut dyn Write,
}

impl<'io> Tape<'io> {
    /// Create a zeroed tape of `len` cells. Fails with `EmptyTape` if `len`
    /// is zero, since no cursor position would be valid.
    pub fn new(len: usize, input: &'io mut dyn Read, output: &'io mut dyn Write) -> Result<Self> {
        if len == 0 {
            return Err(Error::EmptyTape);
        }
        Ok(Self {
            cells: vec![0u8; len],
            cursor: 0,
            input,
            output,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn read(&self, index: usize) -> Result<u8> {
        self.cells
            .get(index)
            .copied()
            .ok_or_else(|| Error::out_of_range(index, self.cells.len()))
    }

    pub fn write(&mut self, index: usize, byte: u8) -> Result<()> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))?;
        *cell = byte;
        Ok(())
    }

    #[inline(always)]
    pub fn current_byte(&self) -> u8 {
        self.cells[self.cursor]
    }

    #[inline(always)]
    pub fn set_current_byte(&mut self, byte: u8) {
        self.cells[self.cursor] = byte;
    }

    pub fn move_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.cells.len() {
            return Err(Error::out_of_range(index, self.cells.len()));
        }
        self.cursor = index;
        Ok(())
    }

    /// Move the cursor by `delta` cells.
    pub fn shift(&mut self, delta: isize) -> Result<()> {
        match self.cursor.checked_add_signed(delta) {
            Some(index) => self.move_cursor(index),
            None => Err(Error::OutOfRange {
                index: (self.cursor as isize).saturating_add(delta),
                len: self.cells.len(),
            }),
        }
    }

    /// Pull one byte from the input stream. `Ok(None)` means the stream is
    /// exhausted, which is not an error.
    pub fn consume_input_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn emit_output_byte(&mut self, byte: u8) -> Result<()> {
        self.output.write_all(&[byte])?;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}
