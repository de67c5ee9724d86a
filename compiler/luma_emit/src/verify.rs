//! Structural verification of generated source.
//!
//! A lightweight scan, not a parser: it skips strings, long brackets and
//! comments, then checks that brackets nest and that block words pair up
//! (`function`/`do`/`if` with `end`, `repeat` with `until`, `else`/`elseif`
//! inside an `if`). Errors carry the line of the offending token.

use std::fmt;

use crate::errors::{EmitError, EmitResult};

/// Check that `source` is structurally balanced.
pub fn verify_source(source: &str) -> EmitResult<()> {
    Scanner::new(source).run()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockWord {
    Function,
    Do,
    Repeat,
    If,
}

impl fmt::Display for BlockWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockWord::Function => "function",
            BlockWord::Do => "do",
            BlockWord::Repeat => "repeat",
            BlockWord::If => "if",
        })
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    brackets: Vec<(u8, usize)>,
    blocks: Vec<(BlockWord, usize)>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            brackets: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn run(mut self) -> EmitResult<()> {
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b'-' if self.peek(1) == Some(b'-') => self.comment()?,
                b'"' | b'\'' => self.short_string(b)?,
                b'[' if self.long_bracket(self.pos).is_some() => {
                    self.long_string("unfinished long string")?;
                }
                b'(' | b'[' | b'{' => {
                    self.brackets.push((b, self.line));
                    self.pos += 1;
                }
                b')' | b']' | b'}' => self.close_bracket(b)?,
                b if b.is_ascii_alphabetic() || b == b'_' => self.word()?,
                b if b.is_ascii_digit() => self.number(),
                _ => self.pos += 1,
            }
        }

        if let Some(&(open, line)) = self.brackets.last() {
            return Err(fail(line, format!("'{}' is never closed", char::from(open))));
        }
        if let Some(&(word, line)) = self.blocks.last() {
            return Err(fail(line, format!("'{word}' is never closed")));
        }
        Ok(())
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Level of a long bracket opening at `at` (`[[` is 0, `[==[` is 2).
    fn long_bracket(&self, at: usize) -> Option<usize> {
        if self.bytes.get(at) != Some(&b'[') {
            return None;
        }
        let level = self.bytes[at + 1..].iter().take_while(|&&b| b == b'=').count();
        (self.bytes.get(at + 1 + level) == Some(&b'[')).then_some(level)
    }

    fn comment(&mut self) -> EmitResult<()> {
        self.pos += 2;
        if self.long_bracket(self.pos).is_some() {
            return self.long_string("unfinished long comment");
        }
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// Skip a long bracket starting at the current `[`.
    fn long_string(&mut self, unfinished: &str) -> EmitResult<()> {
        let start = self.line;
        let Some(level) = self.long_bracket(self.pos) else {
            return Ok(());
        };
        self.pos += level + 2;
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => self.line += 1,
                b']' => {
                    let equals = self.bytes[self.pos + 1..]
                        .iter()
                        .take_while(|&&b| b == b'=')
                        .count();
                    if equals == level && self.peek(level + 1) == Some(b']') {
                        self.pos += level + 2;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(fail(start, unfinished.to_owned()))
    }

    fn short_string(&mut self, quote: u8) -> EmitResult<()> {
        let start = self.line;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Err(fail(start, "unfinished string".to_owned())),
                Some(b'\\') => {
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn close_bracket(&mut self, close: u8) -> EmitResult<()> {
        let expected = match close {
            b')' => b'(',
            b']' => b'[',
            _ => b'{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {
                self.pos += 1;
                Ok(())
            }
            Some((open, line)) => Err(fail(
                self.line,
                format!(
                    "'{}' does not match '{}' opened on line {line}",
                    char::from(close),
                    char::from(open)
                ),
            )),
            None => Err(fail(
                self.line,
                format!("unexpected '{}'", char::from(close)),
            )),
        }
    }

    fn word(&mut self) -> EmitResult<()> {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        let bytes = self.bytes;
        let word = &bytes[start..self.pos];
        let line = self.line;
        match word {
            b"function" => self.blocks.push((BlockWord::Function, line)),
            b"do" => self.blocks.push((BlockWord::Do, line)),
            b"repeat" => self.blocks.push((BlockWord::Repeat, line)),
            b"if" => self.blocks.push((BlockWord::If, line)),
            b"else" | b"elseif" => {
                if !matches!(self.blocks.last(), Some((BlockWord::If, _))) {
                    let word = String::from_utf8_lossy(word);
                    return Err(fail(line, format!("'{word}' outside of an 'if' block")));
                }
            }
            b"end" => match self.blocks.pop() {
                Some((BlockWord::Repeat, opened)) => {
                    return Err(fail(
                        line,
                        format!("'end' closes 'repeat' opened on line {opened}"),
                    ));
                }
                Some(_) => {}
                None => return Err(fail(line, "'end' without an open block".to_owned())),
            },
            b"until" => match self.blocks.pop() {
                Some((BlockWord::Repeat, _)) => {}
                Some((word, opened)) => {
                    return Err(fail(
                        line,
                        format!("'until' closes '{word}' opened on line {opened}"),
                    ));
                }
                None => return Err(fail(line, "'until' without 'repeat'".to_owned())),
            },
            _ => {}
        }
        Ok(())
    }

    /// Numbers, including hex digits and exponents, are skipped whole.
    fn number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
        {
            self.pos += 1;
        }
    }
}

#[cold]
fn fail(line: usize, message: String) -> EmitError {
    EmitError::Verification { line, message }
}
