//! Low-level source writer.
//!
//! [`Writer`] is a token-level state machine over a [`StringEmitter`]. It
//! tracks indentation depth, the logical line number, the class of the last
//! token (which decides spacing), and a stack of open blocks so that closing
//! keywords are checked as they are written.
//!
//! Block-opening keywords (`then`, `do`, `repeat`) break the line and indent
//! the body. Closing keywords (`end`, `until`, `else`, `elseif`) always start
//! a fresh line one level shallower.

mod table;

pub use table::{estimate, render, ENTRY_OVERHEAD};

use tracing::debug;

use crate::config::EmitConfig;
use crate::emitter::{Emitter, StringEmitter};
use crate::errors::{EmitError, EmitResult};
use crate::lexical::is_identifier;
use crate::literal::Literal;
use crate::verify::verify_source;

/// Reserved words, as tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Break,
    Do,
    Else,
    ElseIf,
    End,
    False,
    For,
    Function,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "and",
            Keyword::Break => "break",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::ElseIf => "elseif",
            Keyword::End => "end",
            Keyword::False => "false",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::Goto => "goto",
            Keyword::If => "if",
            Keyword::In => "in",
            Keyword::Local => "local",
            Keyword::Nil => "nil",
            Keyword::Not => "not",
            Keyword::Or => "or",
            Keyword::Repeat => "repeat",
            Keyword::Return => "return",
            Keyword::Then => "then",
            Keyword::True => "true",
            Keyword::Until => "until",
            Keyword::While => "while",
        }
    }
}

/// Operators and punctuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Comma,
    Dot,
    Colon,
    /// Prefix `#`.
    Length,
    /// Prefix `-`.
    Negate,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Add => "+",
            Operator::Subtract | Operator::Negate => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "^",
            Operator::Concat => "..",
            Operator::Equal => "==",
            Operator::NotEqual => "~=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Comma => ",",
            Operator::Dot => ".",
            Operator::Colon => ":",
            Operator::Length => "#",
            Operator::OpenParen => "(",
            Operator::CloseParen => ")",
            Operator::OpenBracket => "[",
            Operator::CloseBracket => "]",
        }
    }

    fn class(self) -> Token {
        match self {
            Operator::Comma => Token::Comma,
            Operator::Dot | Operator::Colon => Token::Joiner,
            Operator::Length | Operator::Negate => Token::Prefix,
            Operator::OpenParen | Operator::OpenBracket => Token::Open,
            Operator::CloseParen | Operator::CloseBracket => Token::Close,
            _ => Token::Binary,
        }
    }
}

/// Class of the last token written; decides the space before the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    LineStart,
    Word,
    Keyword,
    Binary,
    Comma,
    Prefix,
    Joiner,
    Open,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    If,
    Do,
    Repeat,
    Function,
}

/// Saved writer state for [`Writer::rollback`].
#[derive(Clone, Debug)]
pub struct Checkpoint {
    len: usize,
    line: usize,
    indent: usize,
    last: Token,
    blocks: Vec<Block>,
}

/// Token-level source writer.
pub struct Writer {
    out: StringEmitter,
    config: EmitConfig,
    indent: usize,
    line: usize,
    last: Token,
    blocks: Vec<Block>,
}

impl Writer {
    pub fn new(config: EmitConfig) -> Self {
        Writer {
            out: StringEmitter::new(),
            config,
            indent: 0,
            line: 1,
            last: Token::LineStart,
            blocks: Vec::new(),
        }
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Current logical line, starting at 1.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current indentation depth.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Number of blocks opened and not yet closed.
    pub fn open_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Text written so far.
    pub fn as_str(&self) -> &str {
        self.out.as_str()
    }

    /// Write a keyword, applying its block effects.
    pub fn keyword(&mut self, keyword: Keyword) -> EmitResult<()> {
        match keyword {
            Keyword::Then => {
                self.word(keyword.as_str(), Token::Keyword);
                self.open_block(Block::If);
            }
            Keyword::Do => {
                self.word(keyword.as_str(), Token::Keyword);
                self.open_block(Block::Do);
            }
            Keyword::Repeat => {
                self.word(keyword.as_str(), Token::Keyword);
                self.open_block(Block::Repeat);
            }
            Keyword::Else => {
                if self.blocks.last() != Some(&Block::If) {
                    return Err(unbalanced(keyword));
                }
                self.dedent_line();
                self.word(keyword.as_str(), Token::Keyword);
                self.newline();
                self.indent += 1;
            }
            Keyword::ElseIf => {
                if self.blocks.last() != Some(&Block::If) {
                    return Err(unbalanced(keyword));
                }
                self.blocks.pop();
                self.dedent_line();
                self.word(keyword.as_str(), Token::Keyword);
            }
            Keyword::End => {
                if !matches!(
                    self.blocks.last(),
                    Some(Block::If | Block::Do | Block::Function)
                ) {
                    return Err(unbalanced(keyword));
                }
                self.blocks.pop();
                self.dedent_line();
                self.word(keyword.as_str(), Token::Word);
            }
            Keyword::Until => {
                if self.blocks.last() != Some(&Block::Repeat) {
                    return Err(unbalanced(keyword));
                }
                self.blocks.pop();
                self.dedent_line();
                self.word(keyword.as_str(), Token::Keyword);
            }
            Keyword::Nil | Keyword::True | Keyword::False | Keyword::Break => {
                self.word(keyword.as_str(), Token::Word);
            }
            _ => self.word(keyword.as_str(), Token::Keyword),
        }
        Ok(())
    }

    /// Write an operator with its spacing rule.
    pub fn operator(&mut self, operator: Operator) {
        let class = operator.class();
        let space = match class {
            Token::Binary => !matches!(self.last, Token::LineStart | Token::Open),
            Token::Prefix => !matches!(self.last, Token::LineStart | Token::Open | Token::Joiner),
            Token::Open => matches!(self.last, Token::Keyword | Token::Binary | Token::Comma),
            _ => false,
        };
        self.begin_token(space);
        self.out.emit(operator.as_str());
        self.last = class;
    }

    /// Write a bare name, rejecting keywords and non-identifiers.
    pub fn identifier(&mut self, name: &str) -> EmitResult<()> {
        if !is_identifier(name) {
            return Err(EmitError::IllegalIdentifier {
                name: name.to_owned(),
            });
        }
        self.word(name, Token::Word);
        Ok(())
    }

    /// Write a dotted name such as `a.b.c` or `obj.part:method`.
    ///
    /// Every segment must be an identifier; `:` may only introduce the last one.
    pub fn name_path(&mut self, path: &str) -> EmitResult<()> {
        let illegal = || EmitError::IllegalIdentifier {
            name: path.to_owned(),
        };
        let (head, method) = match path.split_once(':') {
            Some((head, method)) => (head, Some(method)),
            None => (path, None),
        };
        if !head.split('.').all(is_identifier) || !method.is_none_or(is_identifier) {
            return Err(illegal());
        }
        self.word(path, Token::Word);
        Ok(())
    }

    /// Write a value expression.
    pub fn literal(&mut self, literal: &Literal) -> EmitResult<()> {
        let mut text = StringEmitter::new();
        render(&mut text, literal, self.indent, &self.config)?;
        let text = text.output();
        self.word(&text, Token::Word);
        self.line += text.matches('\n').count();
        Ok(())
    }

    /// Write trusted expression text verbatim.
    pub fn raw(&mut self, text: &str) {
        self.word(text, Token::Word);
        self.line += text.matches('\n').count();
    }

    /// Write a `--` comment on its own line(s).
    pub fn comment(&mut self, text: &str) {
        self.break_line();
        let mut lines = text.lines().peekable();
        if lines.peek().is_none() {
            self.begin_token(false);
            self.out.emit("--");
            self.newline();
            return;
        }
        for line in lines {
            self.begin_token(false);
            self.out.emit("--");
            if !line.is_empty() {
                self.out.emit_space();
                self.out.emit(line);
            }
            self.newline();
        }
    }

    /// Finish a statement: `;` when configured, then a line break.
    pub fn end_statement(&mut self) {
        if self.config.semicolons && self.last != Token::LineStart {
            self.out.emit(";");
        }
        self.newline();
    }

    /// Break the line.
    pub fn newline(&mut self) {
        self.out.emit_newline();
        self.line += 1;
        self.last = Token::LineStart;
    }

    /// `target = value`
    pub fn assign(&mut self, target: &str, value: &Literal) -> EmitResult<()> {
        self.atomic(|w| {
            w.break_line();
            w.name_path(target)?;
            w.operator(Operator::Assign);
            w.literal(value)?;
            w.end_statement();
            Ok(())
        })
    }

    /// `local name` or `local name = value`
    pub fn local(&mut self, name: &str, value: Option<&Literal>) -> EmitResult<()> {
        self.atomic(|w| {
            w.break_line();
            w.keyword(Keyword::Local)?;
            w.identifier(name)?;
            if let Some(value) = value {
                w.operator(Operator::Assign);
                w.literal(value)?;
            }
            w.end_statement();
            Ok(())
        })
    }

    /// `return a, b`
    pub fn returning(&mut self, values: &[Literal]) -> EmitResult<()> {
        self.atomic(|w| {
            w.break_line();
            w.keyword(Keyword::Return)?;
            w.list(values)?;
            w.end_statement();
            Ok(())
        })
    }

    /// `path(a, b)` as a statement.
    pub fn call(&mut self, path: &str, args: &[Literal]) -> EmitResult<()> {
        self.atomic(|w| {
            w.break_line();
            w.name_path(path)?;
            w.operator(Operator::OpenParen);
            w.list(args)?;
            w.operator(Operator::CloseParen);
            w.end_statement();
            Ok(())
        })
    }

    /// `function path(params) body end`
    ///
    /// `body` writes the statements; it must leave every block it opens closed.
    pub fn function(
        &mut self,
        path: &str,
        params: &[&str],
        body: impl FnOnce(&mut Writer) -> EmitResult<()>,
    ) -> EmitResult<()> {
        self.atomic(|w| {
            w.break_line();
            if w.config.comment_generated_functions {
                w.comment(&format!("generated function {path}"));
            }
            w.keyword(Keyword::Function)?;
            w.name_path(path)?;
            w.operator(Operator::OpenParen);
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    w.operator(Operator::Comma);
                }
                w.identifier(param)?;
            }
            w.operator(Operator::CloseParen);

            let depth = w.blocks.len();
            w.open_block(Block::Function);
            body(w)?;
            let open = w.blocks.len();
            if open > depth + 1 {
                return Err(EmitError::UnclosedBlocks {
                    open: open - depth - 1,
                });
            }
            if open <= depth {
                return Err(unbalanced(Keyword::End));
            }
            w.keyword(Keyword::End)?;
            w.newline();
            Ok(())
        })
    }

    /// Save the current state.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.out.len(),
            line: self.line,
            indent: self.indent,
            last: self.last,
            blocks: self.blocks.clone(),
        }
    }

    /// Discard everything written since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.out.truncate(checkpoint.len);
        self.line = checkpoint.line;
        self.indent = checkpoint.indent;
        self.last = checkpoint.last;
        self.blocks = checkpoint.blocks;
    }

    /// Run `f`; if it fails, nothing it wrote remains.
    pub fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> EmitResult<T>) -> EmitResult<T> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    /// Complete the chunk, returning its text.
    ///
    /// Fails if blocks remain open or, when verification is on, if the text
    /// does not pass [`verify_source`].
    pub fn finish(self) -> EmitResult<String> {
        if !self.blocks.is_empty() {
            return Err(EmitError::UnclosedBlocks {
                open: self.blocks.len(),
            });
        }
        let lines = self.line;
        let verify = self.config.verify;
        let text = self.out.output();
        if verify {
            verify_source(&text)?;
        }
        debug!(lines, bytes = text.len(), verified = verify, "finished chunk");
        Ok(text)
    }

    fn list(&mut self, values: &[Literal]) -> EmitResult<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.operator(Operator::Comma);
            }
            self.literal(value)?;
        }
        Ok(())
    }

    fn word(&mut self, text: &str, class: Token) {
        let space = matches!(
            self.last,
            Token::Word | Token::Keyword | Token::Binary | Token::Comma | Token::Close
        );
        self.begin_token(space);
        self.out.emit(text);
        self.last = class;
    }

    fn begin_token(&mut self, space: bool) {
        if self.last == Token::LineStart {
            self.out.emit_indent(self.indent);
        } else if space {
            self.out.emit_space();
        }
    }

    fn open_block(&mut self, block: Block) {
        self.blocks.push(block);
        self.newline();
        self.indent += 1;
    }

    /// Start a fresh line one level shallower.
    fn dedent_line(&mut self) {
        self.break_line();
        self.indent = self.indent.saturating_sub(1);
    }

    fn break_line(&mut self) {
        if self.last != Token::LineStart {
            self.newline();
        }
    }
}

#[cold]
fn unbalanced(keyword: Keyword) -> EmitError {
    EmitError::UnbalancedBlock {
        keyword: keyword.as_str(),
    }
}
