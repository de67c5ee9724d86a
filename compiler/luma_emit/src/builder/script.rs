//! Multi-statement chunks.

use serde::Serialize;

use super::Builder;
use crate::errors::{BuildResult, EmitResult};
use crate::writer::Writer;

/// A chunk assembled statement by statement.
///
/// Each statement converts its value before writing anything, so a failed
/// statement leaves the chunk as it was.
pub struct Script<'b> {
    builder: &'b Builder,
    writer: Writer,
}

impl<'b> Script<'b> {
    pub(super) fn new(builder: &'b Builder) -> Self {
        Script {
            builder,
            writer: Writer::new(builder.config),
        }
    }

    /// `target = value`
    pub fn assign<T: ?Sized + Serialize>(&mut self, target: &str, value: &T) -> BuildResult<()> {
        let literal = self.builder.literal(value)?;
        self.writer.assign(target, &literal)?;
        Ok(())
    }

    /// `local name = value`
    pub fn local<T: ?Sized + Serialize>(&mut self, name: &str, value: &T) -> BuildResult<()> {
        let literal = self.builder.literal(value)?;
        self.writer.local(name, Some(&literal))?;
        Ok(())
    }

    /// `return value`
    pub fn returning<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        let literal = self.builder.literal(value)?;
        self.writer.returning(&[literal])?;
        Ok(())
    }

    pub fn comment(&mut self, text: &str) {
        self.writer.comment(text);
    }

    /// `function path(params) body end`
    pub fn function(
        &mut self,
        path: &str,
        params: &[&str],
        body: impl FnOnce(&mut Writer) -> EmitResult<()>,
    ) -> BuildResult<()> {
        self.writer.function(path, params, body)?;
        Ok(())
    }

    /// Direct access for statements the helpers do not cover.
    pub fn writer(&mut self) -> &mut Writer {
        &mut self.writer
    }

    pub fn finish(self) -> BuildResult<String> {
        Ok(self.writer.finish()?)
    }
}
