//! Emission configuration.

/// Default single-line table threshold, in length units.
pub const SINGLE_LINE_THRESHOLD: usize = 64;

/// Configuration shared by the writer and the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmitConfig {
    /// Terminate statements with `;`.
    pub semicolons: bool,

    /// Trailing comma policy for multi-line tables.
    pub trailing_commas: TrailingCommas,

    /// Tables whose size estimate is at most this many units stay on one line.
    pub single_line_threshold: usize,

    /// Write `nil`-valued fields as `key = nil` instead of omitting them.
    pub explicit_nil: bool,

    /// Run the verification pass over finished chunks.
    pub verify: bool,

    /// Precede generated function definitions with a marker comment.
    pub comment_generated_functions: bool,

    /// Write unit enum variants as their numeric index unless overridden per type.
    pub enums_as_numbers: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            semicolons: true,
            trailing_commas: TrailingCommas::Never,
            single_line_threshold: SINGLE_LINE_THRESHOLD,
            explicit_nil: false,
            verify: true,
            comment_generated_functions: true,
            enums_as_numbers: true,
        }
    }
}

impl EmitConfig {
    #[must_use]
    pub fn with_semicolons(mut self, semicolons: bool) -> Self {
        self.semicolons = semicolons;
        self
    }

    #[must_use]
    pub fn with_trailing_commas(mut self, trailing_commas: TrailingCommas) -> Self {
        self.trailing_commas = trailing_commas;
        self
    }

    #[must_use]
    pub fn with_single_line_threshold(mut self, threshold: usize) -> Self {
        self.single_line_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_explicit_nil(mut self, explicit_nil: bool) -> Self {
        self.explicit_nil = explicit_nil;
        self
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn with_function_comments(mut self, comment: bool) -> Self {
        self.comment_generated_functions = comment;
        self
    }

    #[must_use]
    pub fn with_enums_as_numbers(mut self, enums_as_numbers: bool) -> Self {
        self.enums_as_numbers = enums_as_numbers;
        self
    }

    /// Whether the last entry of a table gets a comma.
    #[inline]
    pub fn add_trailing_comma(&self, is_multiline: bool) -> bool {
        match self.trailing_commas {
            TrailingCommas::Always => is_multiline,
            TrailingCommas::Never => false,
        }
    }
}

/// Trailing comma behavior for multi-line tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TrailingCommas {
    /// Add a comma after the last entry of multi-line tables.
    Always,
    /// Never add a trailing comma (default).
    #[default]
    Never,
}
