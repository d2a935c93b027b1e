use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a construct inside an interface description file.
///
/// Lines and columns are 1-based so they can be printed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span at one position.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        let (line, column) = (self.line, self.column).min((other.line, other.column));
        let (end_line, end_column) =
            (self.end_line, self.end_column).max((other.end_line, other.end_column));
        Span::new(line, column, end_line, end_column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An interface description file held in memory for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    line_offsets: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_offsets = vec![0];
        line_offsets.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            name: name.into(),
            text,
            line_offsets,
        }
    }

    /// The text of a 1-based line, without its terminator.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        let start = *self.line_offsets.get(index)?;
        let end = match self.line_offsets.get(index + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        Some(self.text[start..end].trim_end_matches('\r'))
    }

    /// Same as [`SourceFile::line`] but owned, empty when out of range.
    pub fn line_text(&self, number: u32) -> String {
        self.line(number).unwrap_or_default().to_string()
    }

    /// Base name of the file without directories or extension.
    pub fn stem(&self) -> &str {
        let base = self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name);
        match base.rfind('.') {
            Some(0) | None => base,
            Some(dot) => &base[..dot],
        }
    }
}
