//! Indentation-aware line writer for C++ text.

use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Accumulates output lines, tracking the current brace depth.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current depth. An empty line carries no
    /// trailing whitespace.
    pub fn line(&mut self, text: impl AsRef<str>) -> fmt::Result {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.write_str(INDENT)?;
            }
            self.out.write_str(text)?;
        }
        self.out.write_char('\n')
    }

    pub fn blank(&mut self) -> fmt::Result {
        self.line("")
    }

    /// Preprocessor lines always start at column zero.
    pub fn directive(&mut self, text: impl AsRef<str>) -> fmt::Result {
        writeln!(self.out, "{}", text.as_ref())
    }

    /// `header` followed by a brace block on its own lines (function style).
    pub fn function<F>(&mut self, header: impl AsRef<str>, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.line(header)?;
        self.line("{")?;
        self.depth += 1;
        body(self)?;
        self.depth -= 1;
        self.line("}")
    }

    /// `header {` ... `}` (statement style).
    pub fn block<F>(&mut self, header: impl AsRef<str>, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.line(format!("{} {{", header.as_ref()))?;
        self.depth += 1;
        body(self)?;
        self.depth -= 1;
        self.line("}")
    }

    /// Like [`CodeWriter::block`] but closes with `};`.
    pub fn declaration<F>(&mut self, header: impl AsRef<str>, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.line(format!("{} {{", header.as_ref()))?;
        self.depth += 1;
        body(self)?;
        self.depth -= 1;
        self.line("};")
    }

    /// Run `body` one level deeper without emitting braces.
    pub fn depth_scope<F>(&mut self, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    /// Wrap `body` in `#if guard` / `#endif` when a guard is present.
    pub fn conditional<F>(&mut self, guard: Option<&str>, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        match guard {
            Some(guard) => {
                self.directive(format!("#if {guard}"))?;
                body(self)?;
                self.directive(format!("#endif // {guard}"))
            }
            None => body(self),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Write for CodeWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent() {
        let mut w = CodeWriter::new();
        w.function("void f()", |w| {
            w.block("if (x)", |w| w.line("return;"))?;
            w.blank()
        })
        .unwrap();
        assert_eq!(w.finish(), "void f()\n{\n    if (x) {\n        return;\n    }\n\n}\n");
    }

    #[test]
    fn conditional_guard_is_optional() {
        let mut w = CodeWriter::new();
        w.conditional(Some("ENABLE(A)"), |w| w.line("int a;")).unwrap();
        w.conditional(None, |w| w.line("int b;")).unwrap();
        assert_eq!(w.finish(), "#if ENABLE(A)\nint a;\n#endif // ENABLE(A)\nint b;\n");
    }

    #[test]
    fn directives_ignore_depth() {
        let mut w = CodeWriter::new();
        w.function("void f()", |w| w.directive("#if X")).unwrap();
        assert_eq!(w.finish(), "void f()\n{\n#if X\n}\n");
    }
}
