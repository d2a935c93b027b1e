//! Interface description parser: token stream to [`idlc_types::ast::Definitions`].

mod parse_decl;
mod parse_member;
mod parse_type;
mod parser;

pub use parser::{ParseResult, Parser};

use idlc_lexer::Lexer;
use idlc_types::{CompileErrors, SourceFile};

/// Lex and parse one file, merging lexer and parser diagnostics.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    if lexed.errors.has_errors() {
        let mut errors = CompileErrors::empty();
        errors.extend(lexed.errors);
        errors.extend(result.errors);
        result = ParseResult {
            definitions: None,
            errors,
        };
    }
    result
}
