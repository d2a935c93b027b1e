//! Top-level definitions: interfaces, partial interfaces, callback
//! functions, enums and typedefs.

use idlc_lexer::token::TokenKind;
use idlc_types::ast::*;
use idlc_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// ```ebnf
    /// Definitions = { [ExtAttrList] Definition } ;
    /// ```
    pub(crate) fn parse_definitions(&mut self) -> Definitions {
        let mut defs = Definitions::default();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let ext_attrs = self.parse_ext_attr_list_opt();
            if self.parse_definition(ext_attrs, &mut defs).is_none() {
                self.synchronize_definition();
            }
        }
        defs
    }

    fn parse_definition(
        &mut self,
        ext_attrs: ExtendedAttributeList,
        defs: &mut Definitions,
    ) -> Option<()> {
        match self.peek_kind() {
            TokenKind::Interface => {
                let iface = self.parse_interface(ext_attrs, false)?;
                defs.interfaces.push(iface);
            }
            TokenKind::Partial => {
                let start = self.current_span();
                self.advance();
                let mut iface = self.parse_interface(ext_attrs, false)?;
                iface.is_partial = true;
                iface.span = start.to(iface.span);
                defs.interfaces.push(iface);
            }
            TokenKind::Callback if self.look_ahead(1) == &TokenKind::Interface => {
                let start = self.current_span();
                self.advance();
                let mut iface = self.parse_interface(ext_attrs, true)?;
                iface.span = start.to(iface.span);
                defs.interfaces.push(iface);
            }
            TokenKind::Callback => defs.callback_functions.push(self.parse_callback_function()?),
            TokenKind::Enum => defs.enums.push(self.parse_enum()?),
            TokenKind::Typedef => defs.typedefs.push(self.parse_typedef()?),
            other => {
                let message = format!(
                    "expected 'interface', 'partial', 'callback', 'enum' or 'typedef', got '{other}'"
                );
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        }
        Some(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Interfaces
    // ══════════════════════════════════════════════════════════════════════════

    /// ```ebnf
    /// Interface = "interface" Ident [":" Ident] "{" { Member } "}" ";" ;
    /// ```
    fn parse_interface(
        &mut self,
        extended_attributes: ExtendedAttributeList,
        is_callback: bool,
    ) -> Option<Interface> {
        let start = self.current_span();
        self.expect(&TokenKind::Interface)?;
        let name = self.expect_identifier()?;
        let parent = if self.eat(&TokenKind::Colon) {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(&TokenKind::LBrace)?;

        let mut iface = Interface {
            name,
            parent,
            is_partial: false,
            is_callback,
            attributes: Vec::new(),
            operations: Vec::new(),
            constants: Vec::new(),
            extended_attributes,
            span: start,
        };

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                return None;
            }
            if self.parse_member(&mut iface).is_none() {
                self.synchronize_member();
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let end = self.expect(&TokenKind::Semicolon)?;
        iface.span = start.to(end);
        Some(iface)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Callback functions, enums, typedefs
    // ══════════════════════════════════════════════════════════════════════════

    /// ```ebnf
    /// CallbackFunction = "callback" Ident "=" Type "(" [ArgList] ")" ";" ;
    /// ```
    fn parse_callback_function(&mut self) -> Option<CallbackFunction> {
        let start = self.current_span();
        self.expect(&TokenKind::Callback)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let (return_type, _) = self.parse_type_with_nullable()?;
        let arguments = self.parse_argument_list()?;
        let end = self.expect(&TokenKind::Semicolon)?;
        Some(CallbackFunction {
            name,
            return_type,
            arguments,
            span: start.to(end),
        })
    }

    /// ```ebnf
    /// Enum = "enum" Ident "{" String {"," String} [","] "}" ";" ;
    /// ```
    fn parse_enum(&mut self) -> Option<EnumDef> {
        let start = self.current_span();
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;
        let mut values = vec![self.expect_string_literal()?];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            values.push(self.expect_string_literal()?);
        }
        self.expect(&TokenKind::RBrace)?;
        let end = self.expect(&TokenKind::Semicolon)?;
        Some(EnumDef {
            name,
            values,
            span: start.to(end),
        })
    }

    /// ```ebnf
    /// Typedef = "typedef" Type Ident ";" ;
    /// ```
    fn parse_typedef(&mut self) -> Option<Typedef> {
        let start = self.current_span();
        self.expect(&TokenKind::Typedef)?;
        let (idl_type, _) = self.parse_type_with_nullable()?;
        let name = self.expect_identifier()?;
        let end = self.expect(&TokenKind::Semicolon)?;
        Some(Typedef {
            name,
            idl_type,
            span: start.to(end),
        })
    }
}
