//! Interface members, argument lists and extended attribute lists.

use idlc_lexer::token::TokenKind;
use idlc_types::ast::*;
use idlc_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Members
    // ══════════════════════════════════════════════════════════════════════════

    /// ```ebnf
    /// Member    = [ExtAttrList] (Const | Attribute | Operation) ;
    /// Attribute = ["static"] ["inherit"] ["readonly"] "attribute" Type ["?"] Ident ";" ;
    /// Operation = ["static"] Type ["?"] Ident "(" [ArgList] ")" ";" ;
    /// ```
    pub(crate) fn parse_member(&mut self, iface: &mut Interface) -> Option<()> {
        let extended_attributes = self.parse_ext_attr_list_opt();
        let start = self.current_span();

        if self.check(&TokenKind::Const) {
            let constant = self.parse_const(extended_attributes)?;
            iface.constants.push(constant);
            return Some(());
        }

        let is_static = self.eat(&TokenKind::Static);
        self.eat(&TokenKind::Inherit);
        let is_read_only = self.eat(&TokenKind::Readonly);

        if self.eat(&TokenKind::Attribute) {
            let (idl_type, is_nullable) = self.parse_type_with_nullable()?;
            let name = self.expect_name()?;
            let end = self.expect(&TokenKind::Semicolon)?;
            iface.attributes.push(Attribute {
                name,
                idl_type,
                is_read_only,
                is_static,
                is_nullable,
                extended_attributes,
                span: start.to(end),
            });
            return Some(());
        }
        if is_read_only {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected 'attribute' after 'readonly', got '{}'", self.peek_kind()),
            );
            return None;
        }

        let (return_type, is_nullable) = self.parse_type_with_nullable()?;
        let name = self.expect_name()?;
        let arguments = self.parse_argument_list()?;
        let end = self.expect(&TokenKind::Semicolon)?;
        iface.operations.push(Operation {
            name,
            return_type,
            is_static,
            is_nullable,
            arguments,
            extended_attributes,
            span: start.to(end),
        });
        Some(())
    }

    /// ```ebnf
    /// Const = "const" Type Ident "=" ConstValue ";" ;
    /// ```
    fn parse_const(&mut self, extended_attributes: ExtendedAttributeList) -> Option<Constant> {
        let start = self.current_span();
        self.expect(&TokenKind::Const)?;
        let idl_type = self.parse_type()?;
        let name = self.expect_name()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_const_value()?;
        let end = self.expect(&TokenKind::Semicolon)?;
        Some(Constant {
            name,
            idl_type,
            value: value.text,
            extended_attributes,
            span: start.to(end),
        })
    }

    /// A literal: number, string (unquoted), or bare word (`true`, `null`).
    fn parse_const_value(&mut self) -> Option<ConstValue> {
        let value = match self.peek_kind() {
            TokenKind::Integer(text) | TokenKind::Float(text) | TokenKind::Identifier(text) => {
                ConstValue {
                    text: text.clone(),
                    is_string: false,
                }
            }
            TokenKind::Str(text) => ConstValue {
                text: text.clone(),
                is_string: true,
            },
            other => {
                let message = format!("expected constant value, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        self.advance();
        Some(value)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arguments
    // ══════════════════════════════════════════════════════════════════════════

    /// ```ebnf
    /// ArgList  = "(" [ Argument { "," Argument } ] ")" ;
    /// Argument = [ExtAttrList] ["optional"] Type ["?"] ["..."] Ident ["=" ConstValue] ;
    /// ```
    pub(crate) fn parse_argument_list(&mut self) -> Option<Vec<Argument>> {
        self.expect(&TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Some(arguments);
        }
        loop {
            arguments.push(self.parse_argument()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(arguments)
    }

    fn parse_argument(&mut self) -> Option<Argument> {
        let extended_attributes = self.parse_ext_attr_list_opt();
        let start = self.current_span();
        let is_optional = self.eat(&TokenKind::Optional);
        let (idl_type, is_nullable) = self.parse_type_with_nullable()?;
        let is_variadic = self.eat(&TokenKind::Ellipsis);
        let name = self.expect_name()?;
        let default_value = if self.eat(&TokenKind::Eq) {
            let value = self.parse_const_value()?;
            Some(if value.is_string {
                format!("\"{}\"", value.text)
            } else {
                value.text
            })
        } else {
            None
        };
        Some(Argument {
            name,
            idl_type,
            is_optional,
            is_variadic,
            is_nullable,
            default_value,
            extended_attributes,
            span: start.to(self.previous_span()),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Extended attributes
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `[...]` if present; otherwise an empty list.
    ///
    /// ```ebnf
    /// ExtAttrList  = "[" ExtAttr { "," ExtAttr } "]" ;
    /// ExtAttr      = Ident ["=" ExtAttrValue] ["(" [ArgList] ")"] ;
    /// ExtAttrValue = (Ident | String | Number) { ("|" | "&") Ident } ;
    /// ```
    pub(crate) fn parse_ext_attr_list_opt(&mut self) -> ExtendedAttributeList {
        let mut list = ExtendedAttributeList::default();
        if !self.eat(&TokenKind::LBracket) {
            return list;
        }
        loop {
            match self.parse_ext_attr() {
                Some(attr) => list.items.push(attr),
                None => {
                    self.skip_to_ext_attr_end();
                    return list;
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        if self.expect(&TokenKind::RBracket).is_none() {
            self.skip_to_ext_attr_end();
        }
        list
    }

    fn parse_ext_attr(&mut self) -> Option<ExtendedAttribute> {
        let start = self.current_span();
        let name = self.expect_name()?;
        let value = if self.eat(&TokenKind::Eq) {
            Some(self.parse_ext_attr_value()?)
        } else {
            None
        };
        let arguments = if self.check(&TokenKind::LParen) {
            Some(self.parse_argument_list()?)
        } else {
            None
        };
        Some(ExtendedAttribute {
            name: name.name,
            value,
            arguments,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_ext_attr_value(&mut self) -> Option<String> {
        let mut value = self.ext_attr_value_part()?;
        loop {
            let separator = match self.peek_kind() {
                TokenKind::Pipe => '|',
                TokenKind::Amp => '&',
                _ => break,
            };
            self.advance();
            value.push(separator);
            value.push_str(&self.ext_attr_value_part()?);
        }
        Some(value)
    }

    fn ext_attr_value_part(&mut self) -> Option<String> {
        let part = match self.peek_kind() {
            TokenKind::Str(text) | TokenKind::Integer(text) | TokenKind::Float(text) => {
                text.clone()
            }
            other => match other.name_text() {
                Some(name) => name.to_string(),
                None => {
                    let message = format!("expected extended attribute value, got '{other}'");
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                    return None;
                }
            },
        };
        self.advance();
        Some(part)
    }

    /// Recovery inside `[...]`: skip past the closing `]`.
    fn skip_to_ext_attr_end(&mut self) {
        while !self.at_end() {
            if self.eat(&TokenKind::RBracket) {
                return;
            }
            if matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace) {
                return;
            }
            self.advance();
        }
    }
}

struct ConstValue {
    text: String,
    is_string: bool,
}
