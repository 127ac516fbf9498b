//! `.proto` text parser.
//!
//! Tokenizer plus recursive descent over the subset of the protobuf language
//! that carries structure: messages, enums, oneofs, fields and map fields.
//! `option`, `reserved`, `extensions`, `import`, `service` and `extend` are
//! recognised and skipped. Field declaration order and numbers are kept
//! verbatim; the structure matcher compares fields by position.

use thiserror::Error;

use deobfs_engine::domain::{
    Descriptor, EnumType, EnumValue, Field, FieldLabel, MessageType, OneofDecl,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}, column {column}: expected {expected}, found {found:?}")]
    Unexpected {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("line {line}, column {column}: invalid number {text:?}")]
    InvalidNumber {
        line: usize,
        column: usize,
        text: String,
    },

    #[error("line {line}, column {column}: unterminated {what}")]
    Unterminated {
        line: usize,
        column: usize,
        what: &'static str,
    },

    #[error("line {line}, column {column}: {what} is not supported")]
    Unsupported {
        line: usize,
        column: usize,
        what: String,
    },
}

/// Parse one `.proto` source into a descriptor. `source_file` is left empty;
/// the loader stamps it.
pub fn parse_proto(source: &str) -> Result<Descriptor, ParseError> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.parse_file()
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    /// Identifier, possibly dotted (`pkg.Type`, `.pkg.Type`).
    Ident(String),
    /// Numeric literal, kept as text.
    Number(String),
    /// String literal contents, escapes left as written.
    Str(String),
    Symbol(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) | TokenKind::Number(s) => s.clone(),
            TokenKind::Str(s) => format!("\"{}\"", s),
            TokenKind::Symbol(c) => c.to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut line_start = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i - line_start + 1;

        if c == '\n' {
            i += 1;
            line += 1;
            line_start = i;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let (start_line, start_column) = (line, column);
            i += 2;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(ParseError::Unterminated {
                            line: start_line,
                            column: start_column,
                            what: "block comment",
                        })
                    }
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        i += 1;
                        line += 1;
                        line_start = i;
                    }
                    Some(_) => i += 1,
                }
            }
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None | Some('\n') => {
                        return Err(ParseError::Unterminated { line, column, what: "string literal" })
                    }
                    Some('\\') => {
                        text.push('\\');
                        if let Some(&next) = chars.get(i + 1) {
                            text.push(next);
                        }
                        i += 2;
                    }
                    Some(&ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token { kind: TokenKind::Str(text), line, column });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || (c == '.' && next_is_ident_start(&chars, i)) {
            let start = i;
            i += 1;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token { kind: TokenKind::Ident(text), line, column });
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token { kind: TokenKind::Number(text), line, column });
            continue;
        }

        tokens.push(Token { kind: TokenKind::Symbol(c), line, column });
        i += 1;
    }

    Ok(tokens)
}

fn next_is_ident_start(chars: &[char], i: usize) -> bool {
    chars
        .get(i + 1)
        .map_or(false, |n| n.is_ascii_alphabetic() || *n == '_')
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self, expected: &str) -> Result<Token, ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| ParseError::UnexpectedEof {
            expected: expected.to_string(),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Ident(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Symbol(c)) if *c == symbol)
    }

    fn unexpected(token: &Token, expected: &str) -> ParseError {
        ParseError::Unexpected {
            line: token.line,
            column: token.column,
            expected: expected.to_string(),
            found: token.describe(),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), ParseError> {
        let expected = format!("'{}'", symbol);
        let token = self.next(&expected)?;
        match token.kind {
            TokenKind::Symbol(c) if c == symbol => Ok(()),
            _ => Err(Self::unexpected(&token, &expected)),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        let token = self.next(expected)?;
        match token.kind {
            TokenKind::Ident(s) => Ok(s),
            _ => Err(Self::unexpected(&token, expected)),
        }
    }

    fn expect_str(&mut self, expected: &str) -> Result<String, ParseError> {
        let token = self.next(expected)?;
        match token.kind {
            TokenKind::Str(s) => Ok(s),
            _ => Err(Self::unexpected(&token, expected)),
        }
    }

    /// Integer literal with optional leading minus: decimal, hex or octal.
    fn expect_int(&mut self, expected: &str) -> Result<i32, ParseError> {
        let negative = if self.peek_symbol('-') {
            self.pos += 1;
            true
        } else {
            false
        };
        let token = self.next(expected)?;
        let text = match &token.kind {
            TokenKind::Number(s) => s.clone(),
            _ => return Err(Self::unexpected(&token, expected)),
        };
        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16)
        } else if text.len() > 1 && text.starts_with('0') {
            i64::from_str_radix(&text[1..], 8)
        } else {
            text.parse::<i64>()
        };
        let value = parsed
            .ok()
            .map(|v| if negative { -v } else { v })
            .and_then(|v| i32::try_from(v).ok())
            .ok_or(ParseError::InvalidNumber {
                line: token.line,
                column: token.column,
                text,
            })?;
        Ok(value)
    }

    /// Skip to the end of a `;`-terminated statement, stepping over any
    /// bracketed aggregate values.
    fn skip_statement(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            let token = self.next("';'")?;
            match token.kind {
                TokenKind::Symbol('{') | TokenKind::Symbol('[') | TokenKind::Symbol('(') => depth += 1,
                TokenKind::Symbol('}') | TokenKind::Symbol(']') | TokenKind::Symbol(')') => {
                    if depth == 0 {
                        return Err(Self::unexpected(&token, "';'"));
                    }
                    depth -= 1;
                }
                TokenKind::Symbol(';') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
    }

    /// Skip a keyword-introduced block such as `service X { ... }`.
    fn skip_block(&mut self) -> Result<(), ParseError> {
        loop {
            let token = self.next("'{'")?;
            if token.kind == TokenKind::Symbol('{') {
                break;
            }
            if token.kind == TokenKind::Symbol(';') {
                return Err(Self::unexpected(&token, "'{'"));
            }
        }
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.next("'}'")?;
            match token.kind {
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Skip `[ ... ]` field or value options if present.
    fn skip_options(&mut self) -> Result<(), ParseError> {
        if !self.peek_symbol('[') {
            return Ok(());
        }
        let mut depth = 0usize;
        loop {
            let token = self.next("']'")?;
            match token.kind {
                TokenKind::Symbol('[') => depth += 1,
                TokenKind::Symbol(']') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    // ── File level ─────────────────────────────────────────────

    fn parse_file(mut self) -> Result<Descriptor, ParseError> {
        let mut desc = Descriptor::default();

        while let Some(token) = self.peek().cloned() {
            match &token.kind {
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Ident(word) => match word.as_str() {
                    "syntax" | "edition" => {
                        self.pos += 1;
                        self.expect_symbol('=')?;
                        desc.syntax = self.expect_str("syntax string")?;
                        self.expect_symbol(';')?;
                    }
                    "package" => {
                        self.pos += 1;
                        desc.package = self.expect_ident("package name")?;
                        self.expect_symbol(';')?;
                    }
                    "import" | "option" => {
                        self.pos += 1;
                        self.skip_statement()?;
                    }
                    "message" => {
                        self.pos += 1;
                        desc.messages.push(self.parse_message()?);
                    }
                    "enum" => {
                        self.pos += 1;
                        desc.enums.push(self.parse_enum()?);
                    }
                    "service" | "extend" => {
                        self.pos += 1;
                        self.skip_block()?;
                    }
                    _ => return Err(Self::unexpected(&token, "top-level declaration")),
                },
                _ => return Err(Self::unexpected(&token, "top-level declaration")),
            }
        }

        Ok(desc)
    }

    // ── Messages ───────────────────────────────────────────────

    fn parse_message(&mut self) -> Result<MessageType, ParseError> {
        let mut msg = MessageType {
            name: self.expect_ident("message name")?,
            ..Default::default()
        };
        self.expect_symbol('{')?;

        loop {
            let token = self.next("message body or '}'")?;
            match &token.kind {
                TokenKind::Symbol('}') => break,
                TokenKind::Symbol(';') => {}
                TokenKind::Ident(word) => match word.as_str() {
                    "message" => {
                        let nested = self.parse_message()?;
                        msg.nested_types.push(nested);
                    }
                    "enum" => {
                        let nested = self.parse_enum()?;
                        msg.enum_types.push(nested);
                    }
                    "oneof" => self.parse_oneof(&mut msg)?,
                    "option" | "reserved" | "extensions" => self.skip_statement()?,
                    "extend" => self.skip_block()?,
                    _ => {
                        // Put the first word back: it is a label or a type.
                        self.pos -= 1;
                        let field = self.parse_field(None)?;
                        msg.fields.push(field);
                    }
                },
                _ => return Err(Self::unexpected(&token, "message body or '}'")),
            }
        }

        Ok(msg)
    }

    fn parse_oneof(&mut self, msg: &mut MessageType) -> Result<(), ParseError> {
        let name = self.expect_ident("oneof name")?;
        let index = msg.oneof_decls.len() as i32;
        msg.oneof_decls.push(OneofDecl { name });
        self.expect_symbol('{')?;

        loop {
            if self.peek_symbol('}') {
                self.pos += 1;
                return Ok(());
            }
            if self.peek_symbol(';') {
                self.pos += 1;
                continue;
            }
            if self.peek_ident() == Some("option") {
                self.pos += 1;
                self.skip_statement()?;
                continue;
            }
            let field = self.parse_field(Some(index))?;
            msg.fields.push(field);
        }
    }

    fn parse_field(&mut self, oneof_index: Option<i32>) -> Result<Field, ParseError> {
        let label = match self.peek_ident() {
            Some("optional") => FieldLabel::Optional,
            Some("repeated") => FieldLabel::Repeated,
            Some("required") => FieldLabel::None,
            _ => {
                return self.parse_field_rest(FieldLabel::None, oneof_index);
            }
        };
        self.pos += 1;
        self.parse_field_rest(label, oneof_index)
    }

    fn parse_field_rest(&mut self, label: FieldLabel, oneof_index: Option<i32>) -> Result<Field, ParseError> {
        let type_token = self.peek().cloned().ok_or_else(|| ParseError::UnexpectedEof {
            expected: "field type".to_string(),
        })?;

        let type_name = if self.peek_ident() == Some("map")
            && matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Symbol('<')))
        {
            self.pos += 2;
            let key = self.expect_ident("map key type")?;
            self.expect_symbol(',')?;
            let value = self.expect_ident("map value type")?;
            self.expect_symbol('>')?;
            format!("map<{},{}>", key, value)
        } else {
            let raw = self.expect_ident("field type")?;
            if raw == "group" {
                return Err(ParseError::Unsupported {
                    line: type_token.line,
                    column: type_token.column,
                    what: "group field".to_string(),
                });
            }
            raw.trim_start_matches('.').to_string()
        };

        let name = self.expect_ident("field name")?;
        self.expect_symbol('=')?;
        let number = self.expect_int("field number")?;
        self.skip_options()?;
        self.expect_symbol(';')?;

        Ok(Field {
            name,
            number,
            label,
            type_name,
            oneof_index,
        })
    }

    // ── Enums ──────────────────────────────────────────────────

    fn parse_enum(&mut self) -> Result<EnumType, ParseError> {
        let mut enum_type = EnumType {
            name: self.expect_ident("enum name")?,
            values: Vec::new(),
        };
        self.expect_symbol('{')?;

        loop {
            let token = self.next("enum value or '}'")?;
            match &token.kind {
                TokenKind::Symbol('}') => break,
                TokenKind::Symbol(';') => {}
                TokenKind::Ident(word) if word == "option" || word == "reserved" => {
                    self.skip_statement()?;
                }
                TokenKind::Ident(word) => {
                    let name = word.clone();
                    self.expect_symbol('=')?;
                    let number = self.expect_int("enum value number")?;
                    self.skip_options()?;
                    self.expect_symbol(';')?;
                    enum_type.values.push(EnumValue { name, number });
                }
                _ => return Err(Self::unexpected(&token, "enum value or '}'")),
            }
        }

        Ok(enum_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
// Decompiled from Ankama.Dofus.Protocol.Game
syntax = "proto3";

package com.ankama.dofus.server.game.protocol;

import "google/protobuf/any.proto";
option csharp_namespace = "Ankama.Dofus.Protocol.Game";

message Iqe {
    /* obfuscated */
    string a = 1;
    repeated int64 b = 2 [packed = true];
    optional bool c = 0x3;
    map<string, int32> d = 4;
    .com.ankama.Other e = 5;
    oneof kind {
        int32 f = 6;
        string g = 7;
    }
    message Jrk {
        enum Ipz {
            option allow_alias = true;
            A = 0;
            B = 1 [deprecated = true];
            NEG = -1;
        }
        reserved 2, 15 to 20;
    }
}

enum Top { ZERO = 0; }

service Game {
    rpc Call (Iqe) returns (Iqe) { option (x) = { a: 1 }; }
}
"#;

    #[test]
    fn test_parse_sample() {
        let desc = parse_proto(SAMPLE).unwrap();
        assert_eq!(desc.syntax, "proto3");
        assert_eq!(desc.package, "com.ankama.dofus.server.game.protocol");
        assert_eq!(desc.messages.len(), 1);
        assert_eq!(desc.enums.len(), 1);
        assert_eq!(desc.enums[0].values[0].name, "ZERO");

        let msg = &desc.messages[0];
        assert_eq!(msg.name, "Iqe");
        let shape: Vec<(&str, FieldLabel, i32, Option<i32>)> = msg
            .fields
            .iter()
            .map(|f| (f.type_name.as_str(), f.label, f.number, f.oneof_index))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("string", FieldLabel::None, 1, None),
                ("int64", FieldLabel::Repeated, 2, None),
                ("bool", FieldLabel::Optional, 3, None),
                ("map<string,int32>", FieldLabel::None, 4, None),
                ("com.ankama.Other", FieldLabel::None, 5, None),
                ("int32", FieldLabel::None, 6, Some(0)),
                ("string", FieldLabel::None, 7, Some(0)),
            ]
        );
        assert_eq!(msg.oneof_decls, vec![OneofDecl { name: "kind".into() }]);

        let jrk = &msg.nested_types[0];
        assert_eq!(jrk.name, "Jrk");
        let values: Vec<(&str, i32)> = jrk.enum_types[0]
            .values
            .iter()
            .map(|v| (v.name.as_str(), v.number))
            .collect();
        assert_eq!(values, vec![("A", 0), ("B", 1), ("NEG", -1)]);
    }

    #[test]
    fn test_one_line_declarations() {
        let desc = parse_proto("message A { int32 x = 1; message B { bool y = 1; } string z = 2; }").unwrap();
        let a = &desc.messages[0];
        assert_eq!(a.fields.len(), 2);
        assert_eq!(a.fields[1].name, "z");
        assert_eq!(a.nested_types[0].fields[0].type_name, "bool");
    }

    #[test]
    fn test_missing_semicolon_reports_position() {
        let err = parse_proto("message A {\n  int32 x = 1\n}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unexpected {
                line: 3,
                column: 1,
                expected: "';'".into(),
                found: "}".into(),
            }
        );
    }

    #[test]
    fn test_unclosed_message() {
        let err = parse_proto("message A { int32 x = 1;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_invalid_field_number() {
        let err = parse_proto("message A { int32 x = 99999999999; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { line: 1, .. }));
    }

    #[test]
    fn test_groups_are_rejected() {
        let err = parse_proto("message A { optional group G = 1 { int32 x = 2; } }").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse_proto("/* never closed\nmessage A {}").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unterminated { line: 1, column: 1, what: "block comment" }
        );
    }

    #[test]
    fn test_empty_source() {
        let desc = parse_proto("  // nothing here\n").unwrap();
        assert!(desc.messages.is_empty());
        assert!(desc.enums.is_empty());
    }
}
