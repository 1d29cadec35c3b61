//! The scanner shared by both specification languages
//!
//! The two grammars use the same lexical vocabulary apart from their
//! reserved words, so a single scanner handles both, parameterized by a
//! keyword table. Tokens carry the 1-based line they start on for error
//! reporting.

use crate::error::{ParseError, ParseResult};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_regex::{regex, Lazy};
use regex::Regex;
use sheetbridge_core::{CellAddress, CellRef, Descriptor, Error as CoreError, Value};
use std::fmt;

/// Which reserved-word table to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Table,
    Sheet,
}

/// Reserved words, case-sensitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Using,
    Exec,
    Date,
    Datetime,
    Integer,
    Real,
    Text,
    None,
    Warning,
    Error,
    EnforceUnique,
    CheckDuplicates,
    Geq,
    Leq,
    Eq,
    Neq,
    Len,
    Unique,
    Index,
    Key,
    Literal,
    Query,
    Right,
    Down,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Using => "using",
            Keyword::Exec => "exec",
            Keyword::Date => "date",
            Keyword::Datetime => "datetime",
            Keyword::Integer => "integer",
            Keyword::Real => "real",
            Keyword::Text => "text",
            Keyword::None => "None",
            Keyword::Warning => "Warning",
            Keyword::Error => "Error",
            Keyword::EnforceUnique => "enforce_unique",
            Keyword::CheckDuplicates => "check_duplicates",
            Keyword::Geq => "geq",
            Keyword::Leq => "leq",
            Keyword::Eq => "eq",
            Keyword::Neq => "neq",
            Keyword::Len => "len",
            Keyword::Unique => "unique",
            Keyword::Index => "index",
            Keyword::Key => "key",
            Keyword::Literal => "literal",
            Keyword::Query => "query",
            Keyword::Right => "right",
            Keyword::Down => "down",
        }
    }

    fn lookup(language: Language, word: &str) -> Option<Keyword> {
        let table: &[Keyword] = match language {
            Language::Table => &[
                Keyword::Using,
                Keyword::Exec,
                Keyword::Date,
                Keyword::Datetime,
                Keyword::Integer,
                Keyword::Real,
                Keyword::Text,
                Keyword::None,
                Keyword::Warning,
                Keyword::Error,
                Keyword::EnforceUnique,
                Keyword::CheckDuplicates,
                Keyword::Geq,
                Keyword::Leq,
                Keyword::Eq,
                Keyword::Neq,
                Keyword::Len,
                Keyword::Unique,
                Keyword::Index,
                Keyword::Key,
            ],
            Language::Sheet => &[
                Keyword::Literal,
                Keyword::Query,
                Keyword::Using,
                Keyword::Right,
                Keyword::Down,
            ],
        };
        table.iter().copied().find(|k| k.as_str() == word)
    }
}

/// One lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Ident(String),
    Keyword(Keyword),
    /// A `$`-prefixed cell descriptor, offsets still zero
    Cell(CellRef),
    /// A `$prefix.name.corner` context variable, without the sigil
    Variable(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Comma,
    Plus,
    Dot,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{n}"),
            Token::Real(r) => write!(f, "{r}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Date(d) => write!(f, "{d}"),
            Token::DateTime(dt) => write!(f, "{dt}"),
            Token::Ident(s) => f.write_str(s),
            Token::Keyword(k) => f.write_str(k.as_str()),
            Token::Cell(c) => write!(f, "${c}"),
            Token::Variable(v) => write!(f, "${v}"),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Semicolon => f.write_str(";"),
            Token::Colon => f.write_str(":"),
            Token::Comma => f.write_str(","),
            Token::Plus => f.write_str("+"),
            Token::Dot => f.write_str("."),
            Token::Eof => f.write_str("<end of input>"),
        }
    }
}

/// A token plus the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAt {
    pub token: Token,
    pub line: u32,
}

static DATETIME: &Lazy<Regex> =
    regex!(r"^\d{1,4}[/-]\d{1,2}[/-]\d{1,4}[ \t]+\d{1,2}:\d{1,2}:\d{1,2}(\.\d{1,6})?");
static DATE: &Lazy<Regex> = regex!(r"^\d{1,4}[/-]\d{1,2}[/-]\d{1,4}");
static REAL: &Lazy<Regex> = regex!(r"^[+-]?(\d+\.\d+([eE][+-]?\d+)?|\d+[eE][+-]?\d+|\.\d+([eE][+-]?\d+)?)");
static INTEGER: &Lazy<Regex> = regex!(r"^[+-]?\d+");

/// Tokenize a whole specification text
pub fn tokenize(text: &str, language: Language) -> ParseResult<Vec<TokenAt>> {
    Lexer::new(text, language).run()
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    language: Language,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, language: Language) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            language,
        }
    }

    fn run(mut self) -> ParseResult<Vec<TokenAt>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let token = self.scan()?;
            let done = token == Token::Eof;
            tokens.push(TokenAt { token, line });
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn illegal(&self, character: char) -> ParseError {
        ParseError::Lex {
            line: self.line,
            character,
        }
    }

    fn scan(&mut self) -> ParseResult<Token> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            '{' => {
                self.bump();
                Ok(Token::LBrace)
            }
            '}' => {
                self.bump();
                Ok(Token::RBrace)
            }
            '(' => {
                self.bump();
                Ok(Token::LParen)
            }
            ')' => {
                self.bump();
                Ok(Token::RParen)
            }
            '[' => {
                self.bump();
                Ok(Token::LBracket)
            }
            ']' => {
                self.bump();
                Ok(Token::RBracket)
            }
            ';' => {
                self.bump();
                Ok(Token::Semicolon)
            }
            ':' => {
                self.bump();
                Ok(Token::Colon)
            }
            ',' => {
                self.bump();
                Ok(Token::Comma)
            }
            '"' | '\'' => self.scan_string(c),
            '$' => self.scan_cell(),
            '+' | '-' => {
                // a sign glues to the number that follows it; a lone '+' is
                // the offset operator
                if self.peek_at(1).is_some_and(|d| d.is_ascii_digit() || d == '.') {
                    self.scan_number()
                } else if c == '+' {
                    self.bump();
                    Ok(Token::Plus)
                } else {
                    Err(self.illegal(c))
                }
            }
            '.' => {
                if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.bump();
                    Ok(Token::Dot)
                }
            }
            _ if c.is_ascii_digit() => self.scan_number(),
            _ if c.is_ascii_alphabetic() || c == '_' => Ok(self.scan_word()),
            _ => Err(self.illegal(c)),
        }
    }

    fn scan_string(&mut self, quote: char) -> ParseResult<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.illegal(quote)),
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(Token::Str(value));
                }
                Some('\\') => {
                    // escapes travel through verbatim; only the quotes are
                    // consumed by the lexer
                    value.push(self.bump().unwrap());
                    if let Some(next) = self.bump() {
                        value.push(next);
                    }
                }
                Some(_) => value.push(self.bump().unwrap()),
            }
        }
    }

    fn scan_number(&mut self) -> ParseResult<Token> {
        let rest = self.rest();
        let signed = rest.starts_with('+') || rest.starts_with('-');

        if !signed {
            if let Some(m) = DATETIME.find(rest) {
                self.pos += m.end();
                let value = Value::parse_datetime(m.as_str()).map_err(|_| ParseError::Syntax {
                    line: self.line,
                    token: m.as_str().to_string(),
                    message: "invalid datetime literal".into(),
                })?;
                return Ok(Token::DateTime(value));
            }
            if let Some(m) = DATE.find(rest) {
                self.pos += m.end();
                let value = Value::parse_date(m.as_str()).map_err(|_| ParseError::Syntax {
                    line: self.line,
                    token: m.as_str().to_string(),
                    message: "invalid date literal".into(),
                })?;
                return Ok(Token::Date(value));
            }
        }

        if let Some(m) = REAL.find(rest) {
            self.pos += m.end();
            let value: f64 = m.as_str().parse().map_err(|_| ParseError::Syntax {
                line: self.line,
                token: m.as_str().to_string(),
                message: "invalid real literal".into(),
            })?;
            return Ok(Token::Real(value));
        }

        let m = INTEGER
            .find(rest)
            .expect("scan_number called on a digit or signed digit");
        self.pos += m.end();
        let value: i64 = m.as_str().parse().map_err(|_| ParseError::Syntax {
            line: self.line,
            token: m.as_str().to_string(),
            message: "integer literal out of range".into(),
        })?;
        Ok(Token::Integer(value))
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let word = &self.text[start..self.pos];
        match Keyword::lookup(self.language, word) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(word.to_string()),
        }
    }

    fn scan_cell(&mut self) -> ParseResult<Token> {
        self.bump(); // the sigil
        match self.peek() {
            Some('*') => {
                self.bump();
                Ok(Token::Cell(CellRef::new(Descriptor::Wildcard)))
            }
            Some('.') => {
                self.bump();
                if self.peek() == Some('.') {
                    self.bump();
                    Ok(Token::Cell(CellRef::new(Descriptor::DotDot)))
                } else {
                    Ok(Token::Cell(CellRef::new(Descriptor::Dot)))
                }
            }
            Some('[') => {
                self.bump();
                let needle = self.scan_needle()?;
                let row = self.scan_row_number()?;
                Ok(Token::Cell(CellRef::new(Descriptor::Match {
                    column: None,
                    row: Some(row),
                    needle,
                })))
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                {
                    self.bump();
                }
                let letters = self.text[start..self.pos].to_string();

                match self.peek() {
                    Some(d) if d.is_ascii_digit() => {
                        let row = self.scan_row_number()?;
                        let column = CellAddress::column_index(&letters)
                            .map_err(|_| self.bad_reference(&letters))?;
                        Ok(Token::Cell(CellRef::new(Descriptor::Coord(
                            CellAddress::new(column, row),
                        ))))
                    }
                    Some('[') => {
                        self.bump();
                        let needle = self.scan_needle()?;
                        let column = CellAddress::column_index(&letters)
                            .map_err(|_| self.bad_reference(&letters))?;
                        Ok(Token::Cell(CellRef::new(Descriptor::Match {
                            column: Some(column),
                            row: None,
                            needle,
                        })))
                    }
                    Some('.') => self.scan_variable(letters),
                    _ => Err(self.bad_reference(&letters)),
                }
            }
            Some(c) => Err(self.illegal(c)),
            None => Err(self.illegal('$')),
        }
    }

    /// The content of a `[...]` match, anything up to the closing bracket
    fn scan_needle(&mut self) -> ParseResult<String> {
        let mut needle = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.illegal('[')),
                Some(']') => {
                    self.bump();
                    return Ok(needle);
                }
                Some(_) => needle.push(self.bump().unwrap()),
            }
        }
    }

    fn scan_row_number(&mut self) -> ParseResult<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let digits = &self.text[start..self.pos];
        let row: u32 = digits.parse().map_err(|_| self.bad_reference(digits))?;
        if row == 0 {
            return Err(self.bad_reference(digits));
        }
        Ok(row)
    }

    fn scan_variable(&mut self, prefix: String) -> ParseResult<Token> {
        self.bump(); // first dot
        let name_start = self.pos;
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(self.bad_reference(&prefix));
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let name = self.text[name_start..self.pos].to_string();

        if self.peek() != Some('.') {
            return Err(self.bad_reference(&format!("{prefix}.{name}")));
        }
        self.bump();

        let corner_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            self.bump();
        }
        let corner = &self.text[corner_start..self.pos];
        if corner.is_empty() {
            return Err(self.bad_reference(&format!("{prefix}.{name}")));
        }

        Ok(Token::Variable(format!("{prefix}.{name}.{corner}")))
    }

    fn bad_reference(&self, text: &str) -> ParseError {
        ParseError::Reference(CoreError::InvalidReference(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetbridge_core::Descriptor;

    fn kinds(text: &str, language: Language) -> Vec<Token> {
        tokenize(text, language)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_punctuation_and_words() {
        let tokens = kinds("t { a ; }", Language::Table);
        assert_eq!(
            tokens,
            vec![
                Token::Ident("t".into()),
                Token::LBrace,
                Token::Ident("a".into()),
                Token::Semicolon,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_reserved_words_are_case_sensitive_and_per_language() {
        assert_eq!(
            kinds("integer Error", Language::Table)[..2],
            [
                Token::Keyword(Keyword::Integer),
                Token::Keyword(Keyword::Error)
            ]
        );
        // "error" is not reserved, and the sheet language does not reserve
        // "integer" at all
        assert_eq!(
            kinds("error", Language::Table)[0],
            Token::Ident("error".into())
        );
        assert_eq!(
            kinds("integer", Language::Sheet)[0],
            Token::Ident("integer".into())
        );
        assert_eq!(
            kinds("literal", Language::Sheet)[0],
            Token::Keyword(Keyword::Literal)
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 -7 3.14 -2.5e3 1e6", Language::Table)[..5],
            [
                Token::Integer(42),
                Token::Integer(-7),
                Token::Real(3.14),
                Token::Real(-2500.0),
                Token::Real(1e6),
            ]
        );
    }

    #[test]
    fn test_dates_and_datetimes() {
        let tokens = kinds("2018-07-24 24/07/2018 2018-07-24 15:18:45.5", Language::Table);
        assert!(matches!(tokens[0], Token::Date(_)));
        assert!(matches!(tokens[1], Token::Date(_)));
        assert!(matches!(tokens[2], Token::DateTime(_)));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#""hello" 'world'"#, Language::Sheet)[..2],
            [Token::Str("hello".into()), Token::Str("world".into())]
        );
        assert!(tokenize("\"unterminated", Language::Sheet).is_err());
    }

    #[test]
    fn test_cell_tokens() {
        let tokens = kinds("$B24 $B[100] $[100]3 $. $.. $*", Language::Table);
        assert!(matches!(
            &tokens[0],
            Token::Cell(c) if matches!(c.descriptor, Descriptor::Coord(_))
        ));
        assert!(matches!(
            &tokens[1],
            Token::Cell(c) if matches!(&c.descriptor, Descriptor::Match { column: Some(1), .. })
        ));
        assert!(matches!(
            &tokens[2],
            Token::Cell(c) if matches!(&c.descriptor, Descriptor::Match { row: Some(3), .. })
        ));
        assert!(matches!(&tokens[3], Token::Cell(c) if c.descriptor == Descriptor::Dot));
        assert!(matches!(&tokens[4], Token::Cell(c) if c.descriptor == Descriptor::DotDot));
        assert!(matches!(&tokens[5], Token::Cell(c) if c.descriptor == Descriptor::Wildcard));
    }

    #[test]
    fn test_variables() {
        let tokens = kinds("$query.q1.nw", Language::Sheet);
        assert_eq!(tokens[0], Token::Variable("query.q1.nw".into()));
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = tokenize("a # comment\nb", Language::Table).unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].token, Token::Ident("b".into()));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_illegal_character() {
        assert!(matches!(
            tokenize("a ! b", Language::Table),
            Err(ParseError::Lex { line: 1, character: '!' })
        ));
    }
}
