//! Recursive-descent parser for the sheet-spec language

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Keyword, Language, Token};
use crate::sheet::ast::{
    Book, CellSpec, Command, Direction, LiteralCommand, QueryCommand, Registry, Spreadsheet,
};
use crate::template;
use sheetbridge_core::{DataType, Descriptor, Value};
use std::collections::HashMap;

/// Parse a sheet specification into a [`Book`]
///
/// The text is run through the template preprocessor first. Literal and
/// query declarations are resolved while parsing: conflicting or unknown
/// names abort the compilation.
pub fn parse_sheet_spec(text: &str) -> ParseResult<Book> {
    let expansion = template::expand(text)?;
    let tokens = tokenize(&expansion.text, Language::Sheet)?;
    SheetParser {
        cursor: Cursor::new(tokens),
        literals: HashMap::new(),
        queries: HashMap::new(),
    }
    .parse()
}

struct SheetParser {
    cursor: Cursor,
    literals: HashMap<String, Value>,
    /// query name -> (sql, database override)
    queries: HashMap<String, (String, Option<String>)>,
}

impl SheetParser {
    fn parse(mut self) -> ParseResult<Book> {
        let mut spreadsheets = Vec::new();
        while !self.cursor.at_end() {
            match self.cursor.current() {
                // a declaration is `literal`/`query` followed by a name; in
                // command position those keywords are followed by a dot
                Token::Keyword(Keyword::Literal) | Token::Keyword(Keyword::Query) => {
                    self.declaration()?;
                }
                _ => spreadsheets.push(self.spreadsheet()?),
            }
        }
        if spreadsheets.is_empty() && self.literals.is_empty() && self.queries.is_empty() {
            return Err(self.cursor.error("expected declarations or spreadsheets"));
        }
        Ok(Book { spreadsheets })
    }

    fn declaration(&mut self) -> ParseResult<()> {
        let keyword = self.cursor.advance();
        let name = self.ident("a declaration name")?;

        if keyword == Token::Keyword(Keyword::Literal) {
            let value = self
                .value()
                .ok_or_else(|| self.cursor.error("expected a literal value"))?;
            if self.literals.contains_key(&name) {
                return Err(ParseError::Semantic(format!(
                    "conflicting definitions for literal '{name}'"
                )));
            }
            self.literals.insert(name, value);
        } else {
            let sql = self.string("a query string")?;
            let database = if self.cursor.eat(&Token::Keyword(Keyword::Using)) {
                Some(self.string("a database name after 'using'")?)
            } else {
                None
            };
            if self.queries.contains_key(&name) {
                return Err(ParseError::Semantic(format!(
                    "conflicting definitions for query '{name}'"
                )));
            }
            self.queries.insert(name, (sql, database));
        }
        Ok(())
    }

    fn spreadsheet(&mut self) -> ParseResult<Spreadsheet> {
        let (file, sheet) = self.filespec()?;
        let database = if self.cursor.eat(&Token::Keyword(Keyword::Using)) {
            Some(self.string("a database name after 'using'")?)
        } else {
            None
        };

        self.cursor.expect(Token::LBrace, "'{'")?;
        let mut commands = Vec::new();
        while *self.cursor.current() != Token::RBrace {
            commands.push(self.command()?);
        }
        if commands.is_empty() {
            return Err(self.cursor.error("a spreadsheet needs at least one command"));
        }
        self.cursor.expect(Token::RBrace, "'}'")?;

        Ok(Spreadsheet {
            registry: Registry { commands },
            file,
            sheet,
            database,
        })
    }

    /// `"file" : "sheet"`, either side optional; a bare `:` means neither,
    /// and the header may be missing entirely
    fn filespec(&mut self) -> ParseResult<(Option<String>, Option<String>)> {
        match self.cursor.current().clone() {
            Token::Str(file) => {
                self.cursor.advance();
                self.cursor.expect(Token::Colon, "':' after the file name")?;
                match self.cursor.current().clone() {
                    Token::Str(sheet) => {
                        self.cursor.advance();
                        Ok((Some(file), Some(sheet)))
                    }
                    _ => Ok((Some(file), None)),
                }
            }
            Token::Colon => {
                self.cursor.advance();
                match self.cursor.current().clone() {
                    Token::Str(sheet) => {
                        self.cursor.advance();
                        Ok((None, Some(sheet)))
                    }
                    _ => Ok((None, None)),
                }
            }
            _ => Ok((None, None)),
        }
    }

    fn command(&mut self) -> ParseResult<Command> {
        let start = self.cell_spec()?;
        let (end, ranged) = if self.cursor.eat(&Token::Colon) {
            (self.cell_spec()?, true)
        } else {
            (start.clone(), false)
        };

        let attributes = self.attributes()?;

        // replication is only meaningful over a range, and a range demands it
        let direction = if ranged {
            Some(match self.cursor.advance() {
                Token::Keyword(Keyword::Right) => Direction::Right,
                Token::Keyword(Keyword::Down) => Direction::Down,
                _ => {
                    return Err(self
                        .cursor
                        .error("expected 'right' or 'down' after a range target"))
                }
            })
        } else {
            None
        };

        let command = self.content((start, end), direction, attributes)?;
        self.cursor.expect(Token::Semicolon, "';' after the command")?;
        Ok(command)
    }

    fn content(
        &mut self,
        target: (CellSpec, CellSpec),
        direction: Option<Direction>,
        attributes: Vec<(String, Value)>,
    ) -> ParseResult<Command> {
        // named literal or query reference
        if matches!(
            self.cursor.current(),
            Token::Keyword(Keyword::Literal) | Token::Keyword(Keyword::Query)
        ) {
            let keyword = self.cursor.advance();
            self.cursor.expect(Token::Dot, "'.' after the keyword")?;
            let name = self.ident("a declaration name")?;

            if keyword == Token::Keyword(Keyword::Literal) {
                let value = self.literals.get(&name).cloned().ok_or_else(|| {
                    ParseError::Semantic(format!("unknown literal '{name}'"))
                })?;
                let data_type = value.data_type();
                return Ok(Command::Literal(LiteralCommand {
                    name: Some(name),
                    target,
                    value,
                    data_type,
                    direction,
                    attributes,
                }));
            }

            let (sql, database) = self.queries.get(&name).cloned().ok_or_else(|| {
                ParseError::Semantic(format!("unknown query '{name}'"))
            })?;
            return Ok(Command::Query(QueryCommand {
                name: Some(name),
                target,
                sql,
                database,
                direction,
                attributes,
            }));
        }

        let value = self
            .value()
            .ok_or_else(|| self.cursor.error("expected content for the command"))?;
        let data_type = value.data_type();
        Ok(Command::Literal(LiteralCommand {
            name: None,
            target,
            value,
            data_type,
            direction,
            attributes,
        }))
    }

    fn cell_spec(&mut self) -> ParseResult<CellSpec> {
        let mut spec = match self.cursor.current().clone() {
            Token::Cell(cell) => {
                if !matches!(cell.descriptor, Descriptor::Coord(_)) {
                    return Err(self
                        .cursor
                        .error("only explicit cells can target a spreadsheet"));
                }
                self.cursor.advance();
                CellSpec::Cell(cell)
            }
            Token::Variable(name) => {
                self.cursor.advance();
                CellSpec::Variable {
                    name,
                    col_offset: 0,
                    row_offset: 0,
                }
            }
            _ => return Err(self.cursor.error("expected a cell or a variable")),
        };

        if self.cursor.eat(&Token::Plus) {
            self.cursor.expect(Token::LParen, "'(' after '+'")?;
            let columns = self.integer("a column offset")?;
            self.cursor.expect(Token::Comma, "',' between offsets")?;
            let rows = self.integer("a row offset")?;
            self.cursor.expect(Token::RParen, "')' after the offset")?;

            match &mut spec {
                CellSpec::Cell(cell) => {
                    cell.col_offset = columns;
                    cell.row_offset = rows;
                }
                CellSpec::Variable {
                    col_offset,
                    row_offset,
                    ..
                } => {
                    *col_offset = columns;
                    *row_offset = rows;
                }
            }
        }

        Ok(spec)
    }

    fn attributes(&mut self) -> ParseResult<Vec<(String, Value)>> {
        if !self.cursor.eat(&Token::LBracket) {
            return Ok(Vec::new());
        }

        let mut attributes = Vec::new();
        loop {
            let key = self.ident("an attribute name")?;
            self.cursor
                .expect(Token::Colon, "':' after the attribute name")?;
            let value = match self.cursor.advance() {
                Token::Integer(n) => Value::Integer(n),
                Token::Str(s) => Value::Text(s),
                _ => return Err(self.cursor.error("expected a number or a string")),
            };
            attributes.push((key, value));

            if !self.cursor.eat(&Token::Comma) {
                break;
            }
        }
        self.cursor
            .expect(Token::RBracket, "']' after the attributes")?;
        Ok(attributes)
    }

    fn value(&mut self) -> Option<Value> {
        let value = match self.cursor.current() {
            Token::Integer(n) => Value::Integer(*n),
            Token::Real(r) => Value::Real(*r),
            Token::Date(d) => Value::Date(*d),
            Token::DateTime(dt) => Value::DateTime(*dt),
            Token::Str(s) if s.starts_with('=') => Value::Formula(s.clone()),
            Token::Str(s) => Value::Text(s.clone()),
            _ => return None,
        };
        self.cursor.advance();
        Some(value)
    }

    fn ident(&mut self, wanted: &str) -> ParseResult<String> {
        match self.cursor.current().clone() {
            Token::Ident(name) => {
                self.cursor.advance();
                Ok(name)
            }
            _ => Err(self.cursor.error(format!("expected {wanted}"))),
        }
    }

    fn string(&mut self, wanted: &str) -> ParseResult<String> {
        match self.cursor.current().clone() {
            Token::Str(text) => {
                self.cursor.advance();
                Ok(text)
            }
            _ => Err(self.cursor.error(format!("expected {wanted}"))),
        }
    }

    fn integer(&mut self, wanted: &str) -> ParseResult<i64> {
        match self.cursor.current() {
            Token::Integer(n) => {
                let n = *n;
                self.cursor.advance();
                Ok(n)
            }
            _ => Err(self.cursor.error(format!("expected {wanted}"))),
        }
    }
}
