//! Recursive-descent parser for the table-spec language

use crate::cursor::Cursor;
use crate::error::ParseResult;
use crate::lexer::{tokenize, Keyword, Language, Token};
use crate::table::ast::{
    Action, Block, Column, Content, Database, Expression, Modifier, Qualifier, SqlStatement, Table,
};
use crate::template;
use sheetbridge_core::{CellRef, RangeRef, Value};

/// Parse a table specification into a [`Database`]
///
/// The text is run through the template preprocessor first; lexical, syntax
/// and template errors all abort before anything executes.
pub fn parse_table_spec(text: &str) -> ParseResult<Database> {
    let expansion = template::expand(text)?;
    let tokens = tokenize(&expansion.text, Language::Table)?;
    TableParser {
        cursor: Cursor::new(tokens),
    }
    .parse()
}

struct TableParser {
    cursor: Cursor,
}

impl TableParser {
    fn parse(mut self) -> ParseResult<Database> {
        let mut expressions = Vec::new();
        while !self.cursor.at_end() {
            expressions.push(self.expression()?);
        }
        if expressions.is_empty() {
            return Err(self.cursor.error("expected a table or an exec statement"));
        }
        Ok(Database { expressions })
    }

    fn expression(&mut self) -> ParseResult<Expression> {
        if self.cursor.eat(&Token::Keyword(Keyword::Exec)) {
            let text = self.string("an SQL string after 'exec'")?;
            return Ok(Expression::Sql(SqlStatement { text }));
        }
        self.table().map(Expression::Table)
    }

    fn table(&mut self) -> ParseResult<Table> {
        let name = self.ident("a table name")?;

        let (mut spreadsheet, mut sheet) = (None, None);
        if self.cursor.eat(&Token::Keyword(Keyword::Using)) {
            spreadsheet = Some(self.string("a spreadsheet name after 'using'")?);
            if self.cursor.eat(&Token::Colon) {
                sheet = Some(self.string("a sheet name after ':'")?);
            }
        }

        self.cursor.expect(Token::LBrace, "'{'")?;
        let block = self.block()?;
        self.cursor.expect(Token::RBrace, "'}'")?;

        Ok(Table {
            name,
            spreadsheet,
            sheet,
            block,
        })
    }

    fn block(&mut self) -> ParseResult<Block> {
        // modifiers must prefix the columns
        let mut modifiers = Vec::new();
        while let Some(modifier) = self.modifier()? {
            modifiers.push(modifier);
        }

        let mut columns = Vec::new();
        while *self.cursor.current() != Token::RBrace {
            columns.push(self.column()?);
        }
        if columns.is_empty() {
            return Err(self.cursor.error("a block needs at least one column"));
        }

        Ok(Block { columns, modifiers })
    }

    fn modifier(&mut self) -> ParseResult<Option<Modifier>> {
        let modifier = match self.cursor.current() {
            Token::Keyword(Keyword::EnforceUnique) => {
                self.cursor.advance();
                Modifier::EnforceUnique
            }
            Token::Keyword(Keyword::CheckDuplicates) => {
                self.cursor.advance();
                Modifier::CheckDuplicates
            }
            Token::Keyword(k @ (Keyword::Geq | Keyword::Leq | Keyword::Eq | Keyword::Neq | Keyword::Len)) => {
                let keyword = *k;
                self.cursor.advance();
                let count = match self.cursor.advance() {
                    Token::Integer(n) => n,
                    _ => return Err(self.cursor.error("expected a number after the modifier")),
                };
                match keyword {
                    Keyword::Geq => Modifier::Geq(count),
                    Keyword::Leq => Modifier::Leq(count),
                    Keyword::Eq => Modifier::Eq(count),
                    Keyword::Neq => Modifier::Neq(count),
                    _ => Modifier::Len(count),
                }
            }
            _ => return Ok(None),
        };
        self.cursor.expect(Token::Semicolon, "';' after the modifier")?;
        Ok(Some(modifier))
    }

    fn column(&mut self) -> ParseResult<Column> {
        let name = self.ident("a column name")?;

        let mut contents = vec![self.content()?];
        while self.cursor.eat(&Token::Comma) {
            contents.push(self.content()?);
        }

        let data_type = match self.cursor.current() {
            Token::Keyword(Keyword::Integer) => Some(sheetbridge_core::DataType::Integer),
            Token::Keyword(Keyword::Real) => Some(sheetbridge_core::DataType::Real),
            Token::Keyword(Keyword::Text) => Some(sheetbridge_core::DataType::Text),
            Token::Keyword(Keyword::Date) => Some(sheetbridge_core::DataType::Date),
            Token::Keyword(Keyword::Datetime) => Some(sheetbridge_core::DataType::DateTime),
            _ => None,
        };
        if data_type.is_some() {
            self.cursor.advance();
        }

        let action = self.action()?;

        let mut qualifiers = Vec::new();
        loop {
            let qualifier = match self.cursor.current() {
                Token::Keyword(Keyword::Key) => Qualifier::Key,
                Token::Keyword(Keyword::Index) => Qualifier::Index,
                Token::Keyword(Keyword::Unique) => Qualifier::Unique,
                _ => break,
            };
            self.cursor.advance();
            qualifiers.push(qualifier);
        }

        self.cursor
            .expect(Token::Semicolon, "';' after the column definition")?;

        Ok(Column {
            name,
            contents,
            data_type,
            action,
            qualifiers,
        })
    }

    fn content(&mut self) -> ParseResult<Content> {
        if let Some(value) = self.value() {
            return Ok(Content::Explicit(value));
        }

        let start = self.cell_reference()?;
        let range = if self.cursor.eat(&Token::Colon) {
            let end = self.cell_reference()?;
            RangeRef::new(start, end)
        } else {
            RangeRef::single(start)
        };
        Ok(Content::Cells(range))
    }

    fn cell_reference(&mut self) -> ParseResult<CellRef> {
        let mut cell = match self.cursor.current().clone() {
            Token::Cell(cell) => {
                self.cursor.advance();
                cell
            }
            _ => return Err(self.cursor.error("expected a cell reference")),
        };

        // optional offset: + (columns, rows)
        if self.cursor.eat(&Token::Plus) {
            self.cursor.expect(Token::LParen, "'(' after '+'")?;
            let columns = self.integer("a column offset")?;
            self.cursor.expect(Token::Comma, "',' between offsets")?;
            let rows = self.integer("a row offset")?;
            self.cursor.expect(Token::RParen, "')' after the offset")?;
            cell.col_offset = columns;
            cell.row_offset = rows;
        }

        Ok(cell)
    }

    fn action(&mut self) -> ParseResult<Action> {
        match self.cursor.current() {
            Token::Keyword(Keyword::Error) => {
                self.cursor.advance();
                Ok(Action::Error)
            }
            Token::Keyword(Keyword::None) => {
                self.cursor.advance();
                Ok(Action::None(self.action_default()?))
            }
            Token::Keyword(Keyword::Warning) => {
                self.cursor.advance();
                Ok(Action::Warning(self.action_default()?))
            }
            // a bare default value means the silent action
            _ => match self.value() {
                Some(default) => Ok(Action::None(Some(default))),
                None => Ok(Action::None(None)),
            },
        }
    }

    fn action_default(&mut self) -> ParseResult<Option<Value>> {
        if !self.cursor.eat(&Token::LParen) {
            return Ok(None);
        }
        let default = self
            .value()
            .ok_or_else(|| self.cursor.error("expected a default value"))?;
        self.cursor.expect(Token::RParen, "')' after the default")?;
        Ok(Some(default))
    }

    fn value(&mut self) -> Option<Value> {
        let value = match self.cursor.current() {
            Token::Integer(n) => Value::Integer(*n),
            Token::Real(r) => Value::Real(*r),
            Token::Str(s) => Value::Text(s.clone()),
            Token::Date(d) => Value::Date(*d),
            Token::DateTime(dt) => Value::DateTime(*dt),
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
