//! Lexer/Scanner implementation for the Cinder language
//!
//! This module implements lexical analysis, converting source code into tokens.

use crate::error::{CinderError, CinderResult, SourceLocation};
use super::token::{Token, TokenType, Keyword, Literal};

/// Lexer for Cinder source code
pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    column: usize,
    filename: Option<String>,
}

impl Lexer {
    /// Create a new lexer
    pub fn new(source: &str, filename: Option<&str>) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            filename: filename.map(|s| s.to_string()),
        }
    }

    /// Tokenize the source code
    ///
    /// The returned stream always ends with a single `Eof` token.
    pub fn tokenize(&mut self) -> CinderResult<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            self.current_location(),
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> CinderResult<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => Ok(()),

            '\n' => {
                self.add_token(TokenType::Newline)?;
                self.line += 1;
                self.column = 1;
                Ok(())
            }

            // Line comment: the newline that ends it is still a terminator
            '#' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
                Ok(())
            }

            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '+' => self.add_token(TokenType::Plus),
            '-' => self.add_token(TokenType::Minus),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            '%' => self.add_token(TokenType::Percent),
            '^' => self.add_token(TokenType::Caret),

            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenType::Equal)
                } else {
                    self.add_token(TokenType::Assign)
                }
            }

            '<' => {
                if self.match_char('=') {
                    self.add_token(TokenType::LessEqual)
                } else {
                    self.add_token(TokenType::Less)
                }
            }

            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenType::GreaterEqual)
                } else {
                    self.add_token(TokenType::Greater)
                }
            }

            c if c.is_ascii_digit() => self.scan_number(),

            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

            _ => Err(self.error_at_start(&format!("Unexpected character '{}'", c))),
        }
    }

    /// Scan a number literal (integer or float)
    fn scan_number(&mut self) -> CinderResult<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let is_float = if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            true
        } else {
            false
        };

        let lexeme: String = self.source[self.start..self.current].iter().collect();

        if is_float {
            let value = lexeme
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| self.error_at_start(&format!("Invalid float literal '{}'", lexeme)))?;
            self.add_token(TokenType::Literal(Literal::Float(value)))
        } else {
            let value = lexeme.parse::<i64>().map_err(|_| {
                self.error_at_start(&format!("Integer literal '{}' is out of range", lexeme))
            })?;
            self.add_token(TokenType::Literal(Literal::Integer(value)))
        }
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self) -> CinderResult<()> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme: String = self.source[self.start..self.current].iter().collect();

        let token_type = match Keyword::from_str(&lexeme) {
            Some(keyword) => TokenType::Keyword(keyword),
            None => TokenType::Identifier,
        };

        self.add_token(token_type)
    }

    fn add_token(&mut self, token_type: TokenType) -> CinderResult<()> {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        let location = self.start_location();
        self.tokens.push(Token::new(token_type, lexeme, location));
        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.filename.clone())
    }

    /// Location of the first character of the token being scanned
    fn start_location(&self) -> SourceLocation {
        SourceLocation::new(
            self.line,
            self.column - (self.current - self.start),
            self.filename.clone(),
        )
    }

    fn error_at_start(&self, message: &str) -> CinderError {
        CinderError::lexer_error(message, self.start_location())
    }
}
