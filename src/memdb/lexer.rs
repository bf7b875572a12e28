// SQL lexer - tokenizes SQL statements

use super::token::Token;
use anyhow::{bail, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        let token = match ch {
            '-' => {
                self.advance();
                if self.current_char() == Some('-') {
                    self.skip_comment();
                    return self.next_token();
                }
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '?' => {
                self.advance();
                Token::Placeholder
            }
            '=' => {
                self.advance();
                Token::Equal
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::Less,
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                self.advance();
                Token::NotEqual
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            '\'' => self.read_string()?,
            '"' => self.read_quoted_identifier()?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            other => bail!("Unexpected character '{}' at position {}", other, self.position),
        };

        Ok(token)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip single-line comments starting with --
    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a quoted identifier; `""` is an escaped quote
    fn read_quoted_identifier(&mut self) -> Result<Token> {
        self.advance();
        let mut identifier = String::new();
        loop {
            match self.current_char() {
                Some('"') if self.peek() == Some('"') => {
                    identifier.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::Identifier(identifier));
                }
                Some(ch) => {
                    identifier.push(ch);
                    self.advance();
                }
                None => bail!("Unterminated quoted identifier"),
            }
        }
    }

    /// Read a string literal; `''` is an escaped quote
    fn read_string(&mut self) -> Result<Token> {
        self.advance();
        let mut string = String::new();
        loop {
            match self.current_char() {
                Some('\'') if self.peek() == Some('\'') => {
                    string.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    return Ok(Token::String(string));
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
                None => bail!("Unterminated string literal"),
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().unwrap()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens("SELECT * FROM cities"),
            vec![
                Token::Select,
                Token::Star,
                Token::From,
                Token::Identifier("cities".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("= < > <= >= <> != ? -"),
            vec![
                Token::Equal,
                Token::Less,
                Token::Greater,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::NotEqual,
                Token::NotEqual,
                Token::Placeholder,
                Token::Minus,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            tokens("'St. Petersburg' 'it''s'"),
            vec![
                Token::String("St. Petersburg".to_string()),
                Token::String("it's".to_string()),
                Token::Eof,
            ]
        );
        assert!(Lexer::new("'open").tokenize().is_err());
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            tokens(r#""order"."user" "a""b""#),
            vec![
                Token::Identifier("order".to_string()),
                Token::Dot,
                Token::Identifier("user".to_string()),
                Token::Identifier("a\"b".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("SELECT -- comment\n* FROM t"),
            vec![
                Token::Select,
                Token::Star,
                Token::From,
                Token::Identifier("t".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_qualified_columns_and_limit() {
        let tokens = tokens("SELECT users.id FROM users WHERE users.name = ? LIMIT 10");
        assert_eq!(tokens[1], Token::Identifier("users".to_string()));
        assert_eq!(tokens[2], Token::Dot);
        assert_eq!(tokens[3], Token::Identifier("id".to_string()));
        assert_eq!(tokens[10], Token::Equal);
        assert_eq!(tokens[11], Token::Placeholder);
        assert_eq!(tokens[12], Token::Limit);
        assert_eq!(tokens[13], Token::Number("10".to_string()));
    }
}
