// SQL parser - converts tokens to AST

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::value::Value;
use anyhow::{bail, Result};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    placeholders: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
            placeholders: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token() {
            Token::Select => Statement::Select(self.parse_select()?),
            Token::Insert => Statement::Insert(self.parse_insert()?),
            other => bail!("Expected SELECT or INSERT, found {:?}", other),
        };
        if self.match_token(&Token::Semicolon) {
            self.advance();
        }
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected {:?} after end of statement", self.current_token());
        }
        Ok(statement)
    }

    /// Number of `?` placeholders seen so far
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_token(Token::Select)?;

        let distinct = if self.match_token(&Token::Distinct) {
            self.advance();
            true
        } else {
            false
        };

        // SQL Server row limit
        let mut limit = if self.match_token(&Token::Top) {
            self.advance();
            Some(self.expect_number()?)
        } else {
            None
        };

        let projections = self.parse_select_items()?;

        self.expect_token(Token::From)?;
        let from = self.parse_from()?;

        let where_clause = if self.match_token(&Token::Where) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        let mut order_by = vec![];
        if self.match_token(&Token::Order) {
            self.advance();
            self.expect_token(Token::By)?;
            order_by = self.parse_order_by_items()?;
        }

        if self.match_token(&Token::Limit) {
            self.advance();
            limit = Some(self.expect_number()?);
        }

        let mut offset = None;
        if self.match_token(&Token::Offset) {
            self.advance();
            offset = Some(self.expect_number()?);
            // OFFSET m ROWS
            if self.match_token(&Token::Rows) || self.match_token(&Token::Row) {
                self.advance();
            }
        }

        // FETCH { FIRST | NEXT } n ROWS ONLY
        if self.match_token(&Token::Fetch) {
            self.advance();
            if self.match_token(&Token::First) || self.match_token(&Token::Next) {
                self.advance();
            } else {
                bail!("Expected FIRST or NEXT after FETCH, found {:?}", self.current_token());
            }
            limit = Some(self.expect_number()?);
            if self.match_token(&Token::Rows) || self.match_token(&Token::Row) {
                self.advance();
            }
            self.expect_token(Token::Only)?;
        }

        Ok(SelectStatement {
            distinct,
            projections,
            from,
            where_clause,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_items(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = vec![];

        loop {
            if self.match_token(&Token::Star) {
                self.advance();
                items.push(SelectItem::AllColumns);
            } else if self.is_count_star() {
                // COUNT ( * )
                self.advance();
                self.advance();
                self.advance();
                self.expect_token(Token::RightParen)?;
                items.push(SelectItem::CountAll);
            } else {
                items.push(SelectItem::Expression(self.parse_expression()?));
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(items)
    }

    fn is_count_star(&self) -> bool {
        matches!(self.current_token(), Token::Identifier(name) if name.eq_ignore_ascii_case("COUNT"))
            && self.peek_token(1) == Token::LeftParen
            && self.peek_token(2) == Token::Star
    }

    fn parse_from(&mut self) -> Result<FromClause> {
        if self.match_token(&Token::LeftParen) {
            self.advance();
            let query = self.parse_select()?;
            self.expect_token(Token::RightParen)?;
            if self.match_token(&Token::As) {
                self.advance();
            }
            let alias = self.expect_identifier()?;
            return Ok(FromClause::Subquery {
                query: Box::new(query),
                alias,
            });
        }
        Ok(FromClause::Table(self.expect_identifier()?))
    }

    fn parse_order_by_items(&mut self) -> Result<Vec<OrderByItem>> {
        let mut items = vec![];

        loop {
            let expression = self.parse_expression()?;
            let direction = match self.current_token() {
                Token::Asc => {
                    self.advance();
                    OrderDirection::Asc
                }
                Token::Desc => {
                    self.advance();
                    OrderDirection::Desc
                }
                _ => OrderDirection::Asc,
            };
            items.push(OrderByItem {
                expression,
                direction,
            });

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(items)
    }

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_token(Token::Insert)?;
        self.expect_token(Token::Into)?;
        let table_name = self.expect_identifier()?;

        if self.match_token(&Token::Default) {
            self.advance();
            self.expect_token(Token::Values)?;
            return Ok(InsertStatement {
                table_name,
                columns: vec![],
                values: vec![],
            });
        }

        self.expect_token(Token::LeftParen)?;
        let columns = if self.match_token(&Token::RightParen) {
            vec![]
        } else {
            self.parse_identifier_list()?
        };
        self.expect_token(Token::RightParen)?;

        self.expect_token(Token::Values)?;
        self.expect_token(Token::LeftParen)?;
        let values = if self.match_token(&Token::RightParen) {
            vec![]
        } else {
            self.parse_expression_list()?
        };
        self.expect_token(Token::RightParen)?;

        if columns.len() != values.len() {
            bail!(
                "INSERT lists {} columns but {} values",
                columns.len(),
                values.len()
            );
        }

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.parse_not()?;
            Ok(Expression::Not(Box::new(operand)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_unary()?;

        if self.match_token(&Token::Is) {
            self.advance();
            let negated = if self.match_token(&Token::Not) {
                self.advance();
                true
            } else {
                false
            };
            self.expect_token(Token::Null)?;
            return Ok(Expression::IsNull {
                expression: Box::new(left),
                negated,
            });
        }

        let negated_in = self.match_token(&Token::Not) && self.peek_token(1) == Token::In;
        if negated_in || self.match_token(&Token::In) {
            if negated_in {
                self.advance();
            }
            self.advance();
            self.expect_token(Token::LeftParen)?;
            let expression = if self.match_token(&Token::Select) {
                let subquery = self.parse_select()?;
                Expression::InSubquery {
                    expression: Box::new(left),
                    subquery: Box::new(subquery),
                    negated: negated_in,
                }
            } else {
                Expression::InList {
                    expression: Box::new(left),
                    list: self.parse_expression_list()?,
                    negated: negated_in,
                }
            };
            self.expect_token(Token::RightParen)?;
            return Ok(expression);
        }

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::Less => BinaryOperator::Less,
            Token::Greater => BinaryOperator::Greater,
            Token::LessEqual => BinaryOperator::LessEqual,
            Token::GreaterEqual => BinaryOperator::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_unary()?;
        Ok(Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Minus) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Negate(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                if let Ok(i) = n.parse::<i32>() {
                    Ok(Expression::Literal(Value::Int32(i)))
                } else if let Ok(i) = n.parse::<i64>() {
                    Ok(Expression::Literal(Value::Int64(i)))
                } else {
                    bail!("Invalid number: {}", n)
                }
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(Value::Null))
            }
            Token::Placeholder => {
                self.advance();
                let index = self.placeholders;
                self.placeholders += 1;
                Ok(Expression::Placeholder(index))
            }
            Token::Identifier(name) => {
                self.advance();
                if self.match_token(&Token::Dot) {
                    self.advance();
                    let column = self.expect_identifier()?;
                    Ok(Expression::QualifiedColumn(name, column))
                } else {
                    Ok(Expression::Column(name))
                }
            }
            Token::LeftParen => {
                self.advance();
                if self.match_token(&Token::Select) {
                    bail!("Scalar subqueries are not supported");
                }
                let mut list = self.parse_expression_list()?;
                self.expect_token(Token::RightParen)?;
                if list.len() == 1 {
                    Ok(list.remove(0))
                } else {
                    Ok(Expression::Row(list))
                }
            }
            other => bail!("Unexpected token in expression: {:?}", other),
        }
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = vec![];

        loop {
            identifiers.push(self.expect_identifier()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(identifiers)
    }

    // Helper methods

    fn current_token(&self) -> Token {
        self.peek_token(0)
    }

    fn peek_token(&self, offset: usize) -> Token {
        self.tokens
            .get(self.position + offset)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => bail!("Expected identifier, found {:?}", other),
        }
    }

    fn expect_number(&mut self) -> Result<u64> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                Ok(n.parse()?)
            }
            other => bail!("Expected number, found {:?}", other),
        }
    }
}
