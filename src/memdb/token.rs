// SQL tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),
    Placeholder,

    // Keywords
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Default,
    And,
    Or,
    Not,
    Null,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    Distinct,
    In,
    Is,
    True,
    False,
    As,
    Top,
    Fetch,
    First,
    Next,
    Rows,
    Row,
    Only,

    // Operators
    Minus,
    Star,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl Token {
    /// Convert a string to a keyword token if it matches
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(Token::Select),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            "INSERT" => Some(Token::Insert),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "DEFAULT" => Some(Token::Default),
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "NULL" => Some(Token::Null),
            "ORDER" => Some(Token::Order),
            "BY" => Some(Token::By),
            "ASC" => Some(Token::Asc),
            "DESC" => Some(Token::Desc),
            "LIMIT" => Some(Token::Limit),
            "OFFSET" => Some(Token::Offset),
            "DISTINCT" => Some(Token::Distinct),
            "IN" => Some(Token::In),
            "IS" => Some(Token::Is),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "AS" => Some(Token::As),
            "TOP" => Some(Token::Top),
            "FETCH" => Some(Token::Fetch),
            "FIRST" => Some(Token::First),
            "NEXT" => Some(Token::Next),
            "ROWS" => Some(Token::Rows),
            "ROW" => Some(Token::Row),
            "ONLY" => Some(Token::Only),
            _ => None,
        }
    }
}
