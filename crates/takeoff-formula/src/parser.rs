//! Formula parser
//!
//! A recursive descent parser for quantity formulas with conventional
//! arithmetic precedence. The grammar is closed:
//!
//! ```text
//! expression     := additive
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/') unary)*
//! unary          := ('-' | '+') unary | primary
//! primary        := NUMBER | '[' CODE ']' | '(' expression ')' | NAME '(' args ')'
//! ```
//!
//! Braces are accepted as grouping and read as parentheses. Before parsing,
//! the token stream is checked for the defects of a half-typed expression
//! (see [`Malformation`]).

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult, Malformation};

/// Deepest nesting of parentheses, signs and function calls accepted
pub const MAX_NESTING_DEPTH: usize = 64;

/// Longest token stream accepted; bounds the depth of operator chains
pub const MAX_FORMULA_TOKENS: usize = 512;

/// Parse a formula string into an AST
///
/// An empty expression parses as the number 0.
///
/// # Example
/// ```rust
/// use takeoff_formula::{parse_formula, FormulaExpr};
///
/// let ast = parse_formula("[LG] + [LP]").unwrap();
/// assert_eq!(ast.references(), vec!["LG", "LP"]);
/// assert_eq!(parse_formula("").unwrap(), FormulaExpr::Number(0.0));
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let tokens = Lexer::new(formula).tokenize()?;
    if tokens.is_empty() {
        return Ok(FormulaExpr::Number(0.0));
    }
    if tokens.len() > MAX_FORMULA_TOKENS {
        return Err(FormulaError::TooComplex(format!(
            "{} tokens exceeds the {}-token limit",
            tokens.len(),
            MAX_FORMULA_TOKENS
        )));
    }

    check_well_formed(&tokens)?;

    let mut parser = FormulaParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !parser.is_at_end() {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Reference(String),
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
}

impl Token {
    fn is_operator(&self) -> bool {
        matches!(self, Token::Plus | Token::Minus | Token::Star | Token::Slash)
    }
}

/// Reject expressions that are obviously unfinished
fn check_well_formed(tokens: &[Token]) -> FormulaResult<()> {
    if tokens.last().map_or(false, Token::is_operator) {
        return Err(FormulaError::Malformed(Malformation::TrailingOperator));
    }

    let opening = tokens.iter().filter(|t| **t == Token::LeftParen).count();
    let closing = tokens.iter().filter(|t| **t == Token::RightParen).count();
    if opening != closing {
        return Err(FormulaError::Malformed(Malformation::UnbalancedParentheses));
    }

    if matches!(tokens.first(), Some(Token::Star | Token::Slash)) {
        return Err(FormulaError::Malformed(Malformation::LeadingOperator));
    }

    if tokens
        .windows(2)
        .any(|pair| pair[0].is_operator() && pair[1].is_operator())
    {
        return Err(FormulaError::Malformed(Malformation::AdjacentOperators));
    }

    Ok(())
}

/// Splits formula text into tokens
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn tokenize(mut self) -> FormulaResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                return Ok(tokens);
            }
            tokens.push(self.scan_token()?);
        }
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Err(FormulaError::Parse("Unexpected end of input".into())),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' | '{' => Some(Token::LeftParen),
            ')' | '}' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        if c == '[' {
            return self.scan_reference();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(FormulaError::Parse(format!("Unexpected character '{}'", c)))
    }

    fn scan_reference(&mut self) -> FormulaResult<Token> {
        self.advance(); // Skip '['

        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == ']' {
                let code = &self.input[start..self.pos];
                self.advance();
                if code.is_empty() {
                    return Err(FormulaError::Parse("Empty variable reference".into()));
                }
                return Ok(Token::Reference(code.to_string()));
            }
            self.advance();
        }

        Err(FormulaError::Parse(format!(
            "Unterminated variable reference '[{}'",
            &self.input[start..]
        )))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    /// Function names, including dotted ones such as `Math.ceil`
    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        Token::Identifier(self.input[start..self.pos].to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// Formula parser over a checked token stream
struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl FormulaParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == Some(expected) {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    // Every nested sub-expression passes through here
    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FormulaError::TooComplex(format!(
                "nesting exceeds the {}-level limit",
                MAX_NESTING_DEPTH
            )));
        }

        self.depth += 1;
        let expr = self.parse_signed();
        self.depth -= 1;
        expr
    }

    fn parse_signed(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token() {
            Some(Token::Minus) => {
                self.consume();
                let operand = self.parse_unary()?;
                Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            // Prefix plus (no-op)
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(FormulaExpr::Number(n)),

            Some(Token::Reference(code)) => Ok(FormulaExpr::Reference(code)),

            Some(Token::LeftParen) => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Some(Token::Identifier(name)) => {
                if self.current_token() == Some(&Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Err(FormulaError::Parse(format!("Unknown name '{}'", name)))
                }
            }

            Some(token) => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),

            None => Err(FormulaError::Parse("Unexpected end of expression".into())),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if self.current_token() != Some(&Token::RightParen) {
            args.push(self.parse_expression()?);

            while self.current_token() == Some(&Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }
}
