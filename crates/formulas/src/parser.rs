//! Formula parser module

use crate::ast::{BinaryOperator, FormulaAst, FormulaExpr, UnaryOperator};
use crate::FormulaError;
use cellgrid_primitives::Position;

/// Nesting limit for parentheses and unary chains.
const MAX_DEPTH: usize = 256;

/// Height limit for the finished tree. Operator chains are parsed in a loop,
/// so they are bounded here rather than by `MAX_DEPTH`.
const MAX_HEIGHT: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    CellRef(String),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, FormulaError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos: self.pos,
            });
        };

        let kind = match ch {
            '(' => self.simple(TokenKind::LParen),
            ')' => self.simple(TokenKind::RParen),
            '+' => self.simple(TokenKind::Plus),
            '-' => self.simple(TokenKind::Minus),
            '*' => self.simple(TokenKind::Star),
            '/' => self.simple(TokenKind::Slash),
            '.' | '0'..='9' => self.number_token()?,
            'A'..='Z' => self.cell_token()?,
            _ => {
                return Err(FormulaError::ParseError(format!(
                    "Unexpected character '{}' at {}",
                    ch, start
                )))
            }
        };

        Ok(Token { kind, pos: start })
    }

    fn simple(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn number_token(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => self.advance(),
                '.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.advance();
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    self.advance();
                    if !self.consume('+') {
                        self.consume('-');
                    }
                }
                _ => break,
            }
        }

        let text = self.slice(start, self.pos);
        let value: f64 = text
            .parse()
            .map_err(|_| FormulaError::ParseError(format!("Invalid number literal '{}'", text)))?;
        if !value.is_finite() {
            return Err(FormulaError::ParseError(format!(
                "Number literal out of range '{}'",
                text
            )));
        }
        Ok(TokenKind::Number(value))
    }

    /// `[A-Z]+[0-9]+`, followed by a token boundary.
    fn cell_token(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;
        while matches!(self.peek(), Some('A'..='Z')) {
            self.advance();
        }
        let letters_end = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        let text = self.slice(start, self.pos);
        if letters_end == self.pos || !is_boundary(self.peek()) {
            while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
                self.advance();
            }
            return Err(FormulaError::ParseError(format!(
                "Unexpected identifier '{}' at {}",
                self.slice(start, self.pos),
                start
            )));
        }
        Ok(TokenKind::CellRef(text.to_string()))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn byte_pos(&self, idx: usize) -> usize {
        self.chars
            .get(idx)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.input[self.byte_pos(start)..self.byte_pos(end)]
    }
}

fn is_boundary(ch: Option<char>) -> bool {
    match ch {
        None => true,
        Some(ch) => !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'),
    }
}

/// A parsed subtree with its height.
struct Node {
    expr: FormulaExpr,
    height: usize,
}

impl Node {
    fn leaf(expr: FormulaExpr) -> Self {
        Self { expr, height: 1 }
    }

    fn unary(op: UnaryOperator, operand: Node) -> Result<Self, FormulaError> {
        Ok(Self {
            height: checked_height(operand.height + 1)?,
            expr: FormulaExpr::UnaryOp {
                op,
                expr: Box::new(operand.expr),
            },
        })
    }

    fn binary(op: BinaryOperator, left: Node, right: Node) -> Result<Self, FormulaError> {
        Ok(Self {
            height: checked_height(left.height.max(right.height) + 1)?,
            expr: FormulaExpr::BinaryOp {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
            },
        })
    }
}

fn checked_height(height: usize) -> Result<usize, FormulaError> {
    if height > MAX_HEIGHT {
        return Err(FormulaError::ParseError(format!(
            "Formula has more than {} nested operations",
            MAX_HEIGHT
        )));
    }
    Ok(height)
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            idx: 0,
            depth: 0,
        }
    }

    fn parse_expression(&mut self) -> Result<Node, FormulaError> {
        self.parse_add_sub()
    }

    fn parse_add_sub(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_mul_div()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul_div()?;
            node = Node::binary(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_mul_div(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            node = Node::binary(op, node, right)?;
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, FormulaError> {
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Negate,
            _ => return self.parse_primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        Node::unary(op, operand?)
    }

    fn parse_primary(&mut self) -> Result<Node, FormulaError> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Number(value) => Ok(Node::leaf(FormulaExpr::Number(value))),
            TokenKind::CellRef(text) => Ok(Node::leaf(FormulaExpr::CellRef(Position::from_a1(
                &text,
            )))),
            TokenKind::LParen => {
                self.enter()?;
                let node = self.parse_expression();
                self.depth -= 1;
                let node = node?;
                self.expect(&TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Eof => Err(FormulaError::ParseError(
                "Unexpected end of input".to_string(),
            )),
            _ => Err(FormulaError::ParseError(format!(
                "Unexpected token at {}",
                token.pos
            ))),
        }
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::ParseError(format!(
                "Formula nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), FormulaError> {
        let token = self.advance();
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(kind) {
            Ok(())
        } else {
            Err(FormulaError::ParseError(format!(
                "Expected {:?}, got {:?}",
                kind, token.kind
            )))
        }
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.idx];
        if !matches!(token.kind, TokenKind::Eof) {
            self.idx += 1;
        }
        token
    }
}

/// Parse a formula body (the text after the formula sign) into an AST.
pub fn parse_formula(formula: &str) -> Result<FormulaAst, FormulaError> {
    if formula.trim().is_empty() {
        return Err(FormulaError::ParseError("Empty formula".to_string()));
    }

    let mut lexer = Lexer::new(formula);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    let mut parser = Parser::new(tokens);
    let node = parser.parse_expression()?;
    if !matches!(parser.peek_kind(), TokenKind::Eof) {
        return Err(FormulaError::ParseError(
            "Unexpected trailing input".to_string(),
        ));
    }
    Ok(FormulaAst::new(node.expr))
}
