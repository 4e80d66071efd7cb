//! Recursive descent parser for the statement language.
//!
//! Statements are dispatched off the leading token; expressions use a fixed
//! precedence ladder where each binary level parses one operand at the next
//! level up and then left-folds while its own operators keep appearing:
//!
//!     equality   <- comparison (('==' | '!=') comparison)*
//!     comparison <- additive (('<' | '<=' | '>' | '>=') additive)*
//!     additive   <- multiplicative (('+' | '-') multiplicative)*
//!     multiplicative <- unary (('*' | '/' | '%') unary)*
//!     unary      <- ('!' | '-') unary | primary
//!     primary    <- number | string | 'true' | 'false' | identifier | '(' equality ')'
//!
//! `&&` and `||` lex as operators but have no production here; source text
//! containing them is rejected.

use crate::lang::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::lang::error::{Error, Result};
use crate::lang::eval::value::Value;
use crate::lang::lexer::tokenize;
use crate::lang::token::{Token, TokenKind};

/// Lex and parse one fragment into a statement list
///
/// The whole token sequence is consumed; any grammar mismatch rejects the
/// fragment with no recovery.
pub fn parse(input: &str) -> Result<Vec<Stmt>> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.eat_keyword("if") {
            return self.if_statement();
        }
        if self.eat_keyword("while") {
            return self.while_statement();
        }
        if self.eat_keyword("print") {
            return self.print_statement();
        }
        if self.check(TokenKind::Identifier) && self.check_next_symbol("=") {
            return self.assign_statement();
        }
        if self.eat_symbol("{") {
            let block = self.block()?;
            // A trailing `;` after the closing brace is allowed and discarded
            self.eat_symbol(";");
            return Ok(block);
        }

        self.expression_statement()
    }

    fn assign_statement(&mut self) -> Result<Stmt> {
        let name = self.advance().text; // identifier, checked by the caller
        self.expect_symbol("=")?;
        let value = self.expression()?;
        self.expect_symbol(";")?;

        Ok(Stmt::Assign(name, value))
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;
        self.expect_symbol(";")?;

        Ok(Stmt::Print(value))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.expect_symbol("(")?;
        let condition = self.expression()?;
        self.expect_symbol(")")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat_keyword("else") {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(condition, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.expect_symbol("(")?;
        let condition = self.expression()?;
        self.expect_symbol(")")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While(condition, body))
    }

    fn block(&mut self) -> Result<Stmt> {
        let mut statements = Vec::new();
        while !self.check_symbol("}") && !self.is_at_end() {
            statements.push(self.statement()?);
        }
        self.expect_symbol("}")?;

        Ok(Stmt::Block(statements))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.expect_symbol(";")?;

        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.equality()
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;
        while let Some(op) = self.eat_binary_op(&[("==", BinaryOp::Eq), ("!=", BinaryOp::Ne)]) {
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.additive()?;
        while let Some(op) = self.eat_binary_op(&[
            ("<", BinaryOp::Lt),
            ("<=", BinaryOp::Le),
            (">", BinaryOp::Gt),
            (">=", BinaryOp::Ge),
        ]) {
            let right = self.additive()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut expr = self.multiplicative()?;
        while let Some(op) = self.eat_binary_op(&[("+", BinaryOp::Add), ("-", BinaryOp::Sub)]) {
            let right = self.multiplicative()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        while let Some(op) = self.eat_binary_op(&[
            ("*", BinaryOp::Mul),
            ("/", BinaryOp::Div),
            ("%", BinaryOp::Mod),
        ]) {
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(right));
        }

        Ok(expr)
    }

    /// Unary is right-associative by self-recursion
    fn unary(&mut self) -> Result<Expr> {
        if self.eat_operator("!") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat_operator("-") {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.check(TokenKind::Number) {
            let token = self.advance();
            let number = token.text.parse::<f64>().map_err(|_| Error::Parse {
                token: token.clone(),
                message: "invalid number literal".to_string(),
            })?;
            return Ok(Expr::Literal(Value::Number(number)));
        }
        if self.check(TokenKind::String) {
            return Ok(Expr::Literal(Value::String(self.advance().text)));
        }
        if self.eat_keyword("true") {
            return Ok(Expr::Literal(Value::Boolean(true)));
        }
        if self.eat_keyword("false") {
            return Ok(Expr::Literal(Value::Boolean(false)));
        }
        if self.check(TokenKind::Identifier) {
            return Ok(Expr::Variable(self.advance().text));
        }
        if self.eat_symbol("(") {
            let expr = self.expression()?;
            self.expect_symbol(")")?;
            return Ok(expr);
        }

        Err(self.error("expected expression"))
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// The lexer guarantees a trailing `Eof` token, so there is always
    /// something to peek at
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_symbol(&self, text: &str) -> bool {
        self.check(TokenKind::Symbol) && self.peek().text == text
    }

    fn check_keyword(&self, text: &str) -> bool {
        self.check(TokenKind::Keyword) && self.peek().text == text
    }

    /// One token of lookahead, for telling `x = ...` apart from `x == ...`
    fn check_next_symbol(&self, text: &str) -> bool {
        match self.tokens.get(self.pos + 1) {
            Some(token) => token.kind == TokenKind::Symbol && token.text == text,
            None => false,
        }
    }

    fn eat_symbol(&mut self, text: &str) -> bool {
        if self.check_symbol(text) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_keyword(&mut self, text: &str) -> bool {
        if self.check_keyword(text) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_operator(&mut self, text: &str) -> bool {
        if self.check(TokenKind::Operator) && self.peek().text == text {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_binary_op(&mut self, ops: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        if self.check(TokenKind::Operator) {
            for (text, op) in ops {
                if self.peek().text == *text {
                    self.pos += 1;
                    return Some(*op);
                }
            }
        }

        None
    }

    fn expect_symbol(&mut self, text: &str) -> Result<()> {
        if self.eat_symbol(text) {
            return Ok(());
        }
        Err(self.error(&format!("expected '{}'", text)))
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            token: self.peek().clone(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
fn num(n: f64) -> Expr {
    Expr::Literal(Value::Number(n))
}

#[cfg(test)]
fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary(Box::new(left), op, Box::new(right))
}

#[test]
fn test_precedence() {
    let stmts = parse("1 + 2 * 3;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            num(1.0),
            BinaryOp::Add,
            binary(num(2.0), BinaryOp::Mul, num(3.0)),
        ))]
    );

    let stmts = parse("1 < 2 == true;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            binary(num(1.0), BinaryOp::Lt, num(2.0)),
            BinaryOp::Eq,
            Expr::Literal(Value::Boolean(true)),
        ))]
    );
}

#[test]
fn test_parens_override_precedence() {
    let stmts = parse("(1 + 2) * 3;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            binary(num(1.0), BinaryOp::Add, num(2.0)),
            BinaryOp::Mul,
            num(3.0),
        ))]
    );
}

#[test]
fn test_left_associativity() {
    let stmts = parse("10 - 3 - 2;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            binary(num(10.0), BinaryOp::Sub, num(3.0)),
            BinaryOp::Sub,
            num(2.0),
        ))]
    );
}

#[test]
fn test_unary_right_associativity() {
    let stmts = parse("!!true;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(Expr::Unary(
            UnaryOp::Not,
            Box::new(Expr::Unary(
                UnaryOp::Not,
                Box::new(Expr::Literal(Value::Boolean(true))),
            )),
        ))]
    );

    let stmts = parse("-x * 2;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            Expr::Unary(UnaryOp::Neg, Box::new(Expr::Variable("x".to_string()))),
            BinaryOp::Mul,
            num(2.0),
        ))]
    );
}

#[test]
fn test_statements() {
    let stmts = parse(r#"x = 1; print "go"; { x = 2; };"#).expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![
            Stmt::Assign("x".to_string(), num(1.0)),
            Stmt::Print(Expr::Literal(Value::String("go".to_string()))),
            Stmt::Block(vec![Stmt::Assign("x".to_string(), num(2.0))]),
        ]
    );
}

#[test]
fn test_if_else() {
    let stmts = parse("if (x == 1) print x; else { x = 2; }").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::If(
            binary(Expr::Variable("x".to_string()), BinaryOp::Eq, num(1.0)),
            Box::new(Stmt::Print(Expr::Variable("x".to_string()))),
            Some(Box::new(Stmt::Block(vec![Stmt::Assign(
                "x".to_string(),
                num(2.0),
            )]))),
        )]
    );
}

#[test]
fn test_while() {
    let stmts = parse("while (x < 3) x = x + 1;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::While(
            binary(Expr::Variable("x".to_string()), BinaryOp::Lt, num(3.0)),
            Box::new(Stmt::Assign(
                "x".to_string(),
                binary(Expr::Variable("x".to_string()), BinaryOp::Add, num(1.0)),
            )),
        )]
    );
}

#[test]
fn test_assignment_needs_lookahead() {
    // `x == 1;` must not be mistaken for an assignment
    let stmts = parse("x == 1;").expect("Failed to parse");
    assert_eq!(
        stmts,
        vec![Stmt::Expression(binary(
            Expr::Variable("x".to_string()),
            BinaryOp::Eq,
            num(1.0),
        ))]
    );
}

#[test]
fn test_parse_errors() {
    let tests = vec![
        ("x = ;", "expected expression"),
        ("1 + 2", "expected ';'"),
        ("{ x = 1;", "expected '}'"),
        ("if x == 1 print x;", "expected '('"),
        ("if (x == 1 print x;", "expected ')'"),
        ("print 1.2.3;", "invalid number literal"),
        // No grammar production for `&&` or `||`
        ("true && false;", "expected ';'"),
        ("x = 1 || 2;", "expected ';'"),
    ];

    for (input, expected) in tests {
        match parse(input) {
            Err(Error::Parse { message, .. }) => assert_eq!(message, expected),
            _ => assert!(false, "Expected parse error for {:?}", input),
        }
    }
}

#[test]
fn test_parse_error_carries_token() {
    match parse("print ;") {
        Err(Error::Parse { token, .. }) => {
            assert_eq!(token, Token::new(TokenKind::Symbol, ";"));
        }
        _ => assert!(false),
    }
}
