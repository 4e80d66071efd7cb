pub mod value;

use std::io::Write;

use crate::lang::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::lang::error::{Error, Result};
use crate::lang::eval::value::Value;
use crate::lang::variables::Variables;

pub struct Eval<'a> {
    sink: &'a mut dyn Write,
    variables: Variables,
}

impl<'a> Eval<'a> {
    /// Create a new `Eval` instance
    ///
    /// `sink` is where program output is written, eg. result of `print`
    /// statements. Variable bindings live as long as the instance.
    pub fn new(sink: &'a mut dyn Write) -> Self {
        Self {
            sink,
            variables: Variables::new(),
        }
    }

    /// Run `statements` in order
    ///
    /// Output and variable mutation are the only observable results. The
    /// first error aborts the rest of the list.
    pub fn exec(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.exec_statement(stmt)?;
        }

        Ok(())
    }

    fn exec_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            Stmt::Assign(name, expr) => {
                let value = self.eval_expr(expr)?;
                self.variables.assign(name, value);
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.eval_expr(expr)?;
                writeln!(self.sink, "{}", value)?;
                Ok(())
            }
            Stmt::If(condition, then_branch, else_branch) => {
                match self.eval_expr(condition)? {
                    Value::Boolean(true) => self.exec_statement(then_branch),
                    Value::Boolean(false) => match else_branch {
                        Some(stmt) => self.exec_statement(stmt),
                        None => Ok(()),
                    },
                    value => Err(Error::Type(format!(
                        "if condition must be a boolean, got {} ({})",
                        value,
                        value.type_name()
                    ))),
                }
            }
            Stmt::While(condition, body) => {
                // Runs only while the condition is exactly boolean true; any
                // other value terminates the loop without error
                while let Value::Boolean(true) = self.eval_expr(condition)? {
                    self.exec_statement(body)?;
                }
                Ok(())
            }
            Stmt::Block(statements) => {
                self.variables.push_scope();
                let res = statements
                    .iter()
                    .try_for_each(|stmt| self.exec_statement(stmt));
                // Pop on the error path too: the store outlives the fragment,
                // so an aborted block must not leave its scope behind
                self.variables.pop_scope();
                res
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Undefined(name.clone())),
            Expr::Unary(op, operand) => self.eval_unary(*op, operand),
            Expr::Binary(left, op, right) => self.eval_binary(left, *op, right),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value> {
        let value = self.eval_expr(operand)?;

        match (op, &value) {
            (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            _ => Err(Error::Type(format!(
                "invalid operand for unary '{}': {} ({})",
                op,
                value,
                value.type_name()
            ))),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<Value> {
        // Both sides always evaluate; `&&` and `||` do not short-circuit
        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;

        if let (Value::Number(a), Value::Number(b)) = (&lhs, &rhs) {
            match op {
                BinaryOp::Add => return Ok(Value::Number(a + b)),
                BinaryOp::Sub => return Ok(Value::Number(a - b)),
                BinaryOp::Mul => return Ok(Value::Number(a * b)),
                BinaryOp::Div => {
                    if *b == 0.0 {
                        return Err(Error::DivisionByZero);
                    }
                    return Ok(Value::Number(a / b));
                }
                BinaryOp::Mod => return Ok(Value::Number(a % b)),
                BinaryOp::Eq => return Ok(Value::Boolean(a == b)),
                BinaryOp::Ne => return Ok(Value::Boolean(a != b)),
                BinaryOp::Lt => return Ok(Value::Boolean(a < b)),
                BinaryOp::Le => return Ok(Value::Boolean(a <= b)),
                BinaryOp::Gt => return Ok(Value::Boolean(a > b)),
                BinaryOp::Ge => return Ok(Value::Boolean(a >= b)),
                // Logical operators are not defined on numbers
                BinaryOp::And | BinaryOp::Or => (),
            }
        } else if let (Value::Boolean(a), Value::Boolean(b)) = (&lhs, &rhs) {
            match op {
                BinaryOp::And => return Ok(Value::Boolean(*a && *b)),
                BinaryOp::Or => return Ok(Value::Boolean(*a || *b)),
                BinaryOp::Eq => return Ok(Value::Boolean(a == b)),
                BinaryOp::Ne => return Ok(Value::Boolean(a != b)),
                _ => (),
            }
        } else if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
            // The non-string side is coerced to its textual representation
            if op == BinaryOp::Add {
                return Ok(Value::String(format!("{}{}", lhs, rhs)));
            }
        }

        Err(Error::Type(format!(
            "type mismatch in binary expression: {} ({}) {} {} ({})",
            lhs,
            lhs.type_name(),
            op,
            rhs,
            rhs.type_name()
        )))
    }
}

#[cfg(test)]
use crate::lang::runtime::Runtime;

#[test]
fn test_expression() {
    let tests = vec![
        ("print 1 + 2 * 3;", "7\n"),
        ("print (1 + 2) * 3;", "9\n"),
        ("print 10 - 3 - 2;", "5\n"),
        ("print 7 / 2;", "3.5\n"),
        ("print 10 % 3;", "1\n"),
        ("print -8;", "-8\n"),
        ("print --8;", "8\n"),
        ("print !true;", "false\n"),
        ("print !!true;", "true\n"),
        ("print 1 < 3;", "true\n"),
        ("print 3 <= 3;", "true\n"),
        ("print 3 > 3;", "false\n"),
        ("print 3 >= 3;", "true\n"),
        ("print 1 == 1;", "true\n"),
        ("print 1 != 1;", "false\n"),
        ("print 1 < 2 == true;", "true\n"),
        ("print true == false;", "false\n"),
        ("print true != false;", "true\n"),
        ("print \"x=\" + 5;", "x=5\n"),
        ("print 5 + \"=x\";", "5=x\n"),
        ("print \"a\" + \"b\" + true;", "abtrue\n"),
        ("print \"\" + 1.25;", "1.25\n"),
    ];

    for (input, expected) in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output);
        match runtime.run(input) {
            Ok(_) => (),
            Err(e) => assert!(false, "{:?} failed: {}", input, e),
        };
        assert_eq!(
            String::from_utf8(output).expect("Output not utf-8"),
            expected,
            "for input {:?}",
            input
        );
    }
}

#[test]
fn test_if() {
    let tests = vec![
        (r#"x = 3; if (x == 3) { print "yep"; }"#, "yep\n"),
        (
            r#"x = 3; if (x != 3) { print "then"; } else { print "else"; }"#,
            "else\n",
        ),
        (
            r#"x = 3; if (x != 3) print "a"; else { print "b"; if (x == 3) { x = 4; } } print x;"#,
            "b\n4\n",
        ),
        (r#"if (false) print "nope";"#, ""),
    ];

    for (input, expected) in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output);
        match runtime.run(input) {
            Ok(_) => (),
            _ => assert!(false),
        };
        assert_eq!(
            String::from_utf8(output).expect("Output not utf-8"),
            expected
        );
    }
}

#[test]
fn test_loop() {
    let tests = vec![
        ("x = 0; while (x < 5) { x = x + 1; } print x;", "5\n"),
        (
            "i = 0; total = 0; while (i < 4) { total = total + i; i = i + 1; } print total;",
            "6\n",
        ),
        // A non-boolean condition terminates the loop without error
        ("x = 0; while (1) { x = 1; } print x;", "0\n"),
    ];

    for (input, expected) in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output);
        match runtime.run(input) {
            Ok(_) => (),
            _ => assert!(false),
        };
        assert_eq!(
            String::from_utf8(output).expect("Output not utf-8"),
            expected
        );
    }
}

#[test]
fn test_scoping() {
    // Assigning an already-bound name from an inner scope mutates the outer
    // binding instead of shadowing it
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("x = 1; { x = 2; } print x;") {
        Ok(_) => (),
        _ => assert!(false),
    };
    assert_eq!(String::from_utf8(output).expect("Output not utf-8"), "2\n");

    // A first assignment inside a block is dropped at scope exit
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("{ y = 9; } print y;") {
        Err(Error::Undefined(name)) => assert_eq!(name, "y"),
        _ => assert!(false),
    };
}

#[test]
fn test_while_false_leaves_variable_undefined() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("while (false) x = 1;") {
        Ok(_) => (),
        _ => assert!(false),
    };
    match runtime.run("print x;") {
        Err(Error::Undefined(name)) => assert_eq!(name, "x"),
        _ => assert!(false),
    };
}

#[test]
fn test_division_by_zero() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("print 1 / 0;") {
        Err(Error::DivisionByZero) => (),
        _ => assert!(false),
    };

    // Never infinity or NaN, and `%` is unaffected
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("x = 0; y = 10 / x;") {
        Err(Error::DivisionByZero) => (),
        _ => assert!(false),
    };
}

#[test]
fn test_type_errors() {
    let tests = vec![
        "if (5) print 1;",
        "print !5;",
        "print -true;",
        "print true + 1;",
        "print \"a\" == \"a\";",
        "print \"a\" - \"b\";",
    ];

    for input in tests {
        let mut output = Vec::new();
        let mut runtime = Runtime::new(&mut output);
        match runtime.run(input) {
            Err(Error::Type(_)) => (),
            other => assert!(false, "{:?} should be a type error, got {:?}", input, other),
        };
        assert!(output.is_empty());
    }
}

#[test]
fn test_undefined_variable() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("print nope;") {
        Err(Error::Undefined(name)) => assert_eq!(name, "nope"),
        _ => assert!(false),
    };
}

#[test]
fn test_bindings_persist_across_fragments() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("x = 20;") {
        Ok(_) => (),
        _ => assert!(false),
    };
    match runtime.run("x = x + 1; print x;") {
        Ok(_) => (),
        _ => assert!(false),
    };
    assert_eq!(String::from_utf8(output).expect("Output not utf-8"), "21\n");
}

#[test]
fn test_error_inside_block_keeps_session_usable() {
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&mut output);
    match runtime.run("{ a = 1; print nope; }") {
        Err(Error::Undefined(_)) => (),
        _ => assert!(false),
    };

    // The aborted block's scope was popped; the next fragment runs in the
    // global scope as usual
    match runtime.run("b = 5; { b = b * 2; } print b;") {
        Ok(_) => (),
        _ => assert!(false),
    };
    assert_eq!(String::from_utf8(output).expect("Output not utf-8"), "10\n");
}

#[test]
fn test_logical_operators_on_built_trees() {
    // `&&`/`||` have no grammar production; their semantics are only
    // reachable through directly built trees. Both sides always evaluate.
    let lit = |b| Expr::Literal(Value::Boolean(b));

    let stmts = vec![
        Stmt::Print(Expr::Binary(
            Box::new(lit(true)),
            BinaryOp::And,
            Box::new(lit(false)),
        )),
        Stmt::Print(Expr::Binary(
            Box::new(lit(false)),
            BinaryOp::Or,
            Box::new(lit(true)),
        )),
    ];

    let mut output = Vec::new();
    let mut eval = Eval::new(&mut output);
    match eval.exec(&stmts) {
        Ok(_) => (),
        _ => assert!(false),
    };
    assert_eq!(
        String::from_utf8(output).expect("Output not utf-8"),
        "false\ntrue\n"
    );

    // Numbers do not take logical operators
    let mut output = Vec::new();
    let mut eval = Eval::new(&mut output);
    let stmts = vec![Stmt::Expression(Expr::Binary(
        Box::new(Expr::Literal(Value::Number(1.0))),
        BinaryOp::And,
        Box::new(Expr::Literal(Value::Number(2.0))),
    ))];
    match eval.exec(&stmts) {
        Err(Error::Type(_)) => (),
        _ => assert!(false),
    };
}

#[test]
fn test_null_in_binary_expression() {
    let mut output = Vec::new();
    let mut eval = Eval::new(&mut output);

    // Null only combines with strings, via concatenation
    let stmts = vec![Stmt::Print(Expr::Binary(
        Box::new(Expr::Literal(Value::String("v=".to_string()))),
        BinaryOp::Add,
        Box::new(Expr::Literal(Value::Null)),
    ))];
    match eval.exec(&stmts) {
        Ok(_) => (),
        _ => assert!(false),
    };
    assert_eq!(
        String::from_utf8(output).expect("Output not utf-8"),
        "v=null\n"
    );

    let mut output = Vec::new();
    let mut eval = Eval::new(&mut output);
    let stmts = vec![Stmt::Expression(Expr::Binary(
        Box::new(Expr::Literal(Value::Null)),
        BinaryOp::Eq,
        Box::new(Expr::Literal(Value::Null)),
    ))];
    match eval.exec(&stmts) {
        Err(Error::Type(_)) => (),
        _ => assert!(false),
    };
}
