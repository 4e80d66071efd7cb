use std::io::Write;

use crate::lang::error::Result;
use crate::lang::eval::Eval;
use crate::lang::parse::parse;

pub struct Runtime<'a> {
    eval: Eval<'a>,
}

impl<'a> Runtime<'a> {
    /// Create a new `Runtime` instance
    ///
    /// `sink` is where program output should be written, eg. result of
    /// `print` statements
    pub fn new(sink: &'a mut dyn Write) -> Self {
        Self {
            eval: Eval::new(sink),
        }
    }

    /// Lex, parse, and execute one fragment of source text
    ///
    /// Variable bindings persist across fragments. Any error aborts the
    /// whole fragment; nothing is retried and the runtime stays usable for
    /// the next fragment.
    pub fn run(&mut self, fragment: &str) -> Result<()> {
        let stmts = parse(fragment)?;
        self.eval.exec(&stmts)
    }
}
