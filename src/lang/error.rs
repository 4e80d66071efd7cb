use thiserror::Error;

use crate::lang::token::Token;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a fragment can fail
///
/// Any of these aborts the current fragment without retry; the interactive
/// session itself keeps going.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(String),
    #[error("parse error at {token}: {message}")]
    Parse { token: Token, message: String },
    #[error("undefined variable: {0}")]
    Undefined(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
