use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Helper, Highlighter, Hinter, Result};

/// Helper that extends editor
///
/// Currently only implements `Validator` trait to keep accumulating lines
/// until the pending fragment ends in a statement delimiter.
#[derive(Completer, Helper, Highlighter, Hinter)]
pub struct ReplHelper {}

impl ReplHelper {
    pub fn new() -> Self {
        ReplHelper {}
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        if fragment_complete(ctx.input()) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

/// A fragment is complete once its trimmed text ends in `;` or `}`
///
/// Empty input also counts as complete so a bare Enter just reprompts.
pub fn fragment_complete(input: &str) -> bool {
    let trimmed = input.trim_end();
    trimmed.is_empty() || trimmed.ends_with(';') || trimmed.ends_with('}')
}

#[test]
fn test_fragment_complete() {
    assert!(fragment_complete(""));
    assert!(fragment_complete("   \n"));
    assert!(fragment_complete("x = 1;"));
    assert!(fragment_complete("x = 1;   "));
    assert!(fragment_complete("{ x = 1; }"));
    assert!(fragment_complete("while (x < 3) {\n  x = x + 1;\n}"));
    assert!(!fragment_complete("x = 1"));
    assert!(!fragment_complete("while (x < 3) {"));
    assert!(!fragment_complete("print \"a\" +"));
}
