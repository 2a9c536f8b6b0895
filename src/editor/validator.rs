//! Multiline continuation: the editor needs to know when a buffer is a
//! complete command vs. still open, e.g. an unterminated quote.
//!
//! Delegates to the tokenizer's own quote/paren balancing: a buffer the
//! tokenizer rejects is treated as incomplete rather than a hard error, so
//! the user can keep typing across a line break before the real parse runs.

use reedline::{ValidationResult, Validator};

pub struct KrustyValidator;

impl Validator for KrustyValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match crate::parser::word_lexer::tokenize(line) {
            Ok(_) => ValidationResult::Complete,
            Err(_) => ValidationResult::Incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_quote_is_incomplete() {
        assert_eq!(KrustyValidator.validate("echo \"unterminated"), ValidationResult::Incomplete);
    }

    #[test]
    fn balanced_line_is_complete() {
        assert_eq!(KrustyValidator.validate("echo hello"), ValidationResult::Complete);
    }
}
