//! Tokenizer and command-line parser.

pub mod word_lexer;
pub mod redirection;
pub mod command;

pub use word_lexer::tokenize;
pub use command::{parse_pipeline, split_chain, ChainLink, ChainOp};
pub use redirection::extract_redirections;
