pub mod ast;
mod lexer;
mod parser;

pub use lexer::is_space;
pub use parser::parse;
