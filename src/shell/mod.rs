mod executor;
mod parser;
mod shell;

pub use shell::Shell;
