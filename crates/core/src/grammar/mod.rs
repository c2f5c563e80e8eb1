/// JSON views of a label tree.
pub mod dump;
/// Label emitter: depth-first statement emission through a sink.
pub mod emit;
/// Label lexer: tokenizes raw text into a stream of borrowed tokens.
pub mod lexer;
/// Label parser: builds tree nodes from tokens.
pub mod parser;
/// Units expression parser.
pub mod units;
