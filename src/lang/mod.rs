//! The analyzed source language: syntax tree, lexer and recovery parser.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{
    Annotation, AssignOp, BinOp, Block, Comment, Expr, Interface, Method, MethodSignature,
    Modifiers, Param, SourceFile, Stmt, UnaryOp,
};
pub use parser::parse_source;
