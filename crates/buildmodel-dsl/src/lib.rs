// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Gradle Groovy DSL parser and Concrete Syntax Tree library.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenize`] turns script text into tokens with byte
//!   spans, collecting diagnostics instead of failing.
//! - **Parsing**: [`parse_script`] builds a [`Script`] tree. Statements that
//!   cannot be parsed are kept as [`Statement::Unparsed`] so the rest of the
//!   script is still available.
//! - **Traversal**: the [`visitor`] module provides the [`Visitor`] trait and
//!   `walk_*` functions.
//!
//! # Quick Start
//!
//! ```
//! use buildmodel_dsl::{parse_script, Statement};
//!
//! let script = parse_script("android {\n    compileSdkVersion 24\n}\n");
//! assert!(script.errors.is_empty());
//! let Statement::Call(call) = &script.statements[0] else { panic!() };
//! assert_eq!(call.callee.name(), "android");
//! ```

pub mod error;
pub use error::DslError;

mod nodes;
pub use nodes::*;

mod parser;
pub use parser::parse_script;

pub mod tokenizer;
pub use tokenizer::{tokenize, Token, TokenKind};

/// Visitor infrastructure for tree traversal.
pub mod visitor;
pub use visitor::{VisitResult, Visitor};
