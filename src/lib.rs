//! Front end for a small, embeddable scripting language whose grammar
//! can be extended at run time.
//!
//! Text flows through a [`scanner`] and [`lexer`] into a bounded
//! [`token_iter::TokenIterator`], and from there into a scope-aware
//! [`parser`] that builds an [`ast`]. Hosts add syntax by registering
//! [`registry::Plugin`]s whose grammars are written in a one-line
//! pattern language ([`grammar`]).
//!
//! # Quick start
//!
//! ## Parse a script
//!
//! ```
//! use fscript::{format, parse_str};
//!
//! let program = parse_str("var x = 2 + 3 * 4\nif x > 10 { x = 10 }").unwrap();
//! assert_eq!(program.statements.len(), 2);
//! assert!(format(&program).starts_with("var x = (2 + (3 * 4))"));
//! ```
//!
//! ## Add host functions and plugins
//!
//! ```
//! use fscript::{Frontend, ParserConfig, scope::FunctionMeta, std_plugins};
//!
//! let mut frontend = Frontend::new(ParserConfig::new().file("report.fs"));
//! frontend.define_module("math");
//! frontend.define_function(FunctionMeta::new("notify", &["who"]));
//! std_plugins::register_defaults(&mut frontend).unwrap();
//!
//! let program = frontend
//!     .parse("when = june 5\nif math.max(1, 2) is 2 then notify \"me\"")
//!     .unwrap();
//! assert_eq!(program.statements.len(), 2);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod formatter;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod scope;
pub mod std_plugins;
pub mod token;
pub mod token_iter;
pub mod value;

pub use ast::{Expr, ExprKind, Program};
pub use config::{Limits, ParserConfig};
pub use error::{ErrorCategory, ErrorKind, ScriptError};
pub use formatter::format;
pub use lexer::{LexPlugin, LexRules, tokenize};
pub use parser::{Frontend, Parser, parse_str};
pub use registry::{Grammar, Plugin, PluginKind, PluginMatch, Registry, StartToken};
pub use token::{Span, Token, TokenData, TokenKind};
pub use value::Value;
