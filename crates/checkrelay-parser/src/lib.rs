//! Line-oriented extraction of lint annotations from tool output.
//!
//! One generic engine ([`Regexer`]) drives every supported tool: a
//! line-matching regex plus an extraction function that turns the captures
//! into an [`Annotation`]. Lines that do not match are skipped silently;
//! lines that match but fail extraction are logged and skipped; only a read
//! error on the underlying stream aborts a run.

mod engine;
mod generic;
mod golint;
mod mypy;

pub use engine::{ExtractError, ParseError, Parser, Regexer};
pub use generic::{generic_extractor, GenericSpec};
pub use golint::golint;
pub use mypy::mypy;
