//! Diagnostic creation, severity management, and rendering for blockhdl.
//!
//! Every pipeline stage reports progress and failures as structured
//! [`Diagnostic`] values. Stages push them into a [`DiagnosticSink`], and the
//! command-line front end renders them with a [`DiagnosticRenderer`] such as
//! the human-oriented [`TerminalRenderer`] or the machine-readable
//! [`JsonRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use location::Location;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
