//! Core library for the cfgfill command line application.
//!
//! cfgfill replaces `$NAME$` placeholders in a configuration template with
//! values read from a spreadsheet. Spreadsheet and file adapters live under
//! [`io`], the data representations inside [`model`], the token scanner in
//! [`substitute`], and the end-to-end entry points in [`workflow`].

pub mod error;
pub mod io;
pub mod model;
pub mod substitute;
pub mod workflow;

pub use error::{Result, ToolError};
pub use model::{Rendered, RunReport, UnresolvedToken, VariableMapping};
pub use substitute::substitute;
