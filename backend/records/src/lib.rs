//! # Records
//!
//! Shared shapes between the directory service and its clients.
//!
//! ## Table
//! - One flat table, row 0 is the header and never data
//! - Six positional text cells per row, order fixed by [`COLUMNS`]
//! - Row order is insertion order
//!
//! ## Wire
//! - Every response is an [`Envelope`]: `{status, data?, message?}`
//! - Actions are selected by the `action` query parameter, see [`Action`]

pub mod certificate;
pub mod envelope;

pub use certificate::{COLUMNS, Certificate, Row, header_row, ids_match, long_date};
pub use envelope::{Action, Envelope, Status};
