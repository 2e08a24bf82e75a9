//! Writing of the decoded packet records to a file or stdout.
pub mod lib;
pub mod writer;
