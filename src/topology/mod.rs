//! Cell topology vocabulary.

pub mod cell_type;
