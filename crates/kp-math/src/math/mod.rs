//! Core math modules.

pub mod moments;
pub mod sketch;
