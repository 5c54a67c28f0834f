//! Core trait abstractions.

pub mod source;
