//! Wire dialects
//!
//! Types for the two supported client/provider dialects and the translation
//! between them.

pub mod anthropic;
pub mod openai;
pub mod translate;
