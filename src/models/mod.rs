//! Data models for the Inkpress publishing platform.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod blocks;
mod document;
mod form;
mod translation;

pub use blocks::*;
pub use document::*;
pub use form::*;
pub use translation::*;
