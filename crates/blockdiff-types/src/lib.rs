//! Foundation types for blockdiff.
//!
//! This crate provides the identity and signature types shared by the
//! workspace model, the diff engine, and the CLI.
//!
//! # Key Types
//!
//! - [`BlockId`] -- Block identifier as found in the interchange format
//! - [`Signature`] -- Canonical (position and identity free) block text plus its BLAKE3 digest
//! - [`InputKind`] -- Value / statement / dummy input slots
//! - [`Colour`] -- Hex colour attached to a block for rendering

pub mod colour;
pub mod error;
pub mod id;
pub mod input;
pub mod signature;

pub use colour::Colour;
pub use error::TypeError;
pub use id::BlockId;
pub use input::InputKind;
pub use signature::Signature;
