//! ARIA Loader
//!
//! The loader/decoder boundary and the import composer that turns a root
//! locator into one merged [`RawDocument`](aria_core::RawDocument).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composer;
pub mod decoder;
pub mod loader;
mod merge;

pub use composer::{ComposeConfig, ImportComposer};
pub use decoder::{DecodeError, Decoder, JsonDecoder, YamlDecoder};
pub use loader::{FileLoader, LiteralLoader, LoadError, Loader};
