//! Chat backend adapter.
//!
//! - [`frames`]: decoding of the streamed chat response
//! - [`client`]: the HTTP client implementing the application's chat ports
//! - [`dto`]: wire types and their conversion into domain entities

pub mod client;
pub mod dto;
pub mod error;
pub mod frames;

pub use client::{DEFAULT_TIMEOUT, HttpChatApi};
pub use error::BackendError;
pub use frames::{FrameDecoder, decode_deltas};
