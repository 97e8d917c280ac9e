//! Out-of-process tool transport for Cipher.
//!
//! The reasoning loop does not care where a tool runs. In-process tools
//! implement `Tool` directly; out-of-process tools sit behind a JSON-line
//! request/response protocol served by a [`host::ToolHost`] and are made
//! indistinguishable again on the client side by [`client::RemoteTool`].

pub mod client;
pub mod host;
pub mod protocol;

pub use client::{RemoteTool, ToolHostClient};
pub use host::ToolHost;
pub use protocol::{ToolHostRequest, ToolHostResponse};
