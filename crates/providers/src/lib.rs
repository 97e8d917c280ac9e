//! Model provider implementations for Cipher.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
