//! Completion provider client and streaming support

mod client;
mod sse;

pub use client::{OpenAiClient, OpenAiClientFactory};
pub(crate) use sse::SseDecoder;
