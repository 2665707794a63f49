//! HueTalk Library
//!
//! Voice-command front-end for Hue lighting bridges: discovery,
//! registration, name resolution and command dispatch.

pub mod audit;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod dialog;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod session;
pub mod tts;
pub mod utils;
pub mod vocabulary;
