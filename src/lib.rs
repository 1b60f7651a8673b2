//! Semantics - media file routing
//!
//! Routes audio, video and document files to processing modules, either
//! compiled into this executable or installed beside it as separate
//! `semantics-<module>` executables.

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod modules;
pub mod registry;
pub mod routing;
