//! Guidepost — hospital guidance-packet print service.
//!
//! Server side: compose a patient guidance document, render it to a fixed
//! A4 PDF, hand it to the OS print spooler, reclaim the temp file on every
//! exit path. Kiosk side: probe the server and fall back to the host's
//! native print dialog when it is unreachable.

pub mod api;
pub mod client;
pub mod compose;
pub mod config;
pub mod departments;
pub mod dispatch;
pub mod packet;
pub mod pipeline;
pub mod render;
