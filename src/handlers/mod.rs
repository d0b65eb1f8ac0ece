//! HTTP and websocket handlers

pub mod calibrate;
pub mod detect;
pub mod feedback;
pub mod health;
pub mod sessions;
pub mod stream;
