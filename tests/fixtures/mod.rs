//! Test fixtures

mod loopback_server;

pub use loopback_server::{LoopbackServer, ServerReport, ServerScript};
