//! HTTP transport: request/response shapes, handlers, and the process boot
//! sequence.

pub mod error;
pub mod handlers;
pub mod models;
mod server;
pub mod state;

pub use server::{build_router, run};
