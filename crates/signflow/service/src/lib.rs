//! SignFlow REST surface.
//!
//! Thin HTTP layer over [`signflow_engine`]: handlers translate requests
//! into engine calls and engine errors into status codes. No workflow
//! decision lives here.

#![deny(unsafe_code)]

pub mod api;
pub mod error;

pub use api::rest::router::create_router;
pub use api::rest::state::AppState;
