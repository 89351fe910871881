#![forbid(unsafe_code)]

//! WASM runner for the navspy navigation highlight.
//!
//! This crate provides [`NavSpyRunner`], a `wasm-bindgen`-exported struct
//! that wraps `navspy_web::WebNavHost` and exposes it to JavaScript for
//! host-driven execution. The JS glue forwards observer batches, scroll
//! samples and clicks as JSON, steps the runner, and paints the active link
//! and underline from the returned state.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::NavSpyRunner;

// Runner core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod runner_core;
