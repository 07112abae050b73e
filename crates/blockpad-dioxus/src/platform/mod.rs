//! Platform-specific functionality
//!
//! In the browser the engine drives the real DOM through `web-sys` and
//! deferred focus waits on `requestAnimationFrame`. Elsewhere (tests,
//! server-side rendering) the engine's headless surface stands in and
//! frames run immediately.

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod web;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use web::{WebDom as AppDom, mount_blocks, request_frame};

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub type AppDom = blockpad_engine::surface::headless::HeadlessDom;

/// Build the headless copy of the document the engine queries.
#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub fn mount_blocks(dom: &AppDom, records: &[blockpad_engine::BlockRecord]) {
    dom.render(records);
}

/// Without a browser there are no frames; run `callback` now.
#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub fn request_frame(callback: impl FnOnce() + 'static) {
    callback();
}
