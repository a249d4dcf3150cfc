//! Best-effort diagnostics
//!
//! In the browser messages go to the devtools console. Native builds (unit
//! tests) cannot call into JS, so they go through `tracing` instead.

pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::info!("{}", message);
}

pub fn error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::error!("{}", message);
}
