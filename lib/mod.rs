pub mod balancer;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
