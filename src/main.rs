// src/main.rs

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    procgen_demo::run().await;
}

// The wasm entry point is `run`, started by wasm-bindgen.
#[cfg(target_arch = "wasm32")]
fn main() {}
