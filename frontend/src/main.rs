//! Entry point for the WASM application

pub fn main() {
    liftsim_frontend::run_app();
}
