//! Liftsim - Frontend Rust/Leptos shell
//!
//! A static page mounted once into the host document. It makes no backend
//! connection.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  #app                               │
//! │  └── App                            │
//! │      ├── Hero ("Nothing here yet")  │
//! │      └── Placeholder ("TODO")       │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - Constants (mount point)
//! - [`types`] - Error types
//! - [`components`] - UI components

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// =============================================================================
// Module declarations
// =============================================================================

pub mod components;
pub mod config;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use components::*;
pub use config::*;
pub use types::{AppError, AppResult};

// =============================================================================
// Application Entry Point
// =============================================================================

/// Installs console logging and mounts the shell. Errors are logged.
#[wasm_bindgen]
pub fn run_app() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("Liftsim shell starting");

    if let Err(e) = mount_app() {
        log::error!("{}", e);
    }
}

/// Mounts [`App`] into the element with id [`MOUNT_POINT_ID`].
pub fn mount_app() -> AppResult<()> {
    let missing = || AppError::MountPoint(MOUNT_POINT_ID.to_string());

    let parent = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(MOUNT_POINT_ID))
        .ok_or_else(missing)?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| missing())?;

    if parent.child_element_count() > 0 {
        return Err(AppError::AlreadyMounted(MOUNT_POINT_ID.to_string()));
    }

    mount_to(parent, || view! { <App/> });
    Ok(())
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <div>
            <Hero/>
            <Placeholder/>
        </div>
    }
}
