//! Placeholder content below the hero

use leptos::*;

#[component]
pub fn Placeholder() -> impl IntoView {
    view! {
        <div class="container">"TODO"</div>
    }
}
