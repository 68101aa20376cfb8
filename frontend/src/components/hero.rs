//! Hero section component

use leptos::*;

#[component]
pub fn Hero() -> impl IntoView {
    view! {
        <div class="hero">
            <div class="hero-body">
                <div class="container">
                    <h1 class="title">"Nothing here yet"</h1>
                    <h2 class="subtitle"></h2>
                </div>
            </div>
        </div>
    }
}
