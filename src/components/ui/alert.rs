use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-md border px-3 py-2 text-sm"}
    clx! {AlertDescription, p, "text-xs leading-relaxed"}
}

pub use components::*;

/// Inline error box shared by forms and pages.
#[component]
pub fn ErrorAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some() fallback=|| ().into_view()>
            <Alert class="border-destructive/30 bg-destructive/5">
                <AlertDescription class="text-destructive">
                    {move || message.get().unwrap_or_default()}
                </AlertDescription>
            </Alert>
        </Show>
    }
}
