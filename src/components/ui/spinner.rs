use icons::LoaderCircle;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <LoaderCircle class=merged_class attr:role="status" attr:aria-label="Loading" /> }
}

/// Full-width loading row used while a page fetches its data.
#[component]
pub fn PageLoading(#[prop(default = "Loading...")] label: &'static str) -> impl IntoView {
    view! {
        <div class="flex items-center gap-2 px-4 py-8 text-xs text-muted-foreground">
            <Spinner />
            {label}
        </div>
    }
}
