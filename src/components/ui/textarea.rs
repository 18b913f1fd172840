use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Multi-line text field. `on_text` fires with the full value on every input
/// event, after `bind_value` has been updated.
#[component]
pub fn Textarea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(default = 3)] rows: u32,
    #[prop(into, optional)] readonly: Signal<bool>,
    #[prop(into)] bind_value: RwSignal<String>,
    #[prop(into, optional)] on_text: Option<Callback<String>>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "placeholder:text-muted-foreground border-input w-full rounded-md border bg-transparent px-3 py-2 text-sm shadow-xs outline-none resize-y focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2 read-only:bg-muted",
        class
    );

    let on_input = move |ev: web_sys::Event| {
        let Some(area) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            return;
        };
        let value = area.value();
        bind_value.set(value.clone());
        if let Some(cb) = on_text {
            cb.run(value);
        }
    };

    view! {
        <textarea
            data-name="Textarea"
            class=merged_class
            placeholder=placeholder
            id=id
            rows=rows
            readonly=move || readonly.get()
            prop:value=move || bind_value.get()
            on:input=on_input
        />
    }
}
