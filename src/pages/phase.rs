use super::comments::CommentsPanel;
use super::{module_href, report_error, PhaseRouteParams};
use crate::api::PhaseStore;
use crate::autosave::{
    AutosaveConfig, AutosaveController, BrowserRuntime, SaveEvent, SaveStatus, StoreError,
};
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, PageLoading, Textarea};
use crate::drafts::{get_phase_body_override, mark_phase_draft_synced, touch_phase_draft};
use crate::state::AppContext;
use crate::util::text_stats;
use icons::ArrowLeft;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::{use_navigate, use_params};

type PhaseAutosave = AutosaveController<PhaseStore, BrowserRuntime>;
type ControllerSlot = StoredValue<Option<PhaseAutosave>, LocalStorage>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Loading,
    Editor,
    Denied,
    Unavailable,
}

/// Flush pending edits (without waiting) and stop the controller's timers.
/// A save acknowledged after this point still settles the local journal.
fn release(slot: ControllerSlot) {
    let Some(Some(c)) = slot.try_get_value() else {
        return;
    };
    let _ = slot.try_set_value(None);
    let phase_id = c.document_id().to_string();
    let _ = c.detach(move |text| mark_phase_draft_synced(&phase_id, text));
}

fn status_class(status: SaveStatus) -> &'static str {
    match status {
        SaveStatus::Idle => "text-muted-foreground",
        SaveStatus::Saving => "text-muted-foreground animate-pulse",
        SaveStatus::Saved => "text-emerald-600",
        SaveStatus::Error => "text-destructive",
    }
}

#[component]
pub fn PhaseEditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<PhaseRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let project_id = move || params.get().ok().and_then(|p| p.project_id).unwrap_or_default();
    let module_id = move || params.get().ok().and_then(|p| p.module_id).unwrap_or_default();
    let phase_id = move || params.get().ok().and_then(|p| p.phase_id).unwrap_or_default();

    let controller: ControllerSlot = StoredValue::new_local(None);

    let access: RwSignal<Access> = RwSignal::new(Access::Loading);
    let title: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<Option<String>> = RwSignal::new(None);
    let body: RwSignal<String> = RwSignal::new(String::new());
    let status: RwSignal<SaveStatus> = RwSignal::new(SaveStatus::Idle);
    let save_error: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let is_owner: RwSignal<bool> = RwSignal::new(false);
    let request_id: RwSignal<u64> = RwSignal::new(0);

    Effect::new(move |_| {
        let pid = project_id();
        let mid = module_id();
        let id = phase_id();
        if id.trim().is_empty() {
            return;
        }

        // Switching phases inside the same route: finish with the old one first.
        release(controller);

        let rid = request_id.get_untracked().saturating_add(1);
        request_id.set(rid);
        access.set(Access::Loading);
        error.set(None);
        save_error.set(None);
        status.set(SaveStatus::Idle);

        let api_client = app_state.0.api_client.get_untracked();
        let Some(user_id) = api_client.user_id().map(str::to_string) else {
            return;
        };
        let is_current = move || request_id.try_get_untracked() == Some(rid);

        spawn_local(async move {
            let opened = PhaseAutosave::open(
                &id,
                PhaseStore::new(api_client.clone()),
                BrowserRuntime,
                AutosaveConfig::default(),
                |doc| get_phase_body_override(&doc.id, &doc.body),
            )
            .await;
            if !is_current() {
                return;
            }

            let (ctrl, doc) = match opened {
                Ok(v) => v,
                Err(StoreError::NotFound) => {
                    tracing::warn!(phase_id = %id, "phase not found");
                    let href = module_href(&pid, &mid);
                    navigate.with_value(|nav| nav(&href, Default::default()));
                    return;
                }
                Err(StoreError::AuthorizationDenied) => {
                    access.set(Access::Denied);
                    return;
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                    access.set(Access::Unavailable);
                    return;
                }
            };

            let owner = match api_client.get_project(&pid).await {
                Ok(p) => p.owner_id == user_id,
                Err(e) => {
                    report_error(app_state.0, e, error);
                    false
                }
            };
            if !is_current() {
                ctrl.dispose();
                return;
            }

            title.set(doc.title.clone());
            description.set(doc.description.clone());
            is_owner.set(owner);

            let can_edit = owner || doc.assigned_to.as_deref() == Some(user_id.as_str());
            if !can_edit {
                tracing::info!(phase_id = %id, "phase is read-only for this writer");
                ctrl.dispose();
                access.set(Access::Denied);
                return;
            }

            let journal_id = id.clone();
            ctrl.set_listener(move |event| match event {
                SaveEvent::Status(s) => status.set(*s),
                SaveEvent::Saved(text) => {
                    mark_phase_draft_synced(&journal_id, text);
                    save_error.set(None);
                }
                SaveEvent::Failed(e) => save_error.set(Some(e.to_string())),
            });

            body.set(ctrl.body());
            // A restored local draft is pushed through the normal debounce.
            if ctrl.is_dirty() {
                ctrl.on_text_change(ctrl.body());
            }
            controller.set_value(Some(ctrl));
            access.set(Access::Editor);
        });
    });

    let on_text = Callback::new(move |text: String| {
        let Some(c) = controller.get_value() else {
            return;
        };
        touch_phase_draft(c.document_id(), &text);
        c.on_text_change(text);
    });

    let manual_save = move || {
        if let Some(c) = controller.get_value() {
            let _ = c.manual_save();
        }
    };

    let key_handle = window_event_listener(ev::keydown, move |e: web_sys::KeyboardEvent| {
        if !(e.ctrl_key() || e.meta_key()) || !e.key().eq_ignore_ascii_case("s") {
            return;
        }
        e.prevent_default();
        manual_save();
    });

    let unload_handle = window_event_listener(ev::beforeunload, move |e: web_sys::BeforeUnloadEvent| {
        let Some(Some(c)) = controller.try_get_value() else {
            return;
        };
        if c.is_dirty() {
            let _ = c.leave();
            e.prevent_default();
        }
    });

    on_cleanup(move || {
        key_handle.remove();
        unload_handle.remove();
        release(controller);
    });

    let on_back = move |_| {
        if let Some(c) = controller.get_value() {
            let _ = c.leave();
        }
        let href = module_href(&project_id(), &module_id());
        navigate.with_value(|nav| nav(&href, Default::default()));
    };

    let stats = move || text_stats(&body.get());
    let dirty = move || {
        body.track();
        status.track();
        controller
            .try_get_value()
            .flatten()
            .is_some_and(|c| c.is_dirty())
    };

    let editor = move || {
        view! {
            <div class="flex flex-col gap-4">
                <div class="flex items-start justify-between gap-4">
                    <div>
                        <h1 class="text-xl font-semibold">{move || title.get()}</h1>
                        <p class="text-sm text-muted-foreground">{move || description.get().unwrap_or_default()}</p>
                    </div>
                    <div class="flex items-center gap-3">
                        <span
                            class=move || format!("text-xs {}", status_class(status.get()))
                            data-status=move || status.get().to_string()
                            title=move || save_error.get().unwrap_or_default()
                        >
                            {move || status.get().label()}
                        </span>
                        <Show when=move || dirty() && status.get() == SaveStatus::Idle fallback=|| ().into_view()>
                            <span class="text-xs text-muted-foreground">"Unsaved changes"</span>
                        </Show>
                        <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=move |_| manual_save()>
                            "Save"
                        </Button>
                    </div>
                </div>

                <Textarea
                    class="min-h-[60vh] font-serif text-base leading-relaxed"
                    placeholder="Start writing..."
                    rows=24
                    bind_value=body
                    on_text=on_text
                />

                <div class="flex gap-4 text-xs text-muted-foreground">
                    <span>{move || format!("{} words", stats().words)}</span>
                    <span>{move || format!("{} characters", stats().chars)}</span>
                </div>

                <CommentsPanel
                    phase_id=Signal::derive(phase_id)
                    is_project_owner=is_owner
                />
            </div>
        }
    };

    view! {
        <div class="flex flex-col gap-4">
            <button
                class="inline-flex w-fit items-center gap-1 text-xs text-muted-foreground hover:cursor-pointer hover:text-foreground"
                on:click=on_back
            >
                <ArrowLeft class="size-3" />
                "Back to module"
            </button>

            {move || match access.get() {
                Access::Loading => view! { <PageLoading /> }.into_any(),
                Access::Editor => editor().into_any(),
                Access::Unavailable => view! { <ErrorAlert message=error /> }.into_any(),
                Access::Denied => {
                    let href = module_href(&project_id(), &module_id());
                    view! {
                        <div class="flex flex-col items-center gap-2 rounded-md border px-4 py-12 text-center">
                            <h1 class="text-lg font-semibold">"Access Denied"</h1>
                            <p class="text-sm text-muted-foreground">
                                "Only the project owner and the assigned writer can edit this phase."
                            </p>
                            <a href=href class="text-sm text-primary underline underline-offset-4">"Back to module"</a>
                        </div>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}
