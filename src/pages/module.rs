use super::{phase_href, project_href, report_error, ModuleRouteParams};
use crate::api::{non_empty, ApiError, NewPhase};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Label, PageLoading, Textarea,
};
use crate::drafts::discard_phase_draft;
use crate::models::{Module, Phase, Project, ProjectMember};
use crate::state::AppContext;
use icons::{ArrowLeft, Plus, X};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};
use wasm_bindgen::JsCast;

#[component]
pub fn ModulePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<ModuleRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let project_id = move || params.get().ok().and_then(|p| p.project_id).unwrap_or_default();
    let module_id = move || params.get().ok().and_then(|p| p.module_id).unwrap_or_default();

    let project: RwSignal<Option<Project>> = RwSignal::new(None);
    let module: RwSignal<Option<Module>> = RwSignal::new(None);
    let phases: RwSignal<Vec<Phase>> = RwSignal::new(vec![]);
    let members: RwSignal<Vec<ProjectMember>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let request_id: RwSignal<u64> = RwSignal::new(0);

    let is_owner = move || {
        let user = app_state.0.api_client.get().user_id().map(str::to_string);
        project.get().is_some_and(|p| Some(p.owner_id) == user)
    };

    Effect::new(move |_| {
        let pid = project_id();
        let mid = module_id();
        if pid.trim().is_empty() || mid.trim().is_empty() {
            return;
        }
        let rid = request_id.get_untracked().saturating_add(1);
        request_id.set(rid);
        loading.set(true);
        error.set(None);

        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            let result = async {
                let m = api_client.get_module(&mid).await?;
                let p = api_client.get_project(&m.project_id).await?;
                let list = api_client.list_phases(&mid).await?;
                let team = api_client.list_accepted_members(&m.project_id).await?;
                Ok::<_, ApiError>((p, m, list, team))
            }
            .await;

            if request_id.get_untracked() != rid {
                return;
            }

            match result {
                Ok((p, m, list, team)) => {
                    project.set(Some(p));
                    module.set(Some(m));
                    phases.set(list);
                    members.set(team);
                }
                Err(ApiError::NotFound(_)) => {
                    tracing::warn!(module_id = %mid, "module not found");
                    let href = project_href(&pid);
                    navigate.with_value(|nav| nav(&href, Default::default()));
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            loading.set(false);
        });
    });

    let delete_phase = move |phase: Phase| {
        let confirmed = window()
            .confirm_with_message(&format!("Delete \"{}\"? This cannot be undone.", phase.title))
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_phase(&phase.id).await {
                Ok(()) => {
                    tracing::info!(phase_id = %phase.id, "phase deleted");
                    discard_phase_draft(&phase.id);
                    phases.update(|list| list.retain(|p| p.id != phase.id));
                }
                Err(e) => report_error(app_state.0, e, error),
            }
        });
    };

    view! {
        <div class="flex flex-col gap-6">
            <a
                href=move || project_href(&project_id())
                class="inline-flex items-center gap-1 text-xs text-muted-foreground hover:text-foreground"
            >
                <ArrowLeft class="size-3" />
                {move || project.get().map(|p| p.title).unwrap_or_else(|| "Project".to_string())}
            </a>

            <ErrorAlert message=error />

            <Show when=move || !loading.get() fallback=|| view! { <PageLoading /> }>
                {move || module.get().map(|m| view! {
                    <div>
                        <h1 class="text-xl font-semibold">{m.title.clone()}</h1>
                        <p class="text-sm text-muted-foreground">{m.description.clone().unwrap_or_default()}</p>
                    </div>
                })}

                <section class="flex flex-col gap-2">
                    <h2 class="text-sm font-medium">"Phases"</h2>
                    <Show
                        when=move || !phases.get().is_empty()
                        fallback=|| view! { <p class="text-xs text-muted-foreground">"No phases yet."</p> }
                    >
                        <For
                            each=move || phases.get()
                            key=|p| p.id.clone()
                            children=move |phase: Phase| {
                                let href = phase_href(&project_id(), &phase.module_id, &phase.id);
                                let assignee = phase
                                    .profiles
                                    .as_ref()
                                    .map(|p| p.username.clone())
                                    .filter(|n| !n.is_empty());
                                let target = phase.clone();
                                view! {
                                    <div class="flex items-center gap-2 rounded-md border px-3 py-2 hover:bg-accent/40">
                                        <a href=href class="flex-1">
                                            <div class="text-sm font-medium">{phase.title.clone()}</div>
                                            <div class="text-xs text-muted-foreground">
                                                {phase.description.clone().unwrap_or_default()}
                                            </div>
                                        </a>
                                        {assignee.map(|name| view! {
                                            <span class="rounded bg-muted px-2 py-0.5 text-[10px]">{name}</span>
                                        })}
                                        <Show when=is_owner fallback=|| ().into_view()>
                                            {
                                                let target = target.clone();
                                                view! {
                                                    <Button
                                                        size=ButtonSize::Icon
                                                        variant=ButtonVariant::Ghost
                                                        attr:title="Delete phase"
                                                        on:click=move |_| delete_phase(target.clone())
                                                    >
                                                        <X />
                                                    </Button>
                                                }
                                            }
                                        </Show>
                                    </div>
                                }
                            }
                        />
                    </Show>
                </section>

                <Show when=is_owner fallback=|| ().into_view()>
                    <CreatePhaseForm module_id=Signal::derive(module_id) phases=phases members=members />
                </Show>
            </Show>
        </div>
    }
}

#[component]
fn CreatePhaseForm(
    module_id: Signal<String>,
    phases: RwSignal<Vec<Phase>>,
    members: RwSignal<Vec<ProjectMember>>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let title: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<String> = RwSignal::new(String::new());
    let assignee: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving: RwSignal<bool> = RwSignal::new(false);

    let on_assignee = move |ev: web_sys::Event| {
        if let Some(select) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            assignee.set(select.value());
        }
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let req = NewPhase {
            module_id: module_id.get_untracked(),
            title: title.get_untracked(),
            description: non_empty(&description.get_untracked()),
            assigned_to: non_empty(&assignee.get_untracked()),
            content: String::new(),
        };
        let api_client = app_state.0.api_client.get_untracked();

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.create_phase(&req).await {
                Ok(phase) => {
                    tracing::info!(phase_id = %phase.id, "phase created");
                    // Re-list so the embedded assignee profile is present.
                    match api_client.list_phases(&phase.module_id).await {
                        Ok(list) => phases.set(list),
                        Err(_) => phases.update(|list| list.push(phase)),
                    }
                    title.set(String::new());
                    description.set(String::new());
                    assignee.set(String::new());
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            saving.set(false);
        });
    };

    view! {
        <form class="flex max-w-md flex-col gap-2 rounded-md border border-dashed p-3" on:submit=on_submit>
            <Label html_for="phase-title">"New phase"</Label>
            <Input id="phase-title" placeholder="Chapter 1" bind_value=title class="h-8 text-sm" />
            <Textarea placeholder="Description (optional)" rows=2 bind_value=description />
            <select
                class="h-8 rounded-md border bg-transparent px-2 text-sm"
                on:change=on_assignee
                prop:value=move || assignee.get()
            >
                <option value="">"Unassigned"</option>
                <For
                    each=move || members.get()
                    key=|m| m.id.clone()
                    children=move |m: ProjectMember| {
                        let value = m.user_id.clone().unwrap_or_default();
                        let name = m
                            .profiles
                            .as_ref()
                            .map(|p| p.username.clone())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| m.invited_email.clone());
                        view! { <option value=value>{name}</option> }
                    }
                />
            </select>
            <ErrorAlert message=error />
            <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                <Plus />
                "Add phase"
            </Button>
        </form>
    }
}
