use super::{module_href, project_href, report_error, ProjectRouteParams};
use crate::api::{ApiError, NewProject};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, PageLoading, Spinner, Textarea,
};
use crate::invites::{owner_row, InviteList, MAX_TEAM_SIZE};
use crate::models::{Module, Project, ProjectMember};
use crate::state::AppContext;
use icons::{ArrowLeft, Plus, X};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};

#[component]
pub fn NewProjectPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let title: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<String> = RwSignal::new(String::new());
    let is_team: RwSignal<bool> = RwSignal::new(false);
    let invites: RwSignal<InviteList> = RwSignal::new(InviteList::default());
    let invite_email: RwSignal<String> = RwSignal::new(String::new());
    let invite_error: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let creating: RwSignal<bool> = RwSignal::new(false);

    let add_invite = move || {
        let email = invite_email.get_untracked();
        let mut result = Ok(());
        invites.update(|list| result = list.add(&email));
        match result {
            Ok(()) => {
                invite_email.set(String::new());
                invite_error.set(None);
            }
            Err(e) => invite_error.set(Some(e.to_string())),
        }
    };

    let on_invite_key = move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Enter" {
            ev.prevent_default();
            add_invite();
        }
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if creating.get_untracked() {
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        let Some(owner_id) = api_client.user_id().map(str::to_string) else {
            return;
        };
        let owner_email = api_client.user_email().map(str::to_string);
        let team = is_team.get_untracked();
        let invite_list = invites.get_untracked();
        let req = NewProject {
            title: title.get_untracked(),
            description: description.get_untracked(),
            owner_id: owner_id.clone(),
            is_team: team,
        };

        creating.set(true);
        error.set(None);

        spawn_local(async move {
            let result = async {
                let project = api_client.create_project(&req).await?;
                if team {
                    let mut rows = vec![owner_row(&project.id, &owner_id, owner_email.as_deref())];
                    rows.extend(invite_list.to_rows(&project.id, &owner_id));
                    api_client.add_members(&rows).await?;
                }
                Ok::<_, ApiError>(project)
            }
            .await;

            match result {
                Ok(project) => {
                    tracing::info!(project_id = %project.id, team, "project created");
                    let href = project_href(&project.id);
                    navigate.with_value(|nav| nav(&href, Default::default()));
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            creating.set(false);
        });
    };

    let mode_button = move |team: bool, label: &'static str| {
        view! {
            <button
                type="button"
                class=move || {
                    let active = is_team.get() == team;
                    tw_merge::tw_merge!(
                        "h-8 rounded-md border px-3 text-sm font-medium hover:cursor-pointer",
                        if active { "bg-primary text-primary-foreground border-primary" } else { "bg-background hover:bg-accent" }
                    )
                }
                on:click=move |_| is_team.set(team)
            >
                {label}
            </button>
        }
    };

    view! {
        <div class="mx-auto flex max-w-xl flex-col gap-4">
            <a href="/dashboard" class="inline-flex items-center gap-1 text-xs text-muted-foreground hover:text-foreground">
                <ArrowLeft class="size-3" />
                "Back to projects"
            </a>

            <Card>
                <CardHeader>
                    <CardTitle class="text-lg">"New project"</CardTitle>
                    <CardDescription class="text-xs">"Write alone, or invite up to three co-writers."</CardDescription>
                </CardHeader>
                <CardContent>
                    <form class="flex flex-col gap-4" on:submit=on_submit>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="title">"Title"</Label>
                            <Input id="title" placeholder="The Long Night" bind_value=title required=true class="h-8 text-sm" />
                        </div>

                        <div class="flex flex-col gap-1.5">
                            <Label html_for="description">"Description"</Label>
                            <Textarea id="description" placeholder="What is this story about?" bind_value=description />
                        </div>

                        <div class="flex gap-2">
                            {mode_button(false, "Solo")}
                            {mode_button(true, "Team")}
                        </div>

                        <Show when=move || is_team.get() fallback=|| ().into_view()>
                            <div class="flex flex-col gap-2 rounded-md border p-3">
                                <Label html_for="invite">
                                    {format!("Invite writers (team of up to {MAX_TEAM_SIZE})")}
                                </Label>
                                <div class="flex gap-2" on:keydown=on_invite_key>
                                    <Input
                                        id="invite"
                                        r#type="email"
                                        placeholder="cowriter@example.com"
                                        bind_value=invite_email
                                        disabled=Signal::derive(move || invites.get().capacity_left() == 0)
                                        class="h-8 text-sm"
                                    />
                                    <Button
                                        attr:r#type="button"
                                        size=ButtonSize::Sm
                                        variant=ButtonVariant::Outline
                                        on:click=move |_| add_invite()
                                    >
                                        <Plus />
                                        "Add"
                                    </Button>
                                </div>
                                <ErrorAlert message=invite_error />
                                <ul class="flex flex-col gap-1">
                                    <For
                                        each=move || invites.get().emails().to_vec()
                                        key=|email| email.clone()
                                        children=move |email: String| {
                                            let remove = email.clone();
                                            view! {
                                                <li class="flex items-center justify-between rounded bg-muted px-2 py-1 text-xs">
                                                    {email}
                                                    <button
                                                        type="button"
                                                        class="text-muted-foreground hover:text-foreground"
                                                        on:click=move |_| invites.update(|list| list.remove(&remove))
                                                    >
                                                        <X class="size-3" />
                                                    </button>
                                                </li>
                                            }
                                        }
                                    />
                                </ul>
                            </div>
                        </Show>

                        <ErrorAlert message=error />

                        <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || creating.get()>
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || creating.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if creating.get() { "Creating..." } else { "Create project" }}
                            </span>
                        </Button>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}

#[component]
pub fn ProjectPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<ProjectRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let project_id = move || params.get().ok().and_then(|p| p.project_id).unwrap_or_default();

    let project: RwSignal<Option<Project>> = RwSignal::new(None);
    let members: RwSignal<Vec<ProjectMember>> = RwSignal::new(vec![]);
    let modules: RwSignal<Vec<Module>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let request_id: RwSignal<u64> = RwSignal::new(0);

    let is_owner = move || {
        let user = app_state.0.api_client.get().user_id().map(str::to_string);
        project.get().is_some_and(|p| Some(p.owner_id) == user)
    };

    Effect::new(move |_| {
        let id = project_id();
        if id.trim().is_empty() {
            return;
        }
        let rid = request_id.get_untracked().saturating_add(1);
        request_id.set(rid);
        loading.set(true);
        error.set(None);

        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            let result = async {
                let p = api_client.get_project(&id).await?;
                let m = api_client.list_accepted_members(&id).await?;
                let mods = api_client.list_modules(&id).await?;
                Ok::<_, ApiError>((p, m, mods))
            }
            .await;

            // Ignore stale responses.
            if request_id.get_untracked() != rid {
                return;
            }

            match result {
                Ok((p, m, mods)) => {
                    project.set(Some(p));
                    members.set(m);
                    modules.set(mods);
                }
                Err(ApiError::NotFound(_)) => {
                    tracing::warn!(project_id = %id, "project not found");
                    navigate.with_value(|nav| nav("/dashboard", Default::default()));
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            loading.set(false);
        });
    });

    view! {
        <div class="flex flex-col gap-6">
            <a href="/dashboard" class="inline-flex items-center gap-1 text-xs text-muted-foreground hover:text-foreground">
                <ArrowLeft class="size-3" />
                "All projects"
            </a>

            <ErrorAlert message=error />

            <Show when=move || !loading.get() fallback=|| view! { <PageLoading /> }>
                {move || project.get().map(|p| view! {
                    <div>
                        <h1 class="text-xl font-semibold">{p.title.clone()}</h1>
                        <p class="text-sm text-muted-foreground">{p.description.clone().unwrap_or_default()}</p>
                    </div>
                })}

                <div class="grid gap-6 md:grid-cols-[1fr_240px]">
                    <section class="flex flex-col gap-3">
                        <h2 class="text-sm font-medium">"Modules"</h2>
                        <Show
                            when=move || !modules.get().is_empty()
                            fallback=|| view! { <p class="text-xs text-muted-foreground">"No modules yet."</p> }
                        >
                            <For
                                each=move || modules.get()
                                key=|m| m.id.clone()
                                children=move |m: Module| {
                                    let href = module_href(&m.project_id, &m.id);
                                    view! {
                                        <a href=href class="block rounded-md border px-3 py-2 hover:bg-accent/40">
                                            <div class="text-sm font-medium">{m.title.clone()}</div>
                                            <div class="text-xs text-muted-foreground">{m.description.clone().unwrap_or_default()}</div>
                                        </a>
                                    }
                                }
                            />
                        </Show>
                        <Show when=is_owner fallback=|| ().into_view()>
                            <CreateModuleForm project_id=Signal::derive(project_id) modules=modules />
                        </Show>
                    </section>

                    <aside class="flex flex-col gap-2">
                        <h2 class="text-sm font-medium">"Writers"</h2>
                        <For
                            each=move || members.get()
                            key=|m| m.id.clone()
                            children=move |m: ProjectMember| {
                                let name = m
                                    .profiles
                                    .as_ref()
                                    .map(|p| p.username.clone())
                                    .filter(|n| !n.is_empty())
                                    .unwrap_or_else(|| m.invited_email.clone());
                                let avatar = m.profiles.as_ref().and_then(|p| p.avatar_url.clone());
                                let initial = name.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
                                view! {
                                    <div class="flex items-center gap-2 text-sm">
                                        <span class="flex size-6 items-center justify-center overflow-hidden rounded-full bg-muted text-[10px]">
                                            {match avatar {
                                                Some(url) => view! { <img src=url alt="" class="size-full object-cover" /> }.into_any(),
                                                None => view! { <span>{initial}</span> }.into_any(),
                                            }}
                                        </span>
                                        <span>{name}</span>
                                        <span class="ml-auto text-[10px] uppercase text-muted-foreground">{m.role.to_string()}</span>
                                    </div>
                                }
                            }
                        />
                    </aside>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn CreateModuleForm(project_id: Signal<String>, modules: RwSignal<Vec<Module>>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let title: RwSignal<String> = RwSignal::new(String::new());
    let description: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving: RwSignal<bool> = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let id = project_id.get_untracked();
        let title_val = title.get_untracked();
        let desc_val = description.get_untracked();
        let api_client = app_state.0.api_client.get_untracked();

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.create_module(&id, &title_val, &desc_val).await {
                Ok(m) => {
                    modules.update(|list| list.push(m));
                    title.set(String::new());
                    description.set(String::new());
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            saving.set(false);
        });
    };

    view! {
        <form class="flex flex-col gap-2 rounded-md border border-dashed p-3" on:submit=on_submit>
            <Label html_for="module-title">"New module"</Label>
            <Input id="module-title" placeholder="Act I" bind_value=title class="h-8 text-sm" />
            <Textarea placeholder="Description (optional)" rows=2 bind_value=description />
            <ErrorAlert message=error />
            <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                <Plus />
                "Add module"
            </Button>
        </form>
    }
}
