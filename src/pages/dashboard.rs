use super::{project_href, report_error};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, PageLoading, Spinner,
};
use crate::invites::respond;
use crate::models::{InviteStatus, Project, ProjectMember};
use crate::state::AppContext;
use crate::storage::save_profile_to_storage;
use crate::util::{avatar_path, now_ms, validate_avatar};
use icons::{Plus, Users};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;

#[component]
pub fn DashboardLayout(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let signing_out: RwSignal<bool> = RwSignal::new(false);

    // A stored session may have expired server-side, and may predate the
    // cached profile.
    Effect::new(move |_| {
        let client = app_state.0.api_client.get_untracked();
        if !client.is_authenticated() {
            return;
        }
        spawn_local(async move {
            let user = match client.get_user().await {
                Ok(user) => user,
                Err(e) if e.is_unauthorized() => {
                    tracing::info!("stored session expired");
                    app_state.0.expire_session();
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "session check failed");
                    return;
                }
            };
            if app_state.0.profile.get_untracked().is_some() {
                return;
            }
            let profile = client.ensure_profile(&user).await;
            save_profile_to_storage(&profile);
            app_state.0.profile.set(Some(profile));
        });
    });

    let on_sign_out = move |_| {
        if signing_out.get_untracked() {
            return;
        }
        signing_out.set(true);
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            if let Err(e) = api_client.sign_out().await {
                tracing::warn!(error = %e, "server sign out failed");
            }
            app_state.0.expire_session();
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <header class="border-b">
                <div class="mx-auto flex h-14 w-full max-w-5xl items-center justify-between px-4">
                    <a href="/dashboard" class="text-sm font-semibold tracking-tight">"Narratia"</a>
                    <div class="flex items-center gap-3">
                        <ProfileAvatar />
                        <span class="text-xs text-muted-foreground">
                            {move || app_state.0.profile.get().map(|p| p.username).unwrap_or_default()}
                        </span>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Sm
                            on:click=on_sign_out
                            attr:disabled=move || signing_out.get()
                        >
                            "Sign out"
                        </Button>
                    </div>
                </div>
            </header>
            <main class="mx-auto w-full max-w-5xl px-4 py-6">{children()}</main>
        </div>
    }
}

/// Avatar with click-to-upload.
#[component]
fn ProfileAvatar() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let uploading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let file_ref: NodeRef<leptos::html::Input> = NodeRef::new();

    let initial = move || {
        app_state
            .0
            .profile
            .get()
            .and_then(|p| p.username.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "?".to_string())
    };

    let on_pick = move |_| {
        if let Some(input) = file_ref.get_untracked() {
            input.click();
        }
    };

    let on_change = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        // Allow picking the same file again later.
        input.set_value("");

        if let Err(e) = validate_avatar(&file.type_(), file.size()) {
            error.set(Some(e.to_string()));
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        let Some(user_id) = api_client.user_id().map(str::to_string) else {
            return;
        };
        let path = avatar_path(&user_id, &file.name());
        let content_type = file.type_();

        uploading.set(true);
        error.set(None);

        spawn_local(async move {
            let bytes = match wasm_bindgen_futures::JsFuture::from(file.array_buffer()).await {
                Ok(buf) => js_sys::Uint8Array::new(&buf).to_vec(),
                Err(_) => {
                    error.set(Some("Could not read the selected file".to_string()));
                    uploading.set(false);
                    return;
                }
            };

            let result = async {
                let url = api_client.upload_avatar(&path, &content_type, bytes).await?;
                api_client.update_avatar_url(&user_id, &url).await?;
                Ok::<_, crate::api::ApiError>(url)
            }
            .await;

            match result {
                Ok(url) => {
                    tracing::info!(%user_id, "avatar updated");
                    let busted = format!("{url}?t={}", now_ms());
                    app_state.0.profile.update(|p| {
                        if let Some(p) = p {
                            p.avatar_url = Some(busted);
                            save_profile_to_storage(p);
                        }
                    });
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            uploading.set(false);
        });
    };

    view! {
        <div class="relative">
            <button
                class="flex size-8 items-center justify-center overflow-hidden rounded-full border bg-muted text-xs font-medium hover:cursor-pointer"
                title=move || error.get().unwrap_or_else(|| "Change avatar".to_string())
                on:click=on_pick
                disabled=move || uploading.get()
            >
                {move || {
                    if uploading.get() {
                        return view! { <Spinner class="size-3" /> }.into_any();
                    }
                    match app_state.0.profile.get().and_then(|p| p.avatar_url) {
                        Some(url) => view! { <img src=url alt="Avatar" class="size-full object-cover" /> }.into_any(),
                        None => view! { <span>{initial()}</span> }.into_any(),
                    }
                }}
            </button>
            <input
                node_ref=file_ref
                type="file"
                accept="image/*"
                class="hidden"
                on:change=on_change
            />
            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                <div class="absolute right-0 top-10 z-10 w-48 rounded-md border bg-card p-2 text-xs text-destructive shadow-sm">
                    {move || error.get().unwrap_or_default()}
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let projects: RwSignal<Vec<Project>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move |_| {
        let api_client = app_state.0.api_client.get();
        let Some(user_id) = api_client.user_id().map(str::to_string) else {
            return;
        };
        loading.set(true);
        spawn_local(async move {
            match api_client.list_projects_for_user(&user_id).await {
                Ok(list) => projects.set(list),
                Err(e) => report_error(app_state.0, e, error),
            }
            loading.set(false);
        });
    });

    view! {
        <div class="flex flex-col gap-6">
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-xl font-semibold">"Your projects"</h1>
                    <p class="text-xs text-muted-foreground">"Stories you own or write for."</p>
                </div>
                <a
                    href="/dashboard/new-project"
                    class="inline-flex h-8 items-center gap-1.5 rounded-md bg-primary px-3 text-sm font-medium text-primary-foreground hover:bg-primary/90"
                >
                    <Plus class="size-4" />
                    "New project"
                </a>
            </div>

            <IncomingInvites />
            <ErrorAlert message=error />

            <Show when=move || !loading.get() fallback=|| view! { <PageLoading /> }>
                <Show
                    when=move || !projects.get().is_empty()
                    fallback=|| view! {
                        <div class="rounded-md border border-dashed px-4 py-10 text-center text-xs text-muted-foreground">
                            "No projects yet. Create one to start writing."
                        </div>
                    }
                >
                    <div class="grid gap-3 sm:grid-cols-2">
                        <For
                            each=move || projects.get()
                            key=|p| p.id.clone()
                            children=move |p: Project| {
                                let href = project_href(&p.id);
                                let is_team = p.is_team;
                                view! {
                                    <a href=href class="block">
                                        <Card class="h-full transition-colors hover:bg-accent/40">
                                            <CardHeader>
                                                <CardTitle class="flex items-center gap-2 text-base">
                                                    {p.title.clone()}
                                                    <Show when=move || is_team fallback=|| ().into_view()>
                                                        <Users class="size-3.5 text-muted-foreground" />
                                                    </Show>
                                                </CardTitle>
                                                <CardDescription class="text-xs">
                                                    {p.description.clone().unwrap_or_default()}
                                                </CardDescription>
                                            </CardHeader>
                                        </Card>
                                    </a>
                                }
                            }
                        />
                    </div>
                </Show>
            </Show>
        </div>
    }
}

/// Pending team invites addressed to the signed-in writer.
#[component]
fn IncomingInvites() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());
    let invites: RwSignal<Vec<ProjectMember>> = RwSignal::new(vec![]);
    let busy: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move |_| {
        let api_client = app_state.0.api_client.get();
        let Some(email) = api_client.user_email().map(str::to_string) else {
            return;
        };
        spawn_local(async move {
            match api_client.list_pending_invites(&email).await {
                Ok(list) => invites.set(list),
                Err(e) => report_error(app_state.0, e, error),
            }
        });
    });

    let answer = move |invite: ProjectMember, accept: bool| {
        let next = match respond(invite.status, accept) {
            Ok(next) => next,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        let api_client = app_state.0.api_client.get_untracked();
        let user_id = api_client.user_id().map(str::to_string);

        busy.set(Some(invite.id.clone()));
        error.set(None);

        spawn_local(async move {
            let accepted_by = (next == InviteStatus::Accepted)
                .then_some(user_id.as_deref())
                .flatten();
            match api_client.set_invite_status(&invite.id, next, accepted_by).await {
                Ok(()) => {
                    tracing::info!(invite_id = %invite.id, status = %next, "invite answered");
                    invites.update(|list| list.retain(|i| i.id != invite.id));
                    if next == InviteStatus::Accepted {
                        let href = project_href(&invite.project_id);
                        navigate.with_value(|nav| nav(&href, Default::default()));
                    }
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            busy.set(None);
        });
    };

    view! {
        <Show when=move || !invites.get().is_empty() || error.get().is_some() fallback=|| ().into_view()>
            <Card>
                <CardHeader>
                    <CardTitle class="text-sm">"Invitations"</CardTitle>
                    <CardDescription class="text-xs">"You have been invited to write on these projects."</CardDescription>
                </CardHeader>
                <CardContent class="flex flex-col gap-2">
                    <ErrorAlert message=error />
                    <For
                        each=move || invites.get()
                        key=|i| i.id.clone()
                        children=move |invite: ProjectMember| {
                            let title = invite
                                .projects
                                .as_ref()
                                .map(|p| p.title.clone())
                                .unwrap_or_else(|| "Untitled project".to_string());
                            let id = invite.id.clone();
                            let is_busy = move || busy.get().as_deref() == Some(id.as_str());
                            let accept = invite.clone();
                            let reject = invite;
                            view! {
                                <div class="flex items-center justify-between rounded-md border px-3 py-2">
                                    <span class="text-sm">{title}</span>
                                    <div class="flex gap-2">
                                        <Button
                                            size=ButtonSize::Xs
                                            attr:disabled=is_busy.clone()
                                            on:click=move |_| answer(accept.clone(), true)
                                        >
                                            "Accept"
                                        </Button>
                                        <Button
                                            size=ButtonSize::Xs
                                            variant=ButtonVariant::Outline
                                            attr:disabled=is_busy
                                            on:click=move |_| answer(reject.clone(), false)
                                        >
                                            "Decline"
                                        </Button>
                                    </div>
                                </div>
                            }
                        }
                    />
                </CardContent>
            </Card>
        </Show>
    }
}
