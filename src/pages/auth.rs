use super::dashboard::DashboardLayout;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardTitle, ErrorAlert, Input, Label, Spinner,
};
use crate::models::Session;
use crate::state::AppContext;
use crate::storage::save_profile_to_storage;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::Redirect;

/// Store the session and profile, then enter the dashboard.
async fn complete_sign_in(app_state: AppContext, session: Session) {
    let mut api_client = app_state.0.api_client.get_untracked();
    let user = session.user.clone();
    api_client.set_session(session);
    api_client.save_to_storage();

    let profile = api_client.ensure_profile(&user).await;
    save_profile_to_storage(&profile);

    tracing::info!(user_id = %user.id, "signed in");
    app_state.0.api_client.set(api_client);
    app_state.0.profile.set(Some(profile));
    let _ = window().location().set_href("/dashboard");
}

#[component]
fn AuthShell(
    title: &'static str,
    description: &'static str,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-semibold tracking-tight text-foreground">"Narratia"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{title}</CardTitle>
                        <CardDescription class="text-xs">{description}</CardDescription>
                    </CardHeader>
                    <CardContent>{children()}</CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn SubmitButton(
    loading: RwSignal<bool>,
    idle_label: &'static str,
    busy_label: &'static str,
) -> impl IntoView {
    view! {
        <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
            <span class="inline-flex items-center gap-2">
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner />
                </Show>
                {move || if loading.get() { busy_label } else { idle_label }}
            </span>
        </Button>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get();
        let password_val = password.get();
        let api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.sign_in(&email_val, &password_val).await {
                Ok(session) => complete_sign_in(app_state, session).await,
                Err(e) => {
                    tracing::warn!(error = %e, "sign in failed");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Log in" description="Use your email and password to continue writing.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="email">"Email"</Label>
                    <Input
                        id="email"
                        r#type="email"
                        placeholder="you@example.com"
                        bind_value=email
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <div class="flex flex-col gap-1.5">
                    <Label html_for="password">"Password"</Label>
                    <Input
                        id="password"
                        r#type="password"
                        placeholder="••••••••"
                        bind_value=password
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <ErrorAlert message=error />

                <SubmitButton loading=loading idle_label="Continue" busy_label="Signing in..." />

                <div class="pt-1 text-xs text-muted-foreground">
                    "No account? "
                    <a class="text-primary underline underline-offset-4" href="/register">"Sign up"</a>
                </div>
            </form>
        </AuthShell>
    }
}

#[component]
pub fn RegistrationPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    // Set when the account needs email confirmation before the first sign-in.
    let confirm_sent: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get();
        let username_val = username.get();
        let password_val = password.get();
        let api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client
                .sign_up(&email_val, &password_val, &username_val)
                .await
            {
                Ok(Some(session)) => complete_sign_in(app_state, session).await,
                Ok(None) => confirm_sent.set(true),
                Err(e) => {
                    tracing::warn!(error = %e, "sign up failed");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <AuthShell title="Create account" description="Start a story, alone or with your team.">
            <Show
                when=move || !confirm_sent.get()
                fallback=move || view! {
                    <Alert>
                        <AlertDescription>
                            "Check your inbox to confirm your email, then "
                            <a class="text-primary underline underline-offset-4" href="/login">"log in"</a>
                            "."
                        </AlertDescription>
                    </Alert>
                }
            >
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="username">"Username"</Label>
                        <Input
                            id="username"
                            placeholder="penname"
                            bind_value=username
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="email">"Email"</Label>
                        <Input
                            id="email"
                            r#type="email"
                            placeholder="you@example.com"
                            bind_value=email
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="password">"Password"</Label>
                        <Input
                            id="password"
                            r#type="password"
                            placeholder="••••••••"
                            bind_value=password
                            required=true
                            class="h-8 text-sm"
                        />
                    </div>

                    <ErrorAlert message=error />

                    <SubmitButton loading=loading idle_label="Create account" busy_label="Creating..." />

                    <div class="pt-1 text-xs text-muted-foreground">
                        "Already have an account? "
                        <a class="text-primary underline underline-offset-4" href="/login">"Log in"</a>
                    </div>
                </form>
            </Show>
        </AuthShell>
    }
}

/// Gate for everything under `/dashboard`.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <DashboardLayout>
                {move || children.with_value(|c| c())}
            </DashboardLayout>
        </Show>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let target = if app_state.0.api_client.get_untracked().is_authenticated() {
        "/dashboard"
    } else {
        "/login"
    };

    view! { <Redirect path=target /> }
}
