use super::report_error;
use crate::api::NewComment;
use crate::comments::{build_threads, can_delete, visible_threads, CommentThread};
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Textarea};
use crate::models::Comment;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
struct CommentActions {
    reply_to: RwSignal<Option<String>>,
    submit: Callback<(Option<String>, String)>,
    toggle_resolved: Callback<Comment>,
    delete: Callback<String>,
    user_id: Signal<String>,
    is_project_owner: Signal<bool>,
}

/// Threaded review comments for one phase. Reloads after every change.
#[component]
pub fn CommentsPanel(
    #[prop(into)] phase_id: Signal<String>,
    #[prop(into)] is_project_owner: Signal<bool>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let threads: RwSignal<Vec<CommentThread>> = RwSignal::new(vec![]);
    let show_resolved: RwSignal<bool> = RwSignal::new(false);
    let draft: RwSignal<String> = RwSignal::new(String::new());
    let reply_to: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let busy: RwSignal<bool> = RwSignal::new(false);

    let user_id = Signal::derive(move || {
        app_state
            .0
            .api_client
            .get()
            .user_id()
            .map(str::to_string)
            .unwrap_or_default()
    });

    let reload = move || {
        let id = phase_id.get_untracked();
        if id.trim().is_empty() {
            return;
        }
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.list_comments(&id).await {
                Ok(list) => threads.set(build_threads(list)),
                Err(e) => report_error(app_state.0, e, error),
            }
        });
    };

    Effect::new(move |_| {
        phase_id.track();
        reload();
    });

    let submit = Callback::new(move |(parent_id, content): (Option<String>, String)| {
        let content = content.trim().to_string();
        if content.is_empty() || busy.get_untracked() {
            return;
        }
        let req = NewComment {
            phase_id: phase_id.get_untracked(),
            user_id: user_id.get_untracked(),
            content,
            parent_id: parent_id.clone(),
            resolved: false,
        };
        let api_client = app_state.0.api_client.get_untracked();

        busy.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.add_comment(&req).await {
                Ok(()) => {
                    if parent_id.is_some() {
                        reply_to.set(None);
                    } else {
                        draft.set(String::new());
                    }
                    reload();
                }
                Err(e) => report_error(app_state.0, e, error),
            }
            busy.set(false);
        });
    });

    let toggle_resolved = Callback::new(move |comment: Comment| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client
                .set_comment_resolved(&comment.id, !comment.resolved)
                .await
            {
                Ok(()) => reload(),
                Err(e) => report_error(app_state.0, e, error),
            }
        });
    });

    let delete = Callback::new(move |comment_id: String| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.delete_comment(&comment_id).await {
                Ok(()) => reload(),
                Err(e) => report_error(app_state.0, e, error),
            }
        });
    });

    let actions = CommentActions {
        reply_to,
        submit,
        toggle_resolved,
        delete,
        user_id,
        is_project_owner,
    };

    view! {
        <section class="flex flex-col gap-3 border-t pt-4">
            <div class="flex items-center justify-between">
                <h2 class="text-sm font-medium">"Comments"</h2>
                <label class="flex items-center gap-1.5 text-xs text-muted-foreground">
                    <input
                        type="checkbox"
                        prop:checked=move || show_resolved.get()
                        on:change=move |_| show_resolved.update(|v| *v = !*v)
                    />
                    "Show resolved"
                </label>
            </div>

            <ErrorAlert message=error />

            <div class="flex flex-col gap-2">
                <Textarea placeholder="Leave a note for your co-writers..." rows=2 bind_value=draft />
                <Button
                    class="self-end"
                    size=ButtonSize::Sm
                    attr:disabled=move || busy.get() || draft.get().trim().is_empty()
                    on:click=move |_| submit.run((None, draft.get_untracked()))
                >
                    "Comment"
                </Button>
            </div>

            <For
                each=move || visible_threads(&threads.get(), show_resolved.get())
                key=|t| (t.comment.id.clone(), t.comment.resolved, t.replies.len())
                children=move |thread: CommentThread| view! { <ThreadView thread=thread actions=actions /> }
            />
        </section>
    }
}

#[component]
fn ThreadView(thread: CommentThread, actions: CommentActions) -> impl IntoView {
    let reply_text: RwSignal<String> = RwSignal::new(String::new());
    let root_id = thread.comment.id.clone();
    let resolved = thread.comment.resolved;
    let replying = {
        let root_id = root_id.clone();
        move || actions.reply_to.get().as_deref() == Some(root_id.as_str())
    };
    let open_reply = {
        let root_id = root_id.clone();
        move |_| actions.reply_to.set(Some(root_id.clone()))
    };
    let send_reply = move |_| {
        actions
            .submit
            .run((Some(root_id.clone()), reply_text.get_untracked()));
    };
    let toggle = thread.comment.clone();

    view! {
        <div class=move || {
            if resolved { "rounded-md border bg-muted/40 p-3 opacity-70" } else { "rounded-md border p-3" }
        }>
            <CommentBody comment=thread.comment.clone() actions=actions />
            <div class="mt-1 flex gap-2 pl-1">
                <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=open_reply>"Reply"</Button>
                <Button
                    size=ButtonSize::Xs
                    variant=ButtonVariant::Ghost
                    on:click=move |_| actions.toggle_resolved.run(toggle.clone())
                >
                    {if resolved { "Reopen" } else { "Resolve" }}
                </Button>
            </div>

            <div class="ml-4 mt-2 flex flex-col gap-2 border-l pl-3">
                {thread
                    .replies
                    .into_iter()
                    .map(|reply| view! { <CommentBody comment=reply actions=actions /> })
                    .collect_view()}
            </div>

            <Show when=replying.clone() fallback=|| ().into_view()>
                <div class="ml-4 mt-2 flex flex-col gap-2">
                    <Textarea placeholder="Reply..." rows=2 bind_value=reply_text />
                    <div class="flex justify-end gap-2">
                        <Button
                            size=ButtonSize::Xs
                            variant=ButtonVariant::Outline
                            on:click=move |_| actions.reply_to.set(None)
                        >
                            "Cancel"
                        </Button>
                        <Button size=ButtonSize::Xs on:click=send_reply.clone()>"Reply"</Button>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn CommentBody(comment: Comment, actions: CommentActions) -> impl IntoView {
    let author = comment.author_name().to_string();
    let when = comment.created_at.chars().take(16).collect::<String>().replace('T', " ");
    let deletable = {
        let comment = comment.clone();
        move || {
            can_delete(
                &comment,
                &actions.user_id.get(),
                actions.is_project_owner.get(),
            )
        }
    };
    let id = comment.id.clone();

    view! {
        <div class="flex flex-col gap-0.5">
            <div class="flex items-center gap-2 text-xs">
                <span class="font-medium">{author}</span>
                <span class="text-muted-foreground">{when}</span>
                <Show when=deletable fallback=|| ().into_view()>
                    {
                        let id = id.clone();
                        view! {
                            <button
                                class="ml-auto text-muted-foreground hover:cursor-pointer hover:text-destructive"
                                on:click=move |_| actions.delete.run(id.clone())
                            >
                                "Delete"
                            </button>
                        }
                    }
                </Show>
            </div>
            <p class="whitespace-pre-wrap text-sm">{comment.content.clone()}</p>
        </div>
    }
}
