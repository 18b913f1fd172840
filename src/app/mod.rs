use crate::pages::{
    DashboardPage, LoginPage, ModulePage, NewProjectPage, PhaseEditorPage, ProjectPage,
    RegistrationPage, RootAuthed, RootPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("register") view=RegistrationPage />
                <Route path=path!("dashboard") view=move || view! {
                    <RootAuthed>
                        <DashboardPage />
                    </RootAuthed>
                } />
                <Route path=path!("dashboard/new-project") view=move || view! {
                    <RootAuthed>
                        <NewProjectPage />
                    </RootAuthed>
                } />
                <Route path=path!("dashboard/:project_id") view=move || view! {
                    <RootAuthed>
                        <ProjectPage />
                    </RootAuthed>
                } />
                <Route path=path!("dashboard/:project_id/module/:module_id") view=move || view! {
                    <RootAuthed>
                        <ModulePage />
                    </RootAuthed>
                } />
                <Route path=path!("dashboard/:project_id/module/:module_id/phase/:phase_id") view=move || view! {
                    <RootAuthed>
                        <PhaseEditorPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=RootPage />
            </Routes>
        </Router>
    }
}
