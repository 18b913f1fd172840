mod auth;
mod comments;
mod dashboard;
mod module;
mod phase;
mod project;

pub use auth::{LoginPage, RegistrationPage, RootAuthed, RootPage};
pub use dashboard::DashboardPage;
pub use module::ModulePage;
pub use phase::PhaseEditorPage;
pub use project::{NewProjectPage, ProjectPage};

use crate::api::ApiError;
use crate::state::AppState;
use leptos::prelude::*;
use leptos_router::params::Params;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct ProjectRouteParams {
    pub project_id: Option<String>,
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct ModuleRouteParams {
    pub project_id: Option<String>,
    pub module_id: Option<String>,
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct PhaseRouteParams {
    pub project_id: Option<String>,
    pub module_id: Option<String>,
    pub phase_id: Option<String>,
}

pub(crate) fn project_href(project_id: &str) -> String {
    format!("/dashboard/{project_id}")
}

pub(crate) fn module_href(project_id: &str, module_id: &str) -> String {
    format!("/dashboard/{project_id}/module/{module_id}")
}

pub(crate) fn phase_href(project_id: &str, module_id: &str, phase_id: &str) -> String {
    format!("/dashboard/{project_id}/module/{module_id}/phase/{phase_id}")
}

/// Surface an API failure in `slot`; an expired session goes back to login.
pub(crate) fn report_error(app_state: AppState, err: ApiError, slot: RwSignal<Option<String>>) {
    if err.is_unauthorized() {
        app_state.expire_session();
    } else {
        slot.set(Some(err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hrefs_nest_under_dashboard() {
        assert_eq!(project_href("p1"), "/dashboard/p1");
        assert_eq!(module_href("p1", "m1"), "/dashboard/p1/module/m1");
        assert_eq!(phase_href("p1", "m1", "x"), "/dashboard/p1/module/m1/phase/x");
    }
}
