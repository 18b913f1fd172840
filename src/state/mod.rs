use crate::api::ApiClient;
use crate::models::Profile;
use crate::storage::load_profile_from_storage;
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Profile of the signed-in writer (restored from storage, refreshed on login).
    pub profile: RwSignal<Option<Profile>>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_profile = if stored_client.is_authenticated() {
            load_profile_from_storage()
        } else {
            None
        };

        Self {
            api_client: RwSignal::new(stored_client),
            profile: RwSignal::new(stored_profile),
        }
    }

    /// Forget the session locally and send the user to the login page.
    pub fn expire_session(&self) {
        let mut c = self.api_client.get_untracked();
        c.logout();
        self.api_client.set(c);
        self.profile.set(None);
        let _ = window().location().set_href("/login");
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
