mod api;
mod app;
mod autosave;
mod comments;
mod components;
mod drafts;
mod invites;
mod models;
mod pages;
mod state;
mod storage;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::{ApiClient, EnvConfig};
    use crate::drafts::{
        discard_phase_draft, get_phase_body_override, mark_phase_draft_synced, touch_phase_draft,
    };
    use crate::models::{AuthUser, Profile, Session};
    use crate::storage::{
        clear_auth_storage, load_json_from_storage, load_profile_from_storage,
        load_session_from_storage, save_profile_to_storage,
    };
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn session() -> Session {
        Session {
            access_token: "t1".to_string(),
            refresh_token: "r1".to_string(),
            expires_in: 3600,
            user: AuthUser {
                id: "u1".to_string(),
                email: Some("w@example.com".to_string()),
            },
        }
    }

    #[wasm_bindgen_test]
    fn test_session_storage_roundtrip() {
        clear_auth_storage();

        let mut c = ApiClient::load_from_storage();
        assert!(!c.is_authenticated());

        c.set_session(session());
        c.save_to_storage();

        let c2 = ApiClient::load_from_storage();
        assert_eq!(c2.user_id(), Some("u1"));
        assert_eq!(c2.user_email(), Some("w@example.com"));

        let mut c3 = c2.clone();
        c3.logout();
        assert!(load_session_from_storage().is_none());
        assert!(!ApiClient::load_from_storage().is_authenticated());
    }

    #[wasm_bindgen_test]
    fn test_profile_cleared_with_session() {
        save_profile_to_storage(&Profile {
            id: "u1".to_string(),
            username: "w".to_string(),
            avatar_url: None,
        });
        assert_eq!(load_profile_from_storage().map(|p| p.username).as_deref(), Some("w"));

        clear_auth_storage();
        assert!(load_profile_from_storage().is_none());
    }

    #[wasm_bindgen_test]
    fn test_env_config_defaults_without_window_env() {
        let config = EnvConfig::new();
        assert_eq!(config.supabase_url, "http://localhost:54321");
    }

    #[wasm_bindgen_test]
    fn test_draft_journal_restores_until_synced() {
        let id = "wasm-test-phase";
        discard_phase_draft(id);
        assert_eq!(get_phase_body_override(id, "server"), None);

        touch_phase_draft(id, "local edit");
        assert_eq!(
            get_phase_body_override(id, "server").as_deref(),
            Some("local edit")
        );

        // A save of older text does not settle the newer local body.
        mark_phase_draft_synced(id, "something else");
        assert!(get_phase_body_override(id, "server").is_some());

        mark_phase_draft_synced(id, "local edit");
        assert_eq!(get_phase_body_override(id, "server"), None);
        assert!(load_json_from_storage::<serde_json::Value>(
            "narratia_draft_phase::wasm-test-phase"
        )
        .is_none());

        discard_phase_draft(id);
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    mount_to_body(App);
}
