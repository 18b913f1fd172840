use crate::storage::{load_json_from_storage, remove_from_storage, save_json_to_storage};
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

/// Last body typed into a phase editor, kept in localStorage until the server
/// acknowledges it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PhaseDraft {
    pub phase_id: String,
    pub body: String,
    pub updated_ms: i64,
    pub synced_ms: i64,
}

impl PhaseDraft {
    pub fn is_unsynced(&self) -> bool {
        self.updated_ms > self.synced_ms
    }

    pub fn touch(&mut self, body: &str, now_ms: i64) {
        self.body = body.to_string();
        self.updated_ms = now_ms;
        // Do not change synced_ms here.
    }

    /// Only a save of exactly this body counts; a newer keystroke keeps the
    /// draft unsynced.
    pub fn mark_synced(&mut self, saved_body: &str) -> bool {
        if self.body != saved_body {
            return false;
        }
        self.synced_ms = self.synced_ms.max(self.updated_ms);
        true
    }

    /// Body the editor should open with, given what the server has.
    pub fn override_for(&self, server_body: &str) -> Option<String> {
        if self.is_unsynced() && self.body != server_body {
            Some(self.body.clone())
        } else {
            None
        }
    }
}

fn key(phase_id: &str) -> String {
    format!("narratia_draft_phase::{phase_id}")
}

fn load_phase_draft(phase_id: &str) -> PhaseDraft {
    load_json_from_storage::<PhaseDraft>(&key(phase_id)).unwrap_or_else(|| PhaseDraft {
        phase_id: phase_id.to_string(),
        ..Default::default()
    })
}

fn save_phase_draft(d: &PhaseDraft) {
    if d.phase_id.trim().is_empty() {
        return;
    }
    save_json_to_storage(&key(&d.phase_id), d);
}

pub(crate) fn touch_phase_draft(phase_id: &str, body: &str) {
    if phase_id.trim().is_empty() {
        return;
    }

    let mut d = load_phase_draft(phase_id);
    d.touch(body, now_ms());
    save_phase_draft(&d);
}

pub(crate) fn mark_phase_draft_synced(phase_id: &str, saved_body: &str) {
    if phase_id.trim().is_empty() {
        return;
    }

    // A synced entry holds nothing the server lacks.
    let mut d = load_phase_draft(phase_id);
    if d.mark_synced(saved_body) {
        remove_from_storage(&key(phase_id));
    }
}

pub(crate) fn get_phase_body_override(phase_id: &str, server_body: &str) -> Option<String> {
    if phase_id.trim().is_empty() {
        return None;
    }
    load_phase_draft(phase_id).override_for(server_body)
}

pub(crate) fn discard_phase_draft(phase_id: &str) {
    if phase_id.trim().is_empty() {
        return;
    }
    remove_from_storage(&key(phase_id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touched_draft_is_unsynced_until_matching_save() {
        let mut d = PhaseDraft::default();
        d.touch("abc", 10);
        assert!(d.is_unsynced());

        assert!(!d.mark_synced("ab"));
        assert!(d.is_unsynced());

        assert!(d.mark_synced("abc"));
        assert!(!d.is_unsynced());
    }

    #[test]
    fn test_override_only_when_unsynced_and_different() {
        let mut d = PhaseDraft::default();
        d.touch("local", 5);
        assert_eq!(d.override_for("server").as_deref(), Some("local"));
        assert_eq!(d.override_for("local"), None);

        d.mark_synced("local");
        assert_eq!(d.override_for("server"), None);
    }
}
