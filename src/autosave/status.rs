use strum::{AsRefStr, Display};

/// Transient save indicator: `idle → saving → {saved, error} → idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Saving => "Saving...",
            Self::Saved => "Saved",
            Self::Error => "Error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Saved | Self::Error)
    }
}

/// Current status plus a generation counter, so an auto-clear scheduled for an
/// older status never resets a newer one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StatusTracker {
    status: SaveStatus,
    generation: u64,
}

impl StatusTracker {
    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// Switch to `status`; returns the generation an auto-clear must present.
    pub fn enter(&mut self, status: SaveStatus) -> u64 {
        self.status = status;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Return to idle if nothing changed since `generation` was handed out.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self.generation != generation || !self.status.is_terminal() {
            return false;
        }
        self.enter(SaveStatus::Idle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_is_lowercase() {
        assert_eq!(SaveStatus::Saving.to_string(), "saving");
        assert_eq!(SaveStatus::Error.as_ref(), "error");
    }

    #[test]
    fn test_expire_returns_terminal_status_to_idle() {
        let mut t = StatusTracker::default();
        t.enter(SaveStatus::Saving);
        let generation = t.enter(SaveStatus::Saved);
        assert!(t.expire(generation));
        assert_eq!(t.status(), SaveStatus::Idle);
    }

    #[test]
    fn test_stale_expire_does_not_clobber_newer_status() {
        let mut t = StatusTracker::default();
        let stale = t.enter(SaveStatus::Saved);
        t.enter(SaveStatus::Saving);
        assert!(!t.expire(stale));
        assert_eq!(t.status(), SaveStatus::Saving);
    }

    #[test]
    fn test_expire_ignores_non_terminal() {
        let mut t = StatusTracker::default();
        let generation = t.enter(SaveStatus::Saving);
        assert!(!t.expire(generation));
        assert_eq!(t.status(), SaveStatus::Saving);
    }
}
