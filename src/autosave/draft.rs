/// Why a save request did not reach the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveSkip {
    /// Another save for this document is still outstanding. Not queued.
    InFlight,
    /// The text already equals the baseline.
    Unchanged,
}

/// Permission to issue exactly one persistence call for `text`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SaveTicket {
    text: String,
}

impl SaveTicket {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Client-local editing state for one document.
///
/// `baseline` only ever moves to text the store acknowledged; comparing the
/// body against it is the whole dirty check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DraftState {
    body: String,
    baseline: String,
    in_flight: bool,
}

impl DraftState {
    /// Fresh state for a document loaded with `persisted` as its body.
    pub fn new(persisted: impl Into<String>) -> Self {
        let persisted = persisted.into();
        Self {
            body: persisted.clone(),
            baseline: persisted,
            in_flight: false,
        }
    }

    /// Open with a locally recovered body on top of the persisted one.
    pub fn recovered(persisted: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            body: local.into(),
            baseline: persisted.into(),
            in_flight: false,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn is_dirty(&self) -> bool {
        self.body != self.baseline
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }

    pub fn set_body(&mut self, text: impl Into<String>) {
        self.body = text.into();
    }

    /// Resolve the text to persist and take the in-flight slot.
    pub fn begin_save(&mut self, text: Option<String>) -> Result<SaveTicket, SaveSkip> {
        if self.in_flight {
            return Err(SaveSkip::InFlight);
        }

        let text = text.unwrap_or_else(|| self.body.clone());
        if text == self.baseline {
            return Err(SaveSkip::Unchanged);
        }

        self.in_flight = true;
        Ok(SaveTicket { text })
    }

    /// Release the slot; on success the ticket's text becomes the baseline.
    pub fn finish_save(&mut self, ticket: SaveTicket, succeeded: bool) {
        self.in_flight = false;
        if succeeded {
            self.baseline = ticket.text;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_clean() {
        let d = DraftState::new("Once upon a time");
        assert!(!d.is_dirty());
        assert!(!d.is_saving());
        assert_eq!(d.body(), d.baseline());
    }

    #[test]
    fn test_unchanged_text_is_skipped() {
        let mut d = DraftState::new("same");
        assert_eq!(d.begin_save(None), Err(SaveSkip::Unchanged));
        assert_eq!(d.begin_save(Some("same".into())), Err(SaveSkip::Unchanged));
        assert!(!d.is_saving());
    }

    #[test]
    fn test_explicit_text_wins_over_body() {
        let mut d = DraftState::new("");
        d.set_body("body");
        let ticket = d.begin_save(Some("explicit".into())).unwrap();
        assert_eq!(ticket.text(), "explicit");
    }

    #[test]
    fn test_second_save_while_in_flight_is_dropped() {
        let mut d = DraftState::new("");
        d.set_body("a");
        let ticket = d.begin_save(None).unwrap();
        d.set_body("ab");
        assert_eq!(d.begin_save(None), Err(SaveSkip::InFlight));

        d.finish_save(ticket, true);
        assert_eq!(d.baseline(), "a");
        assert!(d.is_dirty());
        assert!(d.begin_save(None).is_ok());
    }

    #[test]
    fn test_success_moves_baseline_to_sent_text() {
        let mut d = DraftState::new("");
        d.set_body("Hello");
        let ticket = d.begin_save(None).unwrap();
        d.finish_save(ticket, true);
        assert_eq!(d.baseline(), "Hello");
        assert!(!d.is_dirty());
        assert!(!d.is_saving());
    }

    #[test]
    fn test_failure_keeps_baseline_and_stays_dirty() {
        let mut d = DraftState::new("old");
        d.set_body("new");
        let ticket = d.begin_save(None).unwrap();
        d.finish_save(ticket, false);
        assert_eq!(d.baseline(), "old");
        assert!(d.is_dirty());
        assert!(!d.is_saving());
    }

    #[test]
    fn test_recovered_draft_is_dirty() {
        let d = DraftState::recovered("server", "local edits");
        assert!(d.is_dirty());
        assert_eq!(d.baseline(), "server");
        assert_eq!(d.body(), "local edits");
    }
}
