use crate::models::{InviteStatus, MemberRole, NewMember};
use crate::util::is_valid_email;
use thiserror::Error;

/// Team size cap, owner included.
pub(crate) const MAX_TEAM_SIZE: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum InviteError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("This email is already added")]
    Duplicate,
    #[error("You can only add {} writers", MAX_TEAM_SIZE - 1)]
    TeamFull,
    #[error("This invite was already {0}")]
    AlreadyResolved(InviteStatus),
}

/// Emails collected on the new-project form, lowercased and unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct InviteList {
    emails: Vec<String>,
}

impl InviteList {
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn capacity_left(&self) -> usize {
        (MAX_TEAM_SIZE - 1).saturating_sub(self.emails.len())
    }

    pub fn add(&mut self, email: &str) -> Result<(), InviteError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(InviteError::InvalidEmail);
        }

        let email = email.to_lowercase();
        if self.emails.contains(&email) {
            return Err(InviteError::Duplicate);
        }
        if self.capacity_left() == 0 {
            return Err(InviteError::TeamFull);
        }

        self.emails.push(email);
        Ok(())
    }

    pub fn remove(&mut self, email: &str) {
        self.emails.retain(|e| e != email);
    }

    /// Pending `project_members` rows for everyone on the list.
    pub fn to_rows(&self, project_id: &str, invited_by: &str) -> Vec<NewMember> {
        self.emails
            .iter()
            .map(|email| NewMember {
                project_id: project_id.to_string(),
                user_id: None,
                invited_email: email.clone(),
                role: MemberRole::Editor,
                status: InviteStatus::Pending,
                invited_by: invited_by.to_string(),
            })
            .collect()
    }
}

/// Membership row for the creator of a team project.
pub(crate) fn owner_row(project_id: &str, user_id: &str, email: Option<&str>) -> NewMember {
    NewMember {
        project_id: project_id.to_string(),
        user_id: Some(user_id.to_string()),
        invited_email: email.unwrap_or_default().to_lowercase(),
        role: MemberRole::Owner,
        status: InviteStatus::Accepted,
        invited_by: user_id.to_string(),
    }
}

/// Answer a pending invite. Settled invites stay settled.
pub(crate) fn respond(current: InviteStatus, accept: bool) -> Result<InviteStatus, InviteError> {
    match current {
        InviteStatus::Pending if accept => Ok(InviteStatus::Accepted),
        InviteStatus::Pending => Ok(InviteStatus::Rejected),
        settled => Err(InviteError::AlreadyResolved(settled)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_normalizes_and_dedupes() {
        let mut list = InviteList::default();
        list.add("  Ada@Example.com ").unwrap();
        assert_eq!(list.emails(), ["ada@example.com".to_string()]);
        assert_eq!(list.add("ADA@example.com"), Err(InviteError::Duplicate));
    }

    #[test]
    fn test_add_rejects_invalid_email() {
        let mut list = InviteList::default();
        assert_eq!(list.add("not-an-email"), Err(InviteError::InvalidEmail));
        assert_eq!(list.add(""), Err(InviteError::InvalidEmail));
        assert!(list.is_empty());
    }

    #[test]
    fn test_team_cap_includes_owner() {
        let mut list = InviteList::default();
        list.add("a@x.io").unwrap();
        list.add("b@x.io").unwrap();
        list.add("c@x.io").unwrap();
        assert_eq!(list.capacity_left(), 0);
        assert_eq!(list.add("d@x.io"), Err(InviteError::TeamFull));
        assert_eq!(InviteError::TeamFull.to_string(), "You can only add 3 writers");

        list.remove("b@x.io");
        assert_eq!(list.len(), 2);
        assert!(list.add("d@x.io").is_ok());
    }

    #[test]
    fn test_rows_are_pending_editors() {
        let mut list = InviteList::default();
        list.add("a@x.io").unwrap();
        let rows = list.to_rows("p1", "owner");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, InviteStatus::Pending);
        assert_eq!(rows[0].role, MemberRole::Editor);
        assert_eq!(rows[0].user_id, None);
        assert_eq!(rows[0].invited_by, "owner");
    }

    #[test]
    fn test_owner_row_is_accepted() {
        let row = owner_row("p1", "u1", Some("Owner@X.io"));
        assert_eq!(row.role, MemberRole::Owner);
        assert_eq!(row.status, InviteStatus::Accepted);
        assert_eq!(row.invited_email, "owner@x.io");
        assert_eq!(row.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_only_pending_invites_transition() {
        assert_eq!(respond(InviteStatus::Pending, true), Ok(InviteStatus::Accepted));
        assert_eq!(respond(InviteStatus::Pending, false), Ok(InviteStatus::Rejected));
        assert_eq!(
            respond(InviteStatus::Accepted, false),
            Err(InviteError::AlreadyResolved(InviteStatus::Accepted))
        );
        assert_eq!(
            respond(InviteStatus::Rejected, true),
            Err(InviteError::AlreadyResolved(InviteStatus::Rejected))
        );
    }
}
