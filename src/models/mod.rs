use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Authenticated user as returned by the auth endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Profile columns embedded into other rows (`profiles(username, avatar_url)`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProfileSummary {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: String,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum MemberRole {
    Owner,
    Editor,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A `project_members` row; pending rows are invites.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ProjectMember {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub invited_email: String,
    pub role: MemberRole,
    pub status: InviteStatus,
    #[serde(default)]
    pub invited_by: Option<String>,
    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub profiles: Option<ProfileSummary>,
    /// Embedded `projects(title)` for incoming invites.
    #[serde(default)]
    pub projects: Option<ProjectTitle>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProjectTitle {
    #[serde(default)]
    pub title: String,
}

/// Insert payload for `project_members`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NewMember {
    pub project_id: String,
    pub user_id: Option<String>,
    pub invited_email: String,
    pub role: MemberRole,
    pub status: InviteStatus,
    pub invited_by: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Module {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// A chapter/episode: the document the editor writes into.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Phase {
    pub id: String,
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,

    /// Embedded assignee profile, when selected.
    #[serde(default)]
    pub profiles: Option<ProfileSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Comment {
    pub id: String,
    pub phase_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub profiles: Option<ProfileSummary>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.profiles
            .as_ref()
            .map(|p| p.username.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_row_with_null_content_deserializes() {
        let json = r#"{
            "id": "ph1",
            "module_id": "m1",
            "title": "Chapter One",
            "description": null,
            "content": null,
            "assigned_to": "u2",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }"#;
        let phase: Phase = serde_json::from_str(json).expect("phase should parse");
        assert_eq!(phase.content, None);
        assert_eq!(phase.assigned_to.as_deref(), Some("u2"));
        assert!(phase.profiles.is_none());
    }

    #[test]
    fn test_member_status_and_role_are_lowercase() {
        let json = r#"{
            "id": "pm1",
            "project_id": "p1",
            "user_id": null,
            "invited_email": "a@b.co",
            "role": "editor",
            "status": "pending",
            "projects": {"title": "Saga"}
        }"#;
        let m: ProjectMember = serde_json::from_str(json).expect("member should parse");
        assert_eq!(m.status, InviteStatus::Pending);
        assert_eq!(m.role, MemberRole::Editor);
        assert_eq!(m.projects.map(|p| p.title).as_deref(), Some("Saga"));

        let v = serde_json::to_value(InviteStatus::Accepted).unwrap();
        assert_eq!(v, "accepted");
        assert_eq!(MemberRole::Owner.as_ref(), "owner");
    }

    #[test]
    fn test_comment_author_name_falls_back() {
        let json = r#"{
            "id": "c1",
            "phase_id": "ph1",
            "user_id": "u1",
            "content": "nice",
            "parent_id": null,
            "resolved": false,
            "created_at": "2024-01-01T00:00:00Z",
            "profiles": null
        }"#;
        let c: Comment = serde_json::from_str(json).expect("comment should parse");
        assert_eq!(c.author_name(), "Unknown");
    }

    #[test]
    fn test_session_contract_deserialize() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {"id": "u1", "email": "w@example.com", "aud": "authenticated"}
        }"#;
        let s: Session = serde_json::from_str(json).expect("session should parse");
        assert_eq!(s.user.id, "u1");
        assert_eq!(s.user.email.as_deref(), Some("w@example.com"));
    }
}
