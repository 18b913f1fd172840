use super::{eq, ApiClient, ApiError, ApiResult};
use crate::models::{
    AuthUser, Comment, InviteStatus, Module, NewMember, Phase, Profile, Project, ProjectMember,
};
use crate::util::username_from_email;
use serde::{Deserialize, Serialize};

const MEMBER_COLUMNS: &str =
    "id,project_id,user_id,invited_email,role,status,invited_by,created_at,profiles(username,avatar_url)";
const PHASE_COLUMNS: &str = "*,profiles:assigned_to(username,avatar_url)";
const COMMENT_COLUMNS: &str =
    "id,phase_id,user_id,content,parent_id,resolved,created_at,profiles(username,avatar_url)";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NewProject {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub is_team: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct NewModule {
    project_id: String,
    title: String,
    description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NewPhase {
    pub module_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NewComment {
    pub phase_id: String,
    pub user_id: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub resolved: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PhaseContentUpdate<'a> {
    content: &'a str,
    updated_at: &'a str,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct InviteResponseUpdate {
    status: InviteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

/// `project_members` row with its project embedded.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct MembershipRow {
    #[serde(default)]
    projects: Option<Project>,
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn require_title(title: &str) -> ApiResult<String> {
    non_empty(title).ok_or_else(|| ApiError::validation("Title is required"))
}

/// Owned projects first, then joined ones; each project once, newest first.
pub(crate) fn merge_projects(owned: Vec<Project>, joined: Vec<Project>) -> Vec<Project> {
    let mut out: Vec<Project> = Vec::with_capacity(owned.len() + joined.len());
    for p in owned.into_iter().chain(joined) {
        if !out.iter().any(|x| x.id == p.id) {
            out.push(p);
        }
    }
    // ISO-8601 timestamps sort lexicographically.
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

impl ApiClient {
    // --- profiles ---

    pub async fn get_profile(&self, user_id: &str) -> ApiResult<Option<Profile>> {
        let rows: Vec<Profile> = self
            .rest_select(
                "profiles",
                &[("select", "id,username,avatar_url".into()), ("id", eq(user_id))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Load the user's profile, creating it on first sign-in. Falls back to an
    /// unsaved profile when the insert is refused.
    pub async fn ensure_profile(&self, user: &AuthUser) -> Profile {
        match self.get_profile(&user.id).await {
            Ok(Some(p)) => return p,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "profile lookup failed"),
        }

        let fresh = Profile {
            id: user.id.clone(),
            username: username_from_email(user.email.as_deref()),
            avatar_url: None,
        };
        tracing::info!(user_id = %user.id, "creating profile");

        match self.rest_insert::<Profile>("profiles", &fresh).await {
            Ok(rows) => rows.into_iter().next().unwrap_or(fresh),
            Err(e) => {
                tracing::error!(error = %e, "failed to create profile");
                fresh
            }
        }
    }

    pub async fn update_avatar_url(&self, user_id: &str, url: &str) -> ApiResult<()> {
        self.rest_update::<Profile>(
            "profiles",
            &[("id", eq(user_id))],
            &serde_json::json!({ "avatar_url": url }),
        )
        .await
        .map(|_| ())
    }

    /// Upload (or replace) an avatar object and return its public URL.
    pub async fn upload_avatar(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<String> {
        let encoded = encode_path(path);
        let req = self
            .builder(
                reqwest::Method::POST,
                &format!("/storage/v1/object/avatars/{encoded}"),
            )
            .header("x-upsert", "true")
            .header("cache-control", "max-age=3600")
            .header("content-type", content_type)
            .body(bytes);
        Self::execute(req).await?;
        Ok(self.public_avatar_url(path))
    }

    pub fn public_avatar_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/avatars/{}",
            self.base_url,
            encode_path(path)
        )
    }

    // --- projects ---

    pub async fn list_projects_for_user(&self, user_id: &str) -> ApiResult<Vec<Project>> {
        let owned: Vec<Project> = self
            .rest_select(
                "projects",
                &[
                    ("select", "*".into()),
                    ("owner_id", eq(user_id)),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;

        let joined: Vec<MembershipRow> = self
            .rest_select(
                "project_members",
                &[
                    ("select", "projects(*)".into()),
                    ("user_id", eq(user_id)),
                    ("status", eq(InviteStatus::Accepted.as_ref())),
                ],
            )
            .await?;

        Ok(merge_projects(
            owned,
            joined.into_iter().filter_map(|m| m.projects).collect(),
        ))
    }

    pub async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.rest_select_one("projects", &[("select", "*".into()), ("id", eq(project_id))])
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> ApiResult<Project> {
        let project = NewProject {
            title: require_title(&project.title)?,
            description: project.description.trim().to_string(),
            ..project.clone()
        };
        self.rest_insert::<Project>("projects", &project)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::parse("project insert returned no row"))
    }

    // --- members & invites ---

    pub async fn add_members(&self, rows: &[NewMember]) -> ApiResult<Vec<ProjectMember>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        self.rest_insert("project_members", &rows).await
    }

    pub async fn list_accepted_members(&self, project_id: &str) -> ApiResult<Vec<ProjectMember>> {
        self.rest_select(
            "project_members",
            &[
                ("select", MEMBER_COLUMNS.into()),
                ("project_id", eq(project_id)),
                ("status", eq(InviteStatus::Accepted.as_ref())),
            ],
        )
        .await
    }

    pub async fn list_pending_invites(&self, email: &str) -> ApiResult<Vec<ProjectMember>> {
        self.rest_select(
            "project_members",
            &[
                ("select", "*,projects(title)".into()),
                ("invited_email", eq(&email.trim().to_lowercase())),
                ("status", eq(InviteStatus::Pending.as_ref())),
            ],
        )
        .await
    }

    /// Write an invite transition. `user_id` binds the row to the acceptor.
    pub async fn set_invite_status(
        &self,
        invite_id: &str,
        status: InviteStatus,
        user_id: Option<&str>,
    ) -> ApiResult<()> {
        let rows: Vec<ProjectMember> = self
            .rest_update(
                "project_members",
                &[("id", eq(invite_id))],
                &InviteResponseUpdate {
                    status,
                    user_id: user_id.map(str::to_string),
                },
            )
            .await?;
        if rows.is_empty() {
            return Err(ApiError::Forbidden("invite".to_string()));
        }
        Ok(())
    }

    // --- modules ---

    pub async fn list_modules(&self, project_id: &str) -> ApiResult<Vec<Module>> {
        self.rest_select(
            "modules",
            &[
                ("select", "*".into()),
                ("project_id", eq(project_id)),
                ("order", "created_at.asc".into()),
            ],
        )
        .await
    }

    pub async fn get_module(&self, module_id: &str) -> ApiResult<Module> {
        self.rest_select_one("modules", &[("select", "*".into()), ("id", eq(module_id))])
            .await
    }

    pub async fn create_module(
        &self,
        project_id: &str,
        title: &str,
        description: &str,
    ) -> ApiResult<Module> {
        let body = NewModule {
            project_id: project_id.to_string(),
            title: require_title(title)?,
            description: non_empty(description),
        };
        self.rest_insert::<Module>("modules", &body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::parse("module insert returned no row"))
    }

    // --- phases ---

    pub async fn list_phases(&self, module_id: &str) -> ApiResult<Vec<Phase>> {
        self.rest_select(
            "phases",
            &[
                ("select", PHASE_COLUMNS.into()),
                ("module_id", eq(module_id)),
                ("order", "created_at.asc".into()),
            ],
        )
        .await
    }

    pub async fn get_phase(&self, phase_id: &str) -> ApiResult<Phase> {
        self.rest_select_one("phases", &[("select", "*".into()), ("id", eq(phase_id))])
            .await
    }

    pub async fn create_phase(&self, phase: &NewPhase) -> ApiResult<Phase> {
        let body = NewPhase {
            module_id: phase.module_id.clone(),
            title: require_title(&phase.title)?,
            description: phase.description.as_deref().and_then(non_empty),
            assigned_to: phase.assigned_to.as_deref().and_then(non_empty),
            content: String::new(),
        };
        self.rest_insert::<Phase>("phases", &body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::parse("phase insert returned no row"))
    }

    pub async fn delete_phase(&self, phase_id: &str) -> ApiResult<()> {
        self.rest_delete("phases", &[("id", eq(phase_id))]).await
    }

    /// Unconditional overwrite of the phase body (last write wins).
    pub async fn update_phase_content(
        &self,
        phase_id: &str,
        content: &str,
        updated_at: &str,
    ) -> ApiResult<Vec<Phase>> {
        self.rest_update(
            "phases",
            &[("id", eq(phase_id))],
            &PhaseContentUpdate {
                content,
                updated_at,
            },
        )
        .await
    }

    // --- comments ---

    pub async fn list_comments(&self, phase_id: &str) -> ApiResult<Vec<Comment>> {
        self.rest_select(
            "comments",
            &[
                ("select", COMMENT_COLUMNS.into()),
                ("phase_id", eq(phase_id)),
                ("order", "created_at.asc".into()),
            ],
        )
        .await
    }

    pub async fn add_comment(&self, comment: &NewComment) -> ApiResult<()> {
        let content = non_empty(&comment.content)
            .ok_or_else(|| ApiError::validation("Comment cannot be empty"))?;
        let body = NewComment {
            content,
            ..comment.clone()
        };
        self.rest_insert::<Comment>("comments", &body)
            .await
            .map(|_| ())
    }

    pub async fn set_comment_resolved(&self, comment_id: &str, resolved: bool) -> ApiResult<()> {
        self.rest_update::<Comment>(
            "comments",
            &[("id", eq(comment_id))],
            &serde_json::json!({ "resolved": resolved }),
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_comment(&self, comment_id: &str) -> ApiResult<()> {
        self.rest_delete("comments", &[("id", eq(comment_id))]).await
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
