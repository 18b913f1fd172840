use crate::models::Comment;
use std::collections::HashMap;

/// A top-level comment and its direct replies, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Rebuild threads from the flat, `created_at`-ordered list.
///
/// Replies only attach to top-level comments; a reply whose parent is itself a
/// reply (or missing) is not shown.
pub(crate) fn build_threads(flat: Vec<Comment>) -> Vec<CommentThread> {
    let mut top_level: Vec<Comment> = Vec::new();
    let mut replies: HashMap<String, Vec<Comment>> = HashMap::new();

    for c in flat {
        match c.parent_id.clone() {
            None => top_level.push(c),
            Some(parent) => replies.entry(parent).or_default().push(c),
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = replies.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

/// Threads to display; resolved ones only when asked for.
pub(crate) fn visible_threads(threads: &[CommentThread], show_resolved: bool) -> Vec<CommentThread> {
    threads
        .iter()
        .filter(|t| show_resolved || !t.comment.resolved)
        .cloned()
        .collect()
}

/// Authors can delete their own comments; project owners can delete any.
pub(crate) fn can_delete(comment: &Comment, current_user_id: &str, is_project_owner: bool) -> bool {
    is_project_owner || comment.user_id == current_user_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>, user: &str) -> Comment {
        Comment {
            id: id.to_string(),
            phase_id: "ph".to_string(),
            user_id: user.to_string(),
            content: format!("body {id}"),
            parent_id: parent.map(str::to_string),
            resolved: false,
            created_at: String::new(),
            profiles: None,
        }
    }

    #[test]
    fn test_replies_attach_in_order() {
        let threads = build_threads(vec![
            comment("a", None, "u1"),
            comment("b", None, "u2"),
            comment("a1", Some("a"), "u2"),
            comment("b1", Some("b"), "u1"),
            comment("a2", Some("a"), "u1"),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, "a");
        let a_replies: Vec<&str> = threads[0].replies.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(a_replies, vec!["a1", "a2"]);
        assert_eq!(threads[1].replies.len(), 1);
    }

    #[test]
    fn test_nested_and_orphan_replies_are_dropped() {
        let threads = build_threads(vec![
            comment("a", None, "u1"),
            comment("a1", Some("a"), "u1"),
            comment("a1x", Some("a1"), "u1"),
            comment("gone", Some("deleted"), "u1"),
        ]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].id, "a1");
    }

    #[test]
    fn test_resolved_threads_hidden_by_default() {
        let mut resolved = comment("r", None, "u1");
        resolved.resolved = true;
        let threads = build_threads(vec![comment("open", None, "u1"), resolved]);

        let shown = visible_threads(&threads, false);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].comment.id, "open");
        assert_eq!(visible_threads(&threads, true).len(), 2);
    }

    #[test]
    fn test_delete_permission() {
        let c = comment("a", None, "author");
        assert!(can_delete(&c, "author", false));
        assert!(can_delete(&c, "someone", true));
        assert!(!can_delete(&c, "someone", false));
    }
}
