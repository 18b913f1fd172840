use thiserror::Error;

/// Avatars larger than this are rejected before upload.
pub(crate) const MAX_AVATAR_BYTES: f64 = 2.0 * 1024.0 * 1024.0;

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// ISO-8601 timestamp in UTC, the format the backend stores in `updated_at`.
pub(crate) fn now_iso() -> String {
    js_sys::Date::new_0()
        .to_iso_string()
        .as_string()
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextStats {
    pub words: usize,
    pub chars: usize,
}

pub(crate) fn text_stats(text: &str) -> TextStats {
    TextStats {
        words: text.split_whitespace().count(),
        chars: text.chars().count(),
    }
}

/// Loose `local@domain.tld` check: no whitespace, exactly one `@`, and a dot in
/// the domain with something on both sides of it.
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rfind('.') {
        Some(dot) => {
            let (host, tld) = domain.split_at(dot);
            !host.is_empty() && tld.len() > 1
        }
        None => false,
    }
}

/// Default display name for a fresh profile.
pub(crate) fn username_from_email(email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Writer".to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum AvatarError {
    #[error("Only images are allowed")]
    NotAnImage,
    #[error("Image must be under 2MB")]
    TooLarge,
}

pub(crate) fn validate_avatar(content_type: &str, size_bytes: f64) -> Result<(), AvatarError> {
    if !content_type.starts_with("image/") {
        return Err(AvatarError::NotAnImage);
    }
    if size_bytes > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge);
    }
    Ok(())
}

/// Storage path for a user's avatar: `{user_id}/avatar.{ext}`.
pub(crate) fn avatar_path(user_id: &str, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png");
    format!("{user_id}/avatar.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_stats_ignores_surrounding_whitespace() {
        let stats = text_stats("  hello   world \n");
        assert_eq!(stats.words, 2);
        assert_eq!(stats.chars, 17);
    }

    #[test]
    fn test_text_stats_empty() {
        assert_eq!(text_stats(""), TextStats::default());
        assert_eq!(text_stats("   ").words, 0);
    }

    #[test]
    fn test_text_stats_counts_scalars_not_bytes() {
        assert_eq!(text_stats("café").chars, 4);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("writer@example.com"));
        assert!(is_valid_email("a.b@c.io"));
        assert!(!is_valid_email("writer@example"));
        assert!(!is_valid_email("writer example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@example."));
    }

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email(Some("jo@example.com")), "jo");
        assert_eq!(username_from_email(Some("@example.com")), "Writer");
        assert_eq!(username_from_email(None), "Writer");
    }

    #[test]
    fn test_validate_avatar() {
        assert_eq!(validate_avatar("image/png", 1024.0), Ok(()));
        assert_eq!(
            validate_avatar("application/pdf", 1024.0),
            Err(AvatarError::NotAnImage)
        );
        assert_eq!(
            validate_avatar("image/jpeg", MAX_AVATAR_BYTES + 1.0),
            Err(AvatarError::TooLarge)
        );
    }

    #[test]
    fn test_avatar_path_uses_extension() {
        assert_eq!(avatar_path("u1", "me.JPG"), "u1/avatar.JPG");
        assert_eq!(avatar_path("u1", "noext"), "u1/avatar.png");
    }
}
