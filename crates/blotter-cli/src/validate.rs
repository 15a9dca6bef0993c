use crate::output::ResponseBody;
use blotter_core::error::ErrorCode;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 32;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_CATEGORY_LEN: usize = 50;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn to_response(&self) -> ResponseBody<()> {
        ResponseBody::error_code(
            ErrorCode::InvalidInput,
            format!("invalid {} '{}': {}", self.field, self.value, self.reason),
        )
    }
}

pub fn validate_title(s: &str) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::new("title", s, "must not be empty"));
    }
    if s.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::new(
            "title",
            s,
            format!("must be <= {MAX_TITLE_LEN} characters"),
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "title",
            s,
            "must not contain control characters",
        ));
    }
    Ok(())
}

pub fn validate_user_name(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() || s.trim() != s {
        return Err(ValidationError::new(
            "name",
            s,
            "must be non-empty with no surrounding whitespace",
        ));
    }
    if s.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            s,
            format!("must be <= {MAX_NAME_LEN} characters"),
        ));
    }
    if !s
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::new(
            "name",
            s,
            "only letters, digits, '_', '-', and '.' are allowed",
        ));
    }
    Ok(())
}

pub fn validate_email(s: &str) -> Result<(), ValidationError> {
    if s.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::new(
            "email",
            s,
            format!("must be <= {MAX_EMAIL_LEN} bytes"),
        ));
    }
    let Some((local, domain)) = s.split_once('@') else {
        return Err(ValidationError::new("email", s, "missing '@'"));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::new(
            "email",
            s,
            "expected exactly one '@' between non-empty parts",
        ));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::new("email", s, "domain looks incomplete"));
    }
    if s.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("email", s, "must not contain whitespace"));
    }
    Ok(())
}

pub fn validate_category(s: &str) -> Result<(), ValidationError> {
    if s.chars().count() > MAX_CATEGORY_LEN {
        return Err(ValidationError::new(
            "category",
            s,
            format!("must be <= {MAX_CATEGORY_LEN} characters"),
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "category",
            s,
            "must not contain control characters",
        ));
    }
    Ok(())
}

pub fn validate_article_id(id: i64) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::new(
            "article id",
            id.to_string(),
            "must be a positive integer",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_rules() {
        assert!(validate_title("Hello, world").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("bad\ttitle").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_user_name("ada_lovelace").is_ok());
        assert!(validate_user_name(" ada").is_err());
        assert!(validate_user_name("ada lovelace").is_err());
        assert!(validate_user_name("").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("a da@example.com").is_err());
    }

    #[test]
    fn article_id_must_be_positive() {
        assert!(validate_article_id(1).is_ok());
        assert!(validate_article_id(0).is_err());
        assert!(validate_article_id(-7).is_err());
    }

    #[test]
    fn validation_response_uses_invalid_input_code() {
        let err = validate_title("").expect_err("empty");
        let body = err.to_response();
        assert_eq!(body.code, ErrorCode::InvalidInput.number());
        assert!(body.message.contains("title"));
    }
}
