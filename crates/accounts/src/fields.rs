//! Field validators shared by the record inputs.
//!
//! Each validator records messages into a [`FieldErrors`] and returns the
//! normalized value when the field is acceptable.

use prediction_core::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const GROUP_NAME_TAKEN: &str = "group with this name already exists.";
pub const UNKNOWN_GROUP: &str = "Invalid hyperlink - Object does not exist.";

pub const USERNAME_MAX_LEN: usize = 150;
pub const GROUP_NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Trimmed, non-blank text of bounded length.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if value.chars().count() > max {
        errors.add(field, max_length_message(max));
        return None;
    }
    Some(value.to_string())
}

pub fn username(errors: &mut FieldErrors, value: Option<String>) -> Option<String> {
    let value = required_text(errors, "username", value, USERNAME_MAX_LEN)?;
    if !value.chars().all(is_username_char) {
        errors.add("username", INVALID_USERNAME);
        return None;
    }
    Some(value)
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

/// Optional email; blank is allowed and stored as the empty string.
pub fn email(errors: &mut FieldErrors, value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return Some(String::new());
    }
    if value.chars().count() > EMAIL_MAX_LEN {
        errors.add("email", max_length_message(EMAIL_MAX_LEN));
        return None;
    }
    if !looks_like_email(value) {
        errors.add("email", INVALID_EMAIL);
        return None;
    }
    Some(value.to_string())
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|label| {
        !label.is_empty() && !label.starts_with('-') && !label.ends_with('-')
    })
}

/// Collapse duplicate references, keeping first-seen order.
pub fn dedup_refs<T: PartialEq + Copy>(refs: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(refs.len());
    for r in refs {
        if !out.contains(&r) {
            out.push(r);
        }
    }
    out
}
