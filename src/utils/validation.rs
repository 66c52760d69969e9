use crate::utils::error::{ApiError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 驗證 MIME 類型格式 (type/subtype，不含參數)
pub fn validate_mime_type(field_name: &str, mime: &str) -> Result<()> {
    let mime = mime.trim();
    let invalid = |reason: &str| ApiError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: mime.to_string(),
        reason: reason.to_string(),
    };

    if mime.is_empty() {
        return Err(invalid("MIME type cannot be empty"));
    }

    match mime.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => {
            if mime.contains(';') {
                return Err(invalid("MIME type must not carry parameters"));
            }
            if kind == "*" || subtype == "*" {
                return Err(invalid("Wildcards are not registrable media types"));
            }
            if mime.chars().any(char::is_whitespace) {
                return Err(invalid("MIME type contains whitespace"));
            }
            Ok(())
        }
        _ => Err(invalid("Expected the form type/subtype")),
    }
}

pub fn validate_scheme_name(field_name: &str, scheme: &str) -> Result<()> {
    validate_non_empty_string(field_name, scheme)?;
    if !scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: scheme.to_string(),
            reason: "Scheme names may only contain letters, digits, '_' and '-'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(ApiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be one of: {}", allowed.join(", ")),
        });
    }
    Ok(())
}
