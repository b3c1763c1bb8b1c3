//! Input validation shared by the account and catalog routes

use marketplace_db::MAX_CART_QUANTITY;

use crate::error::ApiError;

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed display/product name length
const MAX_NAME_LENGTH: usize = 128;

/// Trim and check an email address, returning the stored form
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email must not be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Email must contain '@'".to_string()));
    }
    Ok(email.to_string())
}

/// Validate a password for a new account.
///
/// Passwords are used verbatim, never trimmed, on both account creation and
/// login. Length is counted in characters.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.trim().is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    check_password_max(password)
}

fn check_password_max(password: &str) -> Result<(), ApiError> {
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Check login credentials. The email is trimmed; the password is returned
/// as given so it matches what was hashed at creation.
pub fn login_credentials<'a>(
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email must not be empty".to_string()));
    }
    if password.trim().is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    check_password_max(password)?;
    Ok((email, password))
}

/// Validate a display or product name, returning it trimmed
pub fn validate_name(name: &str, field: &str, required: bool) -> Result<String, ApiError> {
    let name = name.trim();
    if required && name.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

pub fn validate_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::BadRequest(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".to_string()));
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(ApiError::BadRequest(format!(
            "Quantity must not exceed {}",
            MAX_CART_QUANTITY
        )));
    }
    Ok(())
}
