use fastblog_core::{Errorx, RequestContext};

use crate::pb::v1::{
    ChangePasswordRequest, CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUserRequest,
    LoginRequest, RefreshTokenRequest, UpdateUserRequest,
};

use super::{char_len, invalid, require_user, validate_page};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 4..=32;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=64;
const NICKNAME_MAX: usize = 32;

fn check_username(username: &str) -> Result<(), Errorx> {
    let well_formed = USERNAME_LEN.contains(&char_len(username))
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !well_formed {
        return Err(Errorx::USERNAME_INVALID);
    }
    Ok(())
}

fn check_password(field: &str, password: &str) -> Result<(), Errorx> {
    if password.is_empty() {
        return Err(invalid(&format!("{field} cannot be empty")));
    }
    if !PASSWORD_LEN.contains(&char_len(password)) {
        return Err(invalid(&format!("{field} must be between 8 and 64 characters")));
    }
    Ok(())
}

fn check_nickname(nickname: &str) -> Result<(), Errorx> {
    if char_len(nickname) > NICKNAME_MAX {
        return Err(invalid("nickname cannot exceed 32 characters"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), Errorx> {
    if email.trim().is_empty() {
        return Err(invalid("email cannot be empty"));
    }
    if !email.contains('@') {
        return Err(invalid("email is not a valid address"));
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<(), Errorx> {
    if phone.trim().is_empty() {
        return Err(invalid("phone number cannot be empty"));
    }
    Ok(())
}

pub fn validate_login_request(_: &RequestContext, rq: &LoginRequest) -> Result<(), Errorx> {
    check_username(&rq.username)?;
    check_password("password", &rq.password)
}

pub fn validate_refresh_token_request(ctx: &RequestContext, _: &RefreshTokenRequest) -> Result<(), Errorx> {
    require_user(ctx)
}

pub fn validate_change_password_request(ctx: &RequestContext, rq: &ChangePasswordRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    check_password("old password", &rq.old_password)?;
    check_password("new password", &rq.new_password)
}

pub fn validate_create_user_request(_: &RequestContext, rq: &CreateUserRequest) -> Result<(), Errorx> {
    check_username(&rq.username)?;
    check_password("password", &rq.password)?;
    if let Some(nickname) = rq.nickname.as_deref() {
        check_nickname(nickname)?;
    }
    check_email(&rq.email)?;
    check_phone(&rq.phone)
}

/// Only fields present in the request are checked.
pub fn validate_update_user_request(ctx: &RequestContext, rq: &UpdateUserRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    if let Some(username) = rq.username.as_deref() {
        check_username(username)?;
    }
    if let Some(nickname) = rq.nickname.as_deref() {
        check_nickname(nickname)?;
    }
    if let Some(email) = rq.email.as_deref() {
        check_email(email)?;
    }
    if let Some(phone) = rq.phone.as_deref() {
        check_phone(phone)?;
    }
    Ok(())
}

pub fn validate_delete_user_request(ctx: &RequestContext, _: &DeleteUserRequest) -> Result<(), Errorx> {
    require_user(ctx)
}

pub fn validate_get_user_request(ctx: &RequestContext, _: &GetUserRequest) -> Result<(), Errorx> {
    require_user(ctx)
}

pub fn validate_list_user_request(_: &RequestContext, rq: &ListUserRequest) -> Result<(), Errorx> {
    validate_page(rq.offset, rq.limit)
}
