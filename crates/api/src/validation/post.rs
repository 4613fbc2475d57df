use fastblog_core::{Errorx, RequestContext};

use crate::pb::v1::{CreatePostRequest, DeletePostRequest, GetPostRequest, ListPostRequest, UpdatePostRequest};

use super::{char_len, invalid, require_user, validate_page};

const TITLE_MAX: usize = 256;

fn check_title(title: &str) -> Result<(), Errorx> {
    if title.trim().is_empty() {
        return Err(invalid("title cannot be empty"));
    }
    if char_len(title) > TITLE_MAX {
        return Err(invalid("title cannot exceed 256 characters"));
    }
    Ok(())
}

fn check_post_id(post_id: &str) -> Result<(), Errorx> {
    if post_id.is_empty() {
        return Err(invalid("post ID cannot be empty"));
    }
    Ok(())
}

pub fn validate_create_post_request(ctx: &RequestContext, rq: &CreatePostRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    check_title(&rq.title)
}

pub fn validate_update_post_request(ctx: &RequestContext, rq: &UpdatePostRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    check_post_id(&rq.post_id)?;
    if let Some(title) = rq.title.as_deref() {
        check_title(title)?;
    }
    Ok(())
}

pub fn validate_delete_post_request(ctx: &RequestContext, rq: &DeletePostRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    if rq.post_ids.is_empty() {
        return Err(invalid("postIDs cannot be empty"));
    }
    rq.post_ids.iter().try_for_each(|id| check_post_id(id))
}

pub fn validate_get_post_request(ctx: &RequestContext, rq: &GetPostRequest) -> Result<(), Errorx> {
    require_user(ctx)?;
    check_post_id(&rq.post_id)
}

pub fn validate_list_post_request(_: &RequestContext, rq: &ListPostRequest) -> Result<(), Errorx> {
    validate_page(rq.offset, rq.limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed() -> RequestContext {
        RequestContext::new("test").with_user_id("user-abc123")
    }

    #[test]
    fn title_is_required_on_create() {
        let rq = CreatePostRequest { title: " ".into(), content: "body".into() };
        assert!(validate_create_post_request(&authed(), &rq).is_err());
    }

    #[test]
    fn update_without_title_is_fine() {
        let rq = UpdatePostRequest { post_id: "post-abc123".into(), title: None, content: Some("x".into()) };
        assert_eq!(validate_update_post_request(&authed(), &rq), Ok(()));
    }

    #[test]
    fn delete_needs_ids() {
        let err = validate_delete_post_request(&authed(), &DeletePostRequest::default()).unwrap_err();
        assert_eq!(err.message(), "postIDs cannot be empty");
    }
}
