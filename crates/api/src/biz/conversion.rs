//! Row model → wire type conversions.

use chrono::{DateTime, SecondsFormat, Utc};

use fastblog_store::{PostM, UserM};

use crate::pb::v1;

pub fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn user_to_pb(user: &UserM, post_count: i64) -> v1::User {
    v1::User {
        user_id: user.user_id.clone(),
        username: user.username.clone(),
        nickname: user.nickname.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        post_count,
        created_at: format_time(user.created_at),
        updated_at: format_time(user.updated_at),
    }
}

pub fn post_to_pb(post: &PostM) -> v1::Post {
    v1::Post {
        post_id: post.post_id.clone(),
        user_id: post.user_id.clone(),
        title: post.title.clone(),
        content: post.content.clone(),
        created_at: format_time(post.created_at),
        updated_at: format_time(post.updated_at),
    }
}
