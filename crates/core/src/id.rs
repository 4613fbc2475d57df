//! Public resource identifiers (`user-xxxxxx`, `post-xxxxxx`).
//!
//! Rows keep their auto-increment primary key internally; clients only ever
//! see these prefixed codes.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const CODE_LEN: usize = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Post,
}

impl ResourceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Post => "post",
        }
    }

    /// Generate a fresh identifier for this kind of resource.
    pub fn new_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        format!("{}-{}", self.prefix(), code)
    }

    /// Whether `id` has the shape of an identifier of this kind.
    pub fn is_valid(&self, id: &str) -> bool {
        match id.strip_prefix(self.prefix()).and_then(|rest| rest.strip_prefix('-')) {
            Some(code) => {
                code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
            }
            None => false,
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.prefix())
    }
}
