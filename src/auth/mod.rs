//! Sign-in primitives: password hashing and session tokens.
//!
//! Tokens are opaque random strings stored server-side in `auth_sessions`;
//! the database resolves them back to a user on every request.

mod password;

pub use password::{hash_password, verify_password};

use uuid::Uuid;

/// A fresh opaque bearer token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_long_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
