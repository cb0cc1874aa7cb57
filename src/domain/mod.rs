//! Domain types for the cookbook with strong typing.
//!
//! Identifier newtypes keep recipe, comment and account ids from being mixed
//! up, and [`SessionContext`] carries the caller's identity into every
//! operation that needs it.

pub mod comment_tree;
pub mod reset;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let id = i32::deserialize(deserializer)?;
                Ok(Self::new(id))
            }
        }
    };
}

id_newtype!(
    /// Primary key of an account.
    UserId
);

id_newtype!(
    /// Primary key of a recipe.
    RecipeId
);

id_newtype!(
    /// Primary key of a comment or reply.
    CommentId
);

/// The authenticated account as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Per-request identity, handed explicitly to the operations that need it.
///
/// An anonymous visitor is `SessionContext::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user: Option<SessionUser>,
}

impl SessionContext {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    #[must_use]
    pub const fn authenticated(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> SessionUser {
        SessionUser {
            id: UserId::new(7),
            name: "Anna".to_string(),
            email: "anna@example.com".to_string(),
            is_admin,
        }
    }

    #[test]
    fn id_conversions() {
        let id = RecipeId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(RecipeId::from(42), id);
    }

    #[test]
    fn id_serialization() {
        let id = CommentId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let back: CommentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn anonymous_context_has_no_rights() {
        let ctx = SessionContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert!(!ctx.is_admin());
        assert_eq!(ctx.current_user_id(), None);
    }

    #[test]
    fn admin_flag_follows_user() {
        let plain = SessionContext::authenticated(user(false));
        assert!(plain.is_authenticated());
        assert!(!plain.is_admin());
        assert_eq!(plain.current_user_id(), Some(UserId::new(7)));

        let admin = SessionContext::authenticated(user(true));
        assert!(admin.is_admin());
    }
}
