//! The records the console reads from and writes to the backend.

mod client;
mod invitation;
mod user;

pub use client::{
    AlternateContact, Client, ClientForm, ClientUpdate, CreateClientResponse,
};
pub use invitation::{Invitation, InvitationStatus, NewInvitation};
pub use user::{User, UserUpdate, UsersPage};

use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The access level a user (or an invitation) grants.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    CoAdmin,
    Supervisor,
    Designer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::User,
        Role::Admin,
        Role::CoAdmin,
        Role::Supervisor,
        Role::Designer,
    ];

    /// The identifier the backend uses.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::CoAdmin => "CO_ADMIN",
            Role::Supervisor => "SUPERVISOR",
            Role::Designer => "DESIGNER",
        }
    }

    /// A human-friendly name.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::CoAdmin => "Co Admin",
            Role::Supervisor => "Supervisor",
            Role::Designer => "Designer",
        }
    }
}

impl Default for Role {
    fn default() -> Self { Role::User }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Role, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a known role")]
pub struct UnknownRole(pub String);
