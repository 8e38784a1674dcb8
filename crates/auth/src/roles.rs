use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// The set is closed: only organizers may create, update or delete events.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Attendee,
    Organizer,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Attendee, Role::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Attendee => "attendee",
            Role::Organizer => "organizer",
        }
    }

    /// Parse a role name as it appears on the wire.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attendee" => Some(Role::Attendee),
            "organizer" => Some(Role::Organizer),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
