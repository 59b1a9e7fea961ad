//! Who is drawing: the identity provider capability and session roles.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use crate::layer::ParticipantId;

/// The authenticated user of this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable unique id; keys the participant's layer.
    pub id: ParticipantId,
    pub email: String,
}

/// Session role. Only the game master may clear everyone's drawings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Player,
    Gm,
}

impl Role {
    /// Parse a stored role string. Anything but `gm` is a player.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("gm") { Self::Gm } else { Self::Player }
    }

    #[must_use]
    pub fn is_gm(self) -> bool {
        self == Self::Gm
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Gm => "gm",
        }
    }
}

/// Identity provider. The overlay only ever reads the current participant.
pub trait Identity {
    /// The signed-in participant, or `None` when signed out.
    fn current_participant(&self) -> Option<Participant>;
}

/// A fixed identity, for hosts that resolve the user once at start-up.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<Participant>);

impl Identity for StaticIdentity {
    fn current_participant(&self) -> Option<Participant> {
        self.0.clone()
    }
}
