use crate::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// In-session edits applied to the card at the current position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CardAction {
    ShuffleAnywhere,
    ShuffleTopN,
    ReplaceSameType,
    IntroduceSentry,
}

impl CardAction {
    pub const ALL: [CardAction; 4] = [
        CardAction::ShuffleAnywhere,
        CardAction::ShuffleTopN,
        CardAction::ReplaceSameType,
        CardAction::IntroduceSentry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ShuffleAnywhere => "shuffleAnywhere",
            Self::ShuffleTopN => "shuffleTopN",
            Self::ReplaceSameType => "replaceSameType",
            Self::IntroduceSentry => "introduceSentry",
        }
    }
}

impl fmt::Display for CardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardAction {
    type Err = SessionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "shuffleAnywhere" | "shuffle_anywhere" => Ok(Self::ShuffleAnywhere),
            "shuffleTopN" | "shuffle_top_n" => Ok(Self::ShuffleTopN),
            "replaceSameType" | "replace_same_type" => Ok(Self::ReplaceSameType),
            "introduceSentry" | "introduce_sentry" => Ok(Self::IntroduceSentry),
            other => Err(SessionError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for action in CardAction::ALL {
            assert_eq!(action.name().parse::<CardAction>().ok(), Some(action));
        }
        assert_eq!(
            "shuffle_top_n".parse::<CardAction>().ok(),
            Some(CardAction::ShuffleTopN)
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        match "discardAll".parse::<CardAction>() {
            Err(SessionError::UnknownAction(name)) => assert_eq!(name, "discardAll"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
