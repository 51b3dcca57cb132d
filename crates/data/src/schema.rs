use deckforge_core::{Card, Catalog, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use deckforge_core::{Difficulty, DifficultyTable};

/// Card ids appear both as strings and as bare numbers in published card lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCard {
    pub id: RawId,
    #[serde(alias = "name")]
    pub card: String,
    #[serde(rename = "type", default)]
    pub type_expr: Option<String>,
    #[serde(default, alias = "imageRef")]
    pub contents: String,
}

impl RawCard {
    pub fn into_card(self, game_id: &str) -> Card {
        Card::new(self.id.to_string(), self.card, self.type_expr.as_deref())
            .with_game(game_id)
            .with_image(self.contents)
    }
}

/// `cards.json`: the games plus the global rule-set classification of tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardsFile {
    pub games: BTreeMap<String, Vec<RawCard>>,
    #[serde(default)]
    pub sentry_types: Vec<Tag>,
    #[serde(default)]
    pub corrupter_types: Vec<Tag>,
    #[serde(default, rename = "heldBackCardTypes", alias = "heldBackTypes")]
    pub held_back_types: Vec<Tag>,
}

impl CardsFile {
    pub fn into_catalog(self) -> Catalog {
        let games = self
            .games
            .into_iter()
            .map(|(game_id, cards)| {
                let cards = cards
                    .into_iter()
                    .map(|card| card.into_card(&game_id))
                    .collect();
                (game_id, cards)
            })
            .collect();
        Catalog {
            games,
            sentry_types: self.sentry_types,
            corrupter_types: self.corrupter_types,
            held_back_types: self.held_back_types,
        }
    }
}
