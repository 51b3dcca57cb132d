use crate::parse_type_tags;
use serde::{Deserialize, Serialize};

pub type CardId = String;
pub type GameId = String;
pub type Tag = String;

/// A catalog entry. Deck structures hold copies, never references into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// Raw composite type expression, e.g. `Trap+Veteran` or `Novice/Veteran`.
    #[serde(rename = "type", default)]
    pub type_expr: Option<String>,
    #[serde(default)]
    pub image_ref: String,
    #[serde(default)]
    pub game_id: GameId,
}

impl Card {
    pub fn new(id: impl Into<CardId>, name: impl Into<String>, type_expr: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            type_expr: type_expr.map(str::to_string),
            image_ref: String::new(),
            game_id: GameId::new(),
        }
    }

    pub fn with_game(mut self, game_id: impl Into<GameId>) -> Self {
        self.game_id = game_id.into();
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    pub fn tags(&self) -> Vec<Tag> {
        parse_type_tags(self.type_expr.as_deref())
    }

    pub fn has_tag_in(&self, tags: &[Tag]) -> bool {
        self.tags().iter().any(|tag| tags.contains(tag))
    }

    /// Cards without a type expression are never part of a type-based pool.
    pub fn is_typed(&self) -> bool {
        self.type_expr
            .as_deref()
            .is_some_and(|expr| !expr.trim().is_empty())
    }
}
