use crate::{parse_type_tags, Card, CountMap, DifficultyTable, GameId, SessionError, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Read-only card data for every game, plus the global rule-set classification of tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub games: BTreeMap<GameId, Vec<Card>>,
    #[serde(default)]
    pub sentry_types: Vec<Tag>,
    #[serde(default)]
    pub corrupter_types: Vec<Tag>,
    #[serde(default)]
    pub held_back_types: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TagRole {
    Regular,
    Sentry,
    Corrupter,
    HeldBack,
}

impl Catalog {
    pub fn has_game(&self, game: &str) -> bool {
        self.games.contains_key(game)
    }

    pub fn is_sentry(&self, tag: &str) -> bool {
        self.sentry_types.iter().any(|t| t == tag)
    }

    pub fn is_corrupter(&self, tag: &str) -> bool {
        self.corrupter_types.iter().any(|t| t == tag)
    }

    pub fn is_held_back(&self, tag: &str) -> bool {
        self.held_back_types.iter().any(|t| t == tag)
    }

    pub fn role_of(&self, tag: &str) -> TagRole {
        if self.is_held_back(tag) {
            TagRole::HeldBack
        } else if self.is_sentry(tag) {
            TagRole::Sentry
        } else if self.is_corrupter(tag) {
            TagRole::Corrupter
        } else {
            TagRole::Regular
        }
    }

    /// Cards of the listed games, in game order then catalog order. Unknown games are skipped.
    pub fn cards_for<'a>(&'a self, games: &'a [GameId]) -> impl Iterator<Item = &'a Card> + 'a {
        games
            .iter()
            .filter_map(|game| self.games.get(game))
            .flat_map(|cards| cards.iter())
    }

    pub fn find_card(&self, id: &str) -> Option<&Card> {
        self.games
            .values()
            .flat_map(|cards| cards.iter())
            .find(|card| card.id == id)
    }

    pub fn card_count(&self) -> usize {
        self.games.values().map(Vec::len).sum()
    }
}

/// Per-selection view of the catalog used by the composer.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    by_type: BTreeMap<Tag, Vec<Card>>,
    all_types: Vec<Tag>,
    available: Vec<Card>,
}

impl CatalogIndex {
    /// Files a copy of each selected card under every tag it mentions. `available`
    /// keeps one copy per card.
    pub fn build(games: &[GameId], catalog: &Catalog) -> Self {
        let mut index = Self::default();
        for card in catalog.cards_for(games) {
            index.available.push(card.clone());
            for tag in card.tags() {
                if !index.by_type.contains_key(&tag) {
                    index.all_types.push(tag.clone());
                }
                index.by_type.entry(tag).or_default().push(card.clone());
            }
        }
        index
    }

    pub fn by_type(&self, tag: &str) -> &[Card] {
        self.by_type.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tags in the order they were first seen.
    pub fn all_types(&self) -> &[Tag] {
        &self.all_types
    }

    pub fn available(&self) -> &[Card] {
        &self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameTypes {
    pub tags: BTreeSet<Tag>,
    pub sentry: BTreeSet<Tag>,
    pub corrupter: BTreeSet<Tag>,
    pub held_back: BTreeSet<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedCounts {
    pub card_counts: CountMap,
    pub special_card_counts: CountMap,
    pub sentry_card_counts: CountMap,
}

/// Which tags each game has and how the rule sets classify them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRegistry {
    pub games: BTreeMap<GameId, GameTypes>,
    pub sentry: BTreeSet<Tag>,
    pub corrupter: BTreeSet<Tag>,
    pub held_back: BTreeSet<Tag>,
}

impl TypeRegistry {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let sentry: BTreeSet<Tag> = catalog.sentry_types.iter().cloned().collect();
        let corrupter: BTreeSet<Tag> = catalog.corrupter_types.iter().cloned().collect();
        let held_back: BTreeSet<Tag> = catalog.held_back_types.iter().cloned().collect();
        let games = catalog
            .games
            .iter()
            .map(|(game, cards)| {
                let tags: BTreeSet<Tag> = cards
                    .iter()
                    .flat_map(|card| parse_type_tags(card.type_expr.as_deref()))
                    .collect();
                let types = GameTypes {
                    sentry: tags.intersection(&sentry).cloned().collect(),
                    corrupter: tags.intersection(&corrupter).cloned().collect(),
                    held_back: tags.intersection(&held_back).cloned().collect(),
                    tags,
                };
                (game.clone(), types)
            })
            .collect();
        Self {
            games,
            sentry,
            corrupter,
            held_back,
        }
    }

    pub fn game(&self, game: &str) -> Option<&GameTypes> {
        self.games.get(game)
    }

    /// Union of tags across the given games, sorted.
    pub fn tags_for(&self, games: &[GameId]) -> BTreeSet<Tag> {
        games
            .iter()
            .filter_map(|game| self.games.get(game))
            .flat_map(|types| types.tags.iter().cloned())
            .collect()
    }

    /// Splits one tag-to-count form into the regular, Corrupter and Sentry maps.
    pub fn route_counts(
        &self,
        raw: &CountMap,
        sentry_enabled: bool,
        corrupter_enabled: bool,
    ) -> RoutedCounts {
        let mut routed = RoutedCounts::default();
        for (tag, &count) in raw {
            let target = if sentry_enabled && self.sentry.contains(tag) {
                &mut routed.sentry_card_counts
            } else if corrupter_enabled && self.corrupter.contains(tag) {
                &mut routed.special_card_counts
            } else {
                &mut routed.card_counts
            };
            target.insert(tag.clone(), count);
        }
        routed
    }
}

/// What a catalog provider hands the session at start-up.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub difficulties: DifficultyTable,
}

pub trait CatalogProvider {
    /// A failure here is fatal for the session: nothing can be composed without a catalog.
    fn load(&self) -> Result<LoadedCatalog, SessionError>;
}

/// Ids that occur more than once across all games.
pub fn duplicate_card_ids(catalog: &Catalog) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for card in catalog.games.values().flat_map(|cards| cards.iter()) {
        if !seen.insert(card.id.as_str()) && !dupes.contains(&card.id) {
            dupes.push(card.id.clone());
        }
    }
    dupes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count_of;

    fn catalog() -> Catalog {
        let mut games = BTreeMap::new();
        games.insert(
            "base".to_string(),
            vec![
                Card::new("b1", "Pit", Some("Trap")),
                Card::new("b2", "Ambush", Some("Trap+Veteran")),
                Card::new("b3", "Lurker", Some("Novice/Veteran")),
                Card::new("b4", "Blank", None),
            ],
        );
        games.insert(
            "expansion".to_string(),
            vec![
                Card::new("e1", "Watcher", Some("Sentry")),
                Card::new("e2", "Rot", Some("Corrupter")),
                Card::new("e3", "Revenant", Some("Revenant")),
            ],
        );
        Catalog {
            games,
            sentry_types: vec!["Sentry".to_string()],
            corrupter_types: vec!["Corrupter".to_string()],
            held_back_types: vec!["Revenant".to_string()],
        }
    }

    #[test]
    fn index_files_composites_under_each_tag() {
        let catalog = catalog();
        let index = CatalogIndex::build(&["base".to_string()], &catalog);
        assert_eq!(index.available().len(), 4);
        assert_eq!(index.all_types(), &["Trap", "Veteran", "Novice"]);
        assert_eq!(index.by_type("Trap").len(), 2);
        assert_eq!(index.by_type("Veteran").len(), 2);
        assert!(index.by_type("Sentry").is_empty());
    }

    #[test]
    fn index_of_no_games_is_empty() {
        let index = CatalogIndex::build(&[], &catalog());
        assert!(index.is_empty());
        assert!(index.all_types().is_empty());
    }

    #[test]
    fn registry_classifies_per_game() {
        let registry = TypeRegistry::from_catalog(&catalog());
        let expansion = registry.game("expansion").expect("expansion");
        assert!(expansion.sentry.contains("Sentry"));
        assert!(expansion.corrupter.contains("Corrupter"));
        assert!(expansion.held_back.contains("Revenant"));
        let base = registry.game("base").expect("base");
        assert!(base.sentry.is_empty());
        assert_eq!(base.tags.len(), 3);
    }

    #[test]
    fn route_counts_follows_enabled_rules() {
        let registry = TypeRegistry::from_catalog(&catalog());
        let mut raw = CountMap::new();
        raw.insert("Trap".to_string(), 2);
        raw.insert("Sentry".to_string(), 1);
        raw.insert("Corrupter".to_string(), 3);

        let routed = registry.route_counts(&raw, true, false);
        assert_eq!(count_of(&routed.sentry_card_counts, "Sentry"), 1);
        assert_eq!(count_of(&routed.card_counts, "Corrupter"), 3);
        assert!(routed.special_card_counts.is_empty());

        let routed = registry.route_counts(&raw, false, true);
        assert_eq!(count_of(&routed.card_counts, "Sentry"), 1);
        assert_eq!(count_of(&routed.special_card_counts, "Corrupter"), 3);
    }

    #[test]
    fn role_and_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.role_of("Revenant"), TagRole::HeldBack);
        assert_eq!(catalog.role_of("Trap"), TagRole::Regular);
        assert_eq!(catalog.find_card("e2").map(|c| c.name.as_str()), Some("Rot"));
        assert!(catalog.find_card("zz").is_none());
        assert!(duplicate_card_ids(&catalog).is_empty());
    }
}
