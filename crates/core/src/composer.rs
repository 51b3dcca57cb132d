use crate::{
    count_of, matches_target, Card, CardId, Catalog, CatalogIndex, CountMap, DeckPartition,
    GameId, NoticeKind, NoticeLog, RngState, Tag, TagRole, TypeExpr, CORRUPTER_SWAP_COUNT,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything "generate deck" needs from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeckRequest {
    pub card_counts: CountMap,
    pub special_card_counts: CountMap,
    pub sentry_card_counts: CountMap,
    pub sentry_enabled: bool,
    pub corrupter_enabled: bool,
}

/// One generation pass. The chosen-id set lives as long as the composer, so
/// build a fresh one per "generate".
pub struct DeckComposer<'a> {
    catalog: &'a Catalog,
    index: &'a CatalogIndex,
    games: &'a [GameId],
    chosen: HashSet<CardId>,
}

impl<'a> DeckComposer<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a CatalogIndex, games: &'a [GameId]) -> Self {
        Self {
            catalog,
            index,
            games,
            chosen: HashSet::new(),
        }
    }

    pub fn compose(
        mut self,
        request: &DeckRequest,
        rng: &mut RngState,
        notices: &mut NoticeLog,
    ) -> DeckPartition {
        let catalog = self.catalog;
        let (available, set_aside): (Vec<Card>, Vec<Card>) = self
            .index
            .available()
            .iter()
            .filter(|card| card.is_typed())
            .cloned()
            .partition(|card| !card.has_tag_in(&catalog.held_back_types));

        let mut deck = DeckPartition::default();
        let mut regular_budget = request.card_counts.clone();

        let index = self.index;
        for tag in index.all_types() {
            let skip = match catalog.role_of(tag) {
                TagRole::HeldBack => true,
                TagRole::Sentry => request.sentry_enabled,
                TagRole::Corrupter => request.corrupter_enabled,
                TagRole::Regular => false,
            };
            let wanted = count_of(&request.card_counts, tag);
            if skip || wanted == 0 {
                continue;
            }
            let picked = self.select_by_tag(&available, tag, &mut regular_budget, rng);
            self.report(tag, wanted, picked.len(), &regular_budget, notices);
            deck.regular.extend(picked);
        }

        if request.corrupter_enabled {
            let mut budget = request.special_card_counts.clone();
            for tag in &catalog.corrupter_types {
                let wanted = count_of(&request.special_card_counts, tag);
                if wanted == 0 {
                    continue;
                }
                let picked = self.select_by_tag(&available, tag, &mut budget, rng);
                self.report(tag, wanted, picked.len(), &budget, notices);
                deck.special.extend(picked);
            }
        }

        if request.sentry_enabled {
            let mut budget = request.sentry_card_counts.clone();
            for tag in &catalog.sentry_types {
                let wanted = count_of(&request.sentry_card_counts, tag);
                if wanted == 0 {
                    continue;
                }
                let picked = self.select_by_tag(&available, tag, &mut budget, rng);
                self.report(tag, wanted, picked.len(), &budget, notices);
                deck.sentry.extend(picked);
            }
            rng.shuffle(&mut deck.sentry);
        }

        for tag in &catalog.held_back_types {
            let wanted = count_of(&request.card_counts, tag);
            if wanted == 0 {
                continue;
            }
            let picked = self.select_held_back(&set_aside, tag, wanted, rng);
            if picked.is_empty() {
                notices.notify(
                    NoticeKind::NoCardsOfType,
                    format!("No cards available for type \"{tag}\""),
                );
            }
            deck.regular.extend(picked);
        }

        if request.corrupter_enabled {
            self.swap_in_corrupters(&mut deck.regular, rng, notices);
        }

        rng.shuffle(&mut deck.regular);
        deck.combined = deck
            .regular
            .iter()
            .chain(deck.special.iter())
            .cloned()
            .collect();
        rng.shuffle(&mut deck.combined);

        info!(
            "composed deck: {} regular, {} special, {} sentry",
            deck.regular.len(),
            deck.special.len(),
            deck.sentry.len()
        );
        deck
    }

    /// Picks up to the tag's remaining budget from `pool`, drawing budget for
    /// every clause of a composite card.
    fn select_by_tag(
        &mut self,
        pool: &[Card],
        target: &str,
        budget: &mut CountMap,
        rng: &mut RngState,
    ) -> Vec<Card> {
        let mut candidates: Vec<&Card> = pool
            .iter()
            .filter(|card| matches_target(card.type_expr.as_deref(), target))
            .filter(|card| !self.chosen.contains(&card.id))
            .collect();
        rng.shuffle(&mut candidates);

        let mut picked = Vec::new();
        for card in candidates {
            if count_of(budget, target) == 0 {
                break;
            }
            let expr = TypeExpr::parse(card.type_expr.as_deref().unwrap_or_default());
            if expr.is_conjunction() {
                let Some(spend) = clause_spend(&expr, target, budget) else {
                    continue;
                };
                for tag in spend {
                    decrement(budget, &tag);
                }
            } else {
                decrement(budget, target);
            }
            self.chosen.insert(card.id.clone());
            picked.push(card.clone());
        }
        picked
    }

    /// Held-back cards are drawn by their own count alone; other tags on a
    /// composite card do not limit them.
    fn select_held_back(
        &mut self,
        pool: &[Card],
        tag: &str,
        count: u32,
        rng: &mut RngState,
    ) -> Vec<Card> {
        let mut candidates: Vec<&Card> = pool
            .iter()
            .filter(|card| card.tags().iter().any(|own| own == tag))
            .collect();
        rng.shuffle(&mut candidates);

        let mut picked = Vec::new();
        for card in candidates {
            if picked.len() >= count as usize {
                break;
            }
            if self.chosen.insert(card.id.clone()) {
                picked.push(card.clone());
            }
        }
        picked
    }

    fn swap_in_corrupters(
        &mut self,
        regular: &mut Vec<Card>,
        rng: &mut RngState,
        notices: &mut NoticeLog,
    ) {
        if regular.len() < CORRUPTER_SWAP_COUNT {
            warn!(
                "corrupter swap skipped: {} regular cards, need {}",
                regular.len(),
                CORRUPTER_SWAP_COUNT
            );
            notices.notify(
                NoticeKind::InsufficientForRuleset,
                format!(
                    "Corrupter rules need at least {CORRUPTER_SWAP_COUNT} regular cards; found {}",
                    regular.len()
                ),
            );
            return;
        }

        for _ in 0..CORRUPTER_SWAP_COUNT {
            if let Some(index) = rng.index_below(regular.len()) {
                let removed = regular.remove(index);
                debug!("corrupter swap removed {}", removed.id);
            }
        }

        let mut candidates: Vec<Card> = self
            .catalog
            .cards_for(self.games)
            .filter(|card| card.has_tag_in(&self.catalog.corrupter_types))
            .filter(|card| !self.chosen.contains(&card.id))
            .cloned()
            .collect();
        if candidates.is_empty() {
            warn!("corrupter swap found no unused corrupter cards in the selected games");
            notices.notify(NoticeKind::NoCardsOfType, "No Corrupter cards available");
            return;
        }
        rng.shuffle(&mut candidates);
        for card in candidates.into_iter().take(CORRUPTER_SWAP_COUNT) {
            debug!("corrupter swap added {}", card.id);
            self.chosen.insert(card.id.clone());
            regular.push(card);
        }
    }

    /// A tag whose budget was already spent by composite cards is not a shortfall.
    fn report(
        &self,
        tag: &str,
        wanted: u32,
        picked: usize,
        budget: &CountMap,
        notices: &mut NoticeLog,
    ) {
        if picked == 0 && count_of(budget, tag) > 0 {
            notices.notify(
                NoticeKind::NoCardsOfType,
                format!("No cards available for type \"{tag}\""),
            );
        } else if (picked as u32) < wanted {
            debug!("type {tag}: wanted {wanted}, found {picked}");
        }
    }
}

/// For each clause, the alternative to charge: the target itself when it sits
/// in that clause with budget left, else the first alternative with budget.
/// `None` when some clause has nothing left.
fn clause_spend(expr: &TypeExpr, target: &str, budget: &CountMap) -> Option<Vec<Tag>> {
    expr.clauses()
        .iter()
        .map(|clause| {
            clause
                .iter()
                .find(|tag| tag.as_str() == target && count_of(budget, tag) > 0)
                .or_else(|| clause.iter().find(|tag| count_of(budget, tag) > 0))
                .cloned()
        })
        .collect()
}

fn decrement(budget: &mut CountMap, tag: &str) {
    if let Some(count) = budget.get_mut(tag) {
        *count = count.saturating_sub(1);
    }
}
