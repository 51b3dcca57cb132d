use crate::{Card, RngState};
use serde::{Deserialize, Serialize};

/// The generated deck and the piles that hang off it during a session.
///
/// `combined` is the navigated sequence; positions up to the current index are
/// already drawn. `sentry` stays out of `combined` until it is introduced.
/// `in_play` is an annotation: a card there is still in `combined` or `discard`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeckPartition {
    pub regular: Vec<Card>,
    pub special: Vec<Card>,
    pub sentry: Vec<Card>,
    pub combined: Vec<Card>,
    pub discard: Vec<Card>,
    pub in_play: Vec<Card>,
}

impl DeckPartition {
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty() && self.discard.is_empty() && self.sentry.is_empty()
    }

    /// Cards after position `index`.
    pub fn remaining_after(&self, index: usize) -> usize {
        self.combined.len().saturating_sub(index + 1)
    }

    /// Turns the discard pile into a fresh shuffled `combined`.
    pub fn reshuffle_discard(&mut self, rng: &mut RngState) {
        if self.discard.is_empty() {
            return;
        }
        self.combined = std::mem::take(&mut self.discard);
        rng.shuffle(&mut self.combined);
    }

    /// Looks a card up by id in the piles a session can see.
    pub fn find_card(&self, id: &str) -> Option<&Card> {
        self.combined
            .iter()
            .chain(self.discard.iter())
            .chain(self.sentry.iter())
            .chain(self.in_play.iter())
            .find(|card| card.id == id)
    }

    pub fn is_in_play(&self, id: &str) -> bool {
        self.in_play.iter().any(|card| card.id == id)
    }

    /// Returns false when the card was already in play.
    pub fn mark_in_play(&mut self, card: Card) -> bool {
        if self.is_in_play(&card.id) {
            return false;
        }
        self.in_play.push(card);
        true
    }

    /// Returns false when the card was not in play.
    pub fn clear_in_play(&mut self, id: &str) -> bool {
        let before = self.in_play.len();
        self.in_play.retain(|card| card.id != id);
        self.in_play.len() != before
    }

    /// Moves the card at `index` to a uniformly random slot in
    /// `index..=len` of the shortened deck. Returns the new slot.
    pub fn shuffle_anywhere(&mut self, index: usize, rng: &mut RngState) -> Option<usize> {
        if index >= self.combined.len() {
            return None;
        }
        let card = self.combined.remove(index);
        let len = self.combined.len();
        let slot = rng.index_between(index.min(len), len);
        self.combined.insert(slot, card);
        Some(slot)
    }

    /// Moves the card at `index` into one of the next `n` slots, with `n`
    /// clamped to `1..=remaining`. Returns the clamped `n` and the new slot.
    pub fn shuffle_top_n(
        &mut self,
        index: usize,
        n: usize,
        rng: &mut RngState,
    ) -> Option<(usize, usize)> {
        if index >= self.combined.len() {
            return None;
        }
        let remaining = self.remaining_after(index);
        let n = n.min(remaining).max(1);
        let card = self.combined.remove(index);
        let len = self.combined.len();
        let low = (index + 1).min(len);
        let high = (index + n).min(len);
        let slot = rng.index_between(low, high);
        self.combined.insert(slot, card);
        Some((n, slot))
    }

    /// Shuffles every sentry card into the undrawn tail after `index` and
    /// empties `sentry`. Returns how many sentry cards went in.
    pub fn introduce_sentry(&mut self, index: Option<usize>, rng: &mut RngState) -> usize {
        let split = index.map_or(0, |index| (index + 1).min(self.combined.len()));
        let introduced = self.sentry.len();
        let mut tail = self.combined.split_off(split);
        tail.append(&mut self.sentry);
        rng.shuffle(&mut tail);
        self.combined.append(&mut tail);
        introduced
    }

    /// Every card id the partition holds outside `in_play`.
    pub fn card_ids(&self) -> impl Iterator<Item = &str> {
        self.regular
            .iter()
            .chain(self.special.iter())
            .chain(self.sentry.iter())
            .map(|card| card.id.as_str())
    }
}
