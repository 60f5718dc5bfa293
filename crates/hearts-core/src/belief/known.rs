//! Hard facts the acting seat can deduce about hidden hands.

use crate::model::card_set::CardSet;
use crate::model::player::PlayerPosition;
use crate::model::state::GameState;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use crate::model::variant::RuleSet;

/// Bit-mask describing which suits are void for a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SuitMask(u8);

impl SuitMask {
    pub const EMPTY: Self = Self(0);

    pub fn contains(self, suit: Suit) -> bool {
        self.0 & (1 << suit as u8) != 0
    }

    pub fn with(self, suit: Suit) -> Self {
        Self(self.0 | (1 << suit as u8))
    }
}

/// Everything the determinizer needs, extracted once per decision.
#[derive(Debug, Clone)]
pub struct KnownState {
    acting: PlayerPosition,
    known_hands: [Option<CardSet>; 4],
    unseen: CardSet,
    hand_sizes: [usize; 4],
    voids: [SuitMask; 4],
    out_of_view: usize,
    current_trick: Trick,
    hearts_broken: bool,
    first_trick: bool,
    taken: [CardSet; 4],
    tricks_won: [u8; 4],
    rules: RuleSet,
    scores: [f64; 4],
}

impl KnownState {
    pub fn from_game(state: &GameState) -> Self {
        let acting = state.acting();
        let acting_len = state.acting_hand().len();
        let trick = state.current_trick();

        let mut known_hands = [None; 4];
        let mut hand_sizes = [0usize; 4];
        let mut accounted = state.played_cards();
        for seat in PlayerPosition::LOOP {
            if let Some(hand) = state.hand(seat) {
                let set = hand.to_set();
                accounted = accounted.union(set);
                hand_sizes[seat.index()] = set.len();
                known_hands[seat.index()] = Some(set);
            } else {
                let played_now = usize::from(trick.has_played(seat));
                hand_sizes[seat.index()] = acting_len.saturating_sub(played_now);
            }
        }
        let unseen = accounted.complement();

        let hidden_total: usize = PlayerPosition::LOOP
            .iter()
            .filter(|seat| known_hands[seat.index()].is_none())
            .map(|seat| hand_sizes[seat.index()])
            .sum();
        let out_of_view = unseen.len().saturating_sub(hidden_total);

        let (taken, tricks_won) = collect_taken(state);

        Self {
            acting,
            known_hands,
            unseen,
            hand_sizes,
            voids: compute_voids(state),
            out_of_view,
            current_trick: trick.clone(),
            hearts_broken: state.effective_hearts_broken(),
            first_trick: state.is_first_trick(),
            taken,
            tricks_won,
            rules: state.rules(),
            scores: state.scores(),
        }
    }

    pub fn acting(&self) -> PlayerPosition {
        self.acting
    }

    pub fn known_hand(&self, seat: PlayerPosition) -> Option<CardSet> {
        self.known_hands[seat.index()]
    }

    /// Cards whose owner is not observed: hidden hands plus the out-of-view surplus.
    pub fn unseen(&self) -> CardSet {
        self.unseen
    }

    pub fn hand_size(&self, seat: PlayerPosition) -> usize {
        self.hand_sizes[seat.index()]
    }

    pub fn void_mask(&self, seat: PlayerPosition) -> SuitMask {
        self.voids[seat.index()]
    }

    /// Unseen cards beyond what the hidden hands must hold, attributed to unrecorded tricks.
    pub fn out_of_view(&self) -> usize {
        self.out_of_view
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn first_trick(&self) -> bool {
        self.first_trick
    }

    pub fn taken(&self) -> [CardSet; 4] {
        self.taken
    }

    pub fn tricks_won(&self) -> [u8; 4] {
        self.tricks_won
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn scores(&self) -> [f64; 4] {
        self.scores
    }

    pub fn is_fully_observed(&self) -> bool {
        self.known_hands.iter().all(Option::is_some)
    }
}

fn compute_voids(state: &GameState) -> [SuitMask; 4] {
    let mut voids = [SuitMask::EMPTY; 4];
    for trick in state.trick_history() {
        mark_voids_from_trick(&mut voids, trick);
    }
    mark_voids_from_trick(&mut voids, state.current_trick());
    voids
}

fn mark_voids_from_trick(voids: &mut [SuitMask; 4], trick: &Trick) {
    if let Some(lead) = trick.lead_suit() {
        for play in trick.plays() {
            if play.card.suit != lead {
                let seat = play.position.index();
                voids[seat] = voids[seat].with(lead);
            }
        }
    }
}

/// Won cards per seat, filling gaps in the `taken` record from the recorded history.
fn collect_taken(state: &GameState) -> ([CardSet; 4], [u8; 4]) {
    let mut taken = [CardSet::EMPTY; 4];
    let mut history_wins = [0u8; 4];
    for trick in state.trick_history() {
        if let Some(winner) = trick.winner() {
            let slot = &mut taken[winner.index()];
            *slot = slot.union(trick.cards().collect());
            history_wins[winner.index()] += 1;
        }
    }
    let mut tricks_won = [0u8; 4];
    for seat in PlayerPosition::LOOP {
        let slot = &mut taken[seat.index()];
        *slot = slot.union(state.taken(seat));
        let from_cards = slot.len().div_ceil(4) as u8;
        tricks_won[seat.index()] = history_wins[seat.index()].max(from_cards);
    }
    (taken, tricks_won)
}
