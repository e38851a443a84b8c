//! Variant processors.
//!
//! Each processor starts from the shared frame built by
//! [`sync::build_game_event`] and overrides what its rules change:
//! the rule block, round targets, per-player extras, and in a few
//! variants the winner annotation itself.

mod atc;
mod bermuda;
mod bobs27;
mod bull_off;
mod count_up;
mod cricket;
mod gotcha;
mod random_checkout;
mod rtw;
mod segment_training;
mod shanghai;
mod x01;

use crate::dto::{
    event::{GameEvent, GameState, WinKind},
    snapshot::MatchSnapshot,
};

use super::{MatchEngine, Variant, sync};

/// Normalize one match frame through the processor for `variant`.
pub fn process(variant: Variant, engine: &mut MatchEngine, snap: &MatchSnapshot) -> GameEvent {
    let mut event = sync::build_game_event(engine, snap);
    match variant {
        Variant::X01 => x01::apply(snap, &mut event),
        Variant::Cricket | Variant::Tactics => cricket::apply(snap, &mut event),
        Variant::Bermuda => bermuda::apply(snap, &mut event),
        Variant::Shanghai => shanghai::apply(snap, &mut event),
        Variant::Gotcha => gotcha::apply(snap, &mut event),
        Variant::Atc => atc::apply(snap, &mut event),
        Variant::Rtw => rtw::apply(snap, &mut event),
        Variant::RandomCheckout => random_checkout::apply(snap, &mut event),
        Variant::BullOff => bull_off::apply(engine, snap, &mut event),
        Variant::CountUp => count_up::apply(snap, &mut event),
        Variant::SegmentTraining => segment_training::apply(snap, &mut event),
        Variant::Bobs27 => bobs27::apply(snap, &mut event),
    }
    event
}

/// Downgrade a match win to a leg win.
///
/// Variants played as a single leg report `match_won` upstream; clients
/// render them as leg results for a consistent end-of-game screen.
fn demote_match_win(event: &mut GameEvent) {
    if event.game_state == GameState::MatchWon {
        event.game_state = GameState::LegWon;
        if let Some(info) = event.winner_info.as_mut() {
            info.kind = WinKind::Leg;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};

    use super::*;

    #[test]
    fn single_leg_variants_demote_match_wins() {
        for variant in [
            Variant::Bermuda,
            Variant::Shanghai,
            Variant::Gotcha,
            Variant::Atc,
            Variant::Rtw,
            Variant::CountUp,
            Variant::SegmentTraining,
            Variant::Bobs27,
        ] {
            let mut engine = engine_for(&["Ann", "Bob"]);
            let mut snap = snapshot("X01", &["Ann", "Bob"]);
            snap.winner = 1;

            let event = process(variant, &mut engine, &snap);
            assert_eq!(
                event.game_state,
                GameState::LegWon,
                "variant {variant:?} should demote"
            );
            assert_eq!(event.winner_info.unwrap().kind, WinKind::Leg);
        }
    }

    #[test]
    fn multi_leg_variants_keep_match_wins() {
        for variant in [Variant::X01, Variant::Cricket, Variant::Tactics] {
            let mut engine = engine_for(&["Ann", "Bob"]);
            let mut snap = snapshot("X01", &["Ann", "Bob"]);
            snap.legs = 3;
            snap.winner = 0;

            let event = process(variant, &mut engine, &snap);
            assert_eq!(event.game_state, GameState::MatchWon);
        }
    }
}
