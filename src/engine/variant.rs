//! Variant identification.

use crate::dao::stats_store::StatFamily;

/// Closed set of variants the engine understands.
///
/// Labels match what the scoring service puts in the snapshot `variant`
/// field; anything else is logged and dropped by the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Opening bull-off round deciding who throws first.
    BullOff,
    /// Countdown play (301/501/701...).
    X01,
    /// Cricket.
    Cricket,
    /// Tactics, scored like Cricket over more segments.
    Tactics,
    /// Bermuda, thirteen fixed rounds.
    Bermuda,
    /// Shanghai.
    Shanghai,
    /// Gotcha.
    Gotcha,
    /// Around the Clock.
    Atc,
    /// Round the World.
    Rtw,
    /// Random Checkout.
    RandomCheckout,
    /// Count Up.
    CountUp,
    /// Segment practice.
    SegmentTraining,
    /// Bob's 27.
    Bobs27,
}

impl Variant {
    /// Resolve a snapshot variant label.
    pub fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "Bull-off" => Variant::BullOff,
            "X01" => Variant::X01,
            "Cricket" => Variant::Cricket,
            "Tactics" => Variant::Tactics,
            "Bermuda" => Variant::Bermuda,
            "Shanghai" => Variant::Shanghai,
            "Gotcha" => Variant::Gotcha,
            "ATC" => Variant::Atc,
            "RTW" => Variant::Rtw,
            "Random Checkout" => Variant::RandomCheckout,
            "CountUp" => Variant::CountUp,
            "Segment Training" => Variant::SegmentTraining,
            "Bob's 27" => Variant::Bobs27,
            _ => return None,
        })
    }

    /// Statistics family whose legs are persisted, `None` for variants
    /// without lifetime tracking.
    pub fn stat_family(self) -> Option<StatFamily> {
        match self {
            Variant::X01 => Some(StatFamily::X01),
            Variant::Cricket => Some(StatFamily::Cricket),
            Variant::Tactics => Some(StatFamily::Tactics),
            Variant::Atc => Some(StatFamily::Atc),
            Variant::CountUp => Some(StatFamily::CountUp),
            Variant::SegmentTraining => Some(StatFamily::SegmentTraining),
            _ => None,
        }
    }

    /// Family used to seed lifetime statistics at match start.
    ///
    /// Variants without their own family read the countdown table, so a
    /// player's most familiar number still shows up on the board.
    pub fn seed_family(self) -> StatFamily {
        self.stat_family().unwrap_or(StatFamily::X01)
    }
}

/// Variant labels surfaced on the supported-modes route.
pub const SUPPORTED_VARIANTS: [&str; 11] = [
    "Bull-off",
    "X01",
    "Cricket/Tactics",
    "Bermuda",
    "Shanghai",
    "Gotcha",
    "Around the Clock",
    "Round the World",
    "Count Up",
    "Segment Training",
    "Bob's 27",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_to_variants() {
        assert_eq!(Variant::parse("X01"), Some(Variant::X01));
        assert_eq!(Variant::parse("Bob's 27"), Some(Variant::Bobs27));
        assert_eq!(Variant::parse("Random Checkout"), Some(Variant::RandomCheckout));
        assert_eq!(Variant::parse("Freeze"), None);
    }

    #[test]
    fn seeding_falls_back_to_countdown_family() {
        assert_eq!(Variant::Bermuda.seed_family(), StatFamily::X01);
        assert_eq!(Variant::Tactics.seed_family(), StatFamily::Tactics);
        assert_eq!(Variant::Bermuda.stat_family(), None);
    }
}
