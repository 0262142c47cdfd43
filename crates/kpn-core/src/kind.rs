//! Unit kinds and the dominance relation.
//!
//! The three cyclic kinds form a rock-paper-scissors triangle. The hostile
//! [`Kind::Zombie`] sits outside the triangle: it never "beats" anything in
//! the dominance sense, yet it always fights on contact using a fixed damage
//! table (see the combat resolver).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a unit.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Beats scissors.
    #[default]
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
    /// Hostile unit injected by the storm; hunts players only.
    Zombie,
}

impl Kind {
    /// The cyclic kinds, in rotation order.
    pub const CYCLIC: [Kind; 3] = [Kind::Rock, Kind::Paper, Kind::Scissors];

    /// Returns `true` if `self` dominates `other`.
    ///
    /// Only defined among the cyclic kinds; any pair involving
    /// [`Kind::Zombie`] returns `false`.
    #[must_use]
    pub const fn beats(self, other: Kind) -> bool {
        matches!(
            (self, other),
            (Kind::Rock, Kind::Scissors) | (Kind::Paper, Kind::Rock) | (Kind::Scissors, Kind::Paper)
        )
    }

    /// Returns the kind this one dominates, if any.
    #[must_use]
    pub const fn prey(self) -> Option<Kind> {
        match self {
            Kind::Rock => Some(Kind::Scissors),
            Kind::Paper => Some(Kind::Rock),
            Kind::Scissors => Some(Kind::Paper),
            Kind::Zombie => None,
        }
    }

    /// Returns `true` for the hostile kind.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Kind::Zombie)
    }

    /// Returns the next kind in rotation order. The hostile kind maps to itself.
    #[must_use]
    pub const fn next(self) -> Kind {
        match self {
            Kind::Rock => Kind::Paper,
            Kind::Paper => Kind::Scissors,
            Kind::Scissors => Kind::Rock,
            Kind::Zombie => Kind::Zombie,
        }
    }

    /// Lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Kind::Rock => "rock",
            Kind::Paper => "paper",
            Kind::Scissors => "scissors",
            Kind::Zombie => "zombie",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod dominance_tests {
        use super::*;

        #[test]
        fn exactly_one_side_wins_each_cyclic_pair() {
            for a in Kind::CYCLIC {
                for b in Kind::CYCLIC {
                    if a == b {
                        assert!(!a.beats(b));
                    } else {
                        assert!(a.beats(b) ^ b.beats(a), "{a} vs {b}");
                    }
                }
            }
        }

        #[test]
        fn hostile_is_outside_the_relation() {
            for k in Kind::CYCLIC {
                assert!(!Kind::Zombie.beats(k));
                assert!(!k.beats(Kind::Zombie));
            }
            assert!(Kind::Zombie.prey().is_none());
        }

        #[test]
        fn prey_agrees_with_beats() {
            for k in Kind::CYCLIC {
                let prey = k.prey().unwrap();
                assert!(k.beats(prey));
            }
        }
    }

    mod rotation_tests {
        use super::*;

        #[test]
        fn rotation_cycles_through_all_three() {
            let mut k = Kind::Rock;
            let mut seen = Vec::new();
            for _ in 0..3 {
                seen.push(k);
                k = k.next();
            }
            assert_eq!(k, Kind::Rock);
            assert_eq!(seen, Kind::CYCLIC.to_vec());
        }

        #[test]
        fn serializes_lowercase() {
            assert_eq!(serde_json::to_string(&Kind::Scissors).unwrap(), "\"scissors\"");
        }
    }
}
