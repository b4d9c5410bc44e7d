//! Game actions, per-agent game memory and the strategy decision table.
//!
//! Every strategy is a pure function of the agent's last game (and, for
//! [`Strategy::Retreat`], its one-way "has defected" flag) to an action and
//! three movement flags. The flags are checked against the partner's
//! error-adjusted action once the pairing is scored.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Action played in a single pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Cooperate,
    Defect,
    /// No game took place (no partner was found)
    Nothing,
}

impl Action {
    /// The opposite of a game action. `Nothing` stays `Nothing`.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
            Action::Nothing => Action::Nothing,
        }
    }
}

/// Memory of the most recent pairing: own action and the partner's action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMemory {
    pub own: Action,
    pub other: Action,
}

impl GameMemory {
    /// Memory of a round without a game
    pub const NONE: GameMemory = GameMemory {
        own: Action::Nothing,
        other: Action::Nothing,
    };

    pub fn new(own: Action, other: Action) -> Self {
        Self { own, other }
    }
}

impl Default for GameMemory {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for GameMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.own, self.other)
    }
}

/// Action chosen for this round plus the movement flags that apply once the
/// partner's action is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub move_on_cooperate: bool,
    pub move_on_defect: bool,
    pub move_on_nothing: bool,
}

impl Decision {
    const fn new(action: Action, on_c: bool, on_d: bool, on_n: bool) -> Self {
        Self {
            action,
            move_on_cooperate: on_c,
            move_on_defect: on_d,
            move_on_nothing: on_n,
        }
    }

    /// Whether the flags call for a move given the partner's scored action
    #[inline]
    pub fn moves_against(&self, partner_action: Action) -> bool {
        match partner_action {
            Action::Cooperate => self.move_on_cooperate,
            Action::Defect => self.move_on_defect,
            Action::Nothing => self.move_on_nothing,
        }
    }
}

/// The ten immutable strategies.
///
/// Declaration order is the column order of the per-round output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NaiveC,
    NaiveD,
    WalkawayC,
    WalkawayD,
    TftStationary,
    TftMobile,
    PavlovStationary,
    PavlovMobile,
    RealisticTft,
    Retreat,
}

impl Strategy {
    pub const COUNT: usize = 10;

    /// All strategies in output column order
    pub const ALL: [Strategy; Strategy::COUNT] = [
        Strategy::NaiveC,
        Strategy::NaiveD,
        Strategy::WalkawayC,
        Strategy::WalkawayD,
        Strategy::TftStationary,
        Strategy::TftMobile,
        Strategy::PavlovStationary,
        Strategy::PavlovMobile,
        Strategy::RealisticTft,
        Strategy::Retreat,
    ];

    /// Column position in [`Strategy::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used in configuration files and on the command line
    pub fn key(self) -> &'static str {
        match self {
            Strategy::NaiveC => "naive_c",
            Strategy::NaiveD => "naive_d",
            Strategy::WalkawayC => "walkaway_c",
            Strategy::WalkawayD => "walkaway_d",
            Strategy::TftStationary => "tft_stationary",
            Strategy::TftMobile => "tft_mobile",
            Strategy::PavlovStationary => "pavlov_stationary",
            Strategy::PavlovMobile => "pavlov_mobile",
            Strategy::RealisticTft => "realistic_tft",
            Strategy::Retreat => "retreat",
        }
    }

    /// Column header of the output record
    pub fn column(self) -> &'static str {
        match self {
            Strategy::NaiveC => "nNaiveC",
            Strategy::NaiveD => "nNaiveD",
            Strategy::WalkawayC => "nWalkawayC",
            Strategy::WalkawayD => "nWalkawayD",
            Strategy::TftStationary => "nTFTStationary",
            Strategy::TftMobile => "nTFTMobile",
            Strategy::PavlovStationary => "nPAVLOVStationary",
            Strategy::PavlovMobile => "nPAVLOVMobile",
            Strategy::RealisticTft => "nRealisticTFT",
            Strategy::Retreat => "nRetreat",
        }
    }

    /// Whether an agent with no available partner moves this round
    pub fn moves_without_partner(self) -> bool {
        !matches!(self, Strategy::PavlovStationary | Strategy::TftStationary)
    }

    /// Choose this round's action and movement flags.
    ///
    /// `has_defected` is only read and written by [`Strategy::Retreat`]; once
    /// set it is never cleared.
    pub fn decide(self, last: GameMemory, has_defected: &mut bool) -> Decision {
        use Action::{Cooperate as C, Defect as D};

        match self {
            Strategy::NaiveC => Decision::new(C, false, false, true),
            Strategy::NaiveD => Decision::new(D, false, false, true),
            Strategy::PavlovMobile => Decision::new(pavlov(last), false, false, true),
            Strategy::PavlovStationary => Decision::new(pavlov(last), false, false, false),
            Strategy::TftMobile => Decision::new(tit_for_tat(last), false, false, true),
            Strategy::TftStationary => Decision::new(tit_for_tat(last), false, false, false),
            Strategy::WalkawayC => Decision::new(C, false, true, true),
            Strategy::WalkawayD => Decision::new(D, false, true, true),
            Strategy::RealisticTft => {
                let action = if last.other == D { D } else { C };
                Decision::new(action, false, true, true)
            }
            Strategy::Retreat => {
                if *has_defected {
                    return Decision::new(D, true, true, true);
                }
                if last.other == D {
                    *has_defected = true;
                    Decision::new(D, false, true, true)
                } else {
                    Decision::new(C, false, true, true)
                }
            }
        }
    }
}

/// Win-stay, lose-shift. Any round without a game resets to cooperation.
fn pavlov(last: GameMemory) -> Action {
    use Action::*;
    match (last.own, last.other) {
        (Cooperate, Cooperate) => Cooperate,
        (Cooperate, Defect) => Defect,
        (Defect, Cooperate) => Defect,
        (Defect, Defect) => Cooperate,
        _ => Cooperate,
    }
}

fn tit_for_tat(last: GameMemory) -> Action {
    match last.other {
        Action::Defect => Action::Defect,
        _ => Action::Cooperate,
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.key() == wanted)
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}

/// One count per strategy, keyed by name in YAML.
///
/// Used both for the initial population request and the per-round tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyCounts {
    pub naive_c: usize,
    pub naive_d: usize,
    pub walkaway_c: usize,
    pub walkaway_d: usize,
    pub tft_stationary: usize,
    pub tft_mobile: usize,
    pub pavlov_stationary: usize,
    pub pavlov_mobile: usize,
    pub realistic_tft: usize,
    pub retreat: usize,
}

impl StrategyCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::NaiveC => self.naive_c,
            Strategy::NaiveD => self.naive_d,
            Strategy::WalkawayC => self.walkaway_c,
            Strategy::WalkawayD => self.walkaway_d,
            Strategy::TftStationary => self.tft_stationary,
            Strategy::TftMobile => self.tft_mobile,
            Strategy::PavlovStationary => self.pavlov_stationary,
            Strategy::PavlovMobile => self.pavlov_mobile,
            Strategy::RealisticTft => self.realistic_tft,
            Strategy::Retreat => self.retreat,
        }
    }

    pub fn get_mut(&mut self, strategy: Strategy) -> &mut usize {
        match strategy {
            Strategy::NaiveC => &mut self.naive_c,
            Strategy::NaiveD => &mut self.naive_d,
            Strategy::WalkawayC => &mut self.walkaway_c,
            Strategy::WalkawayD => &mut self.walkaway_d,
            Strategy::TftStationary => &mut self.tft_stationary,
            Strategy::TftMobile => &mut self.tft_mobile,
            Strategy::PavlovStationary => &mut self.pavlov_stationary,
            Strategy::PavlovMobile => &mut self.pavlov_mobile,
            Strategy::RealisticTft => &mut self.realistic_tft,
            Strategy::Retreat => &mut self.retreat,
        }
    }

    pub fn set(&mut self, strategy: Strategy, count: usize) {
        *self.get_mut(strategy) = count;
    }

    /// Sum over all strategies
    pub fn total(&self) -> usize {
        Strategy::ALL.iter().map(|&s| self.get(s)).sum()
    }

    /// Counts in output column order
    pub fn iter(&self) -> impl Iterator<Item = (Strategy, usize)> + '_ {
        Strategy::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::{Cooperate as C, Defect as D, Nothing as N};

    fn decide(strategy: Strategy, own: Action, other: Action) -> Decision {
        let mut flag = false;
        strategy.decide(GameMemory::new(own, other), &mut flag)
    }

    #[test]
    fn test_naive_strategies() {
        for last in [(C, C), (C, D), (D, C), (N, N)] {
            assert_eq!(decide(Strategy::NaiveC, last.0, last.1).action, C);
            assert_eq!(decide(Strategy::NaiveD, last.0, last.1).action, D);
        }
        let d = decide(Strategy::NaiveD, N, N);
        assert!(!d.move_on_cooperate && !d.move_on_defect && d.move_on_nothing);
    }

    #[test]
    fn test_pavlov_table() {
        let cases = [((C, C), C), ((C, D), D), ((D, C), D), ((D, D), C), ((N, N), C)];
        for ((own, other), expected) in cases {
            assert_eq!(decide(Strategy::PavlovMobile, own, other).action, expected);
            assert_eq!(decide(Strategy::PavlovStationary, own, other).action, expected);
        }
    }

    #[test]
    fn test_pavlov_stationary_never_moves() {
        let d = decide(Strategy::PavlovStationary, C, D);
        assert_eq!(d.action, D);
        for partner in [C, D, N] {
            assert!(!d.moves_against(partner));
        }
        assert!(!Strategy::PavlovStationary.moves_without_partner());
    }

    #[test]
    fn test_tit_for_tat_mirrors() {
        assert_eq!(decide(Strategy::TftMobile, D, C).action, C);
        assert_eq!(decide(Strategy::TftMobile, C, D).action, D);
        assert_eq!(decide(Strategy::TftStationary, N, N).action, C);
        assert!(decide(Strategy::TftMobile, N, N).move_on_nothing);
        assert!(!decide(Strategy::TftStationary, N, N).move_on_nothing);
    }

    #[test]
    fn test_walkaway_flags() {
        for strategy in [Strategy::WalkawayC, Strategy::WalkawayD, Strategy::RealisticTft] {
            let d = decide(strategy, N, N);
            assert!(!d.moves_against(C));
            assert!(d.moves_against(D));
            assert!(d.moves_against(N));
        }
        assert_eq!(decide(Strategy::RealisticTft, C, D).action, D);
        assert_eq!(decide(Strategy::RealisticTft, D, C).action, C);
    }

    #[test]
    fn test_retreat_switch_is_permanent() {
        let mut defected = false;
        let before = Strategy::Retreat.decide(GameMemory::new(C, C), &mut defected);
        assert_eq!(before.action, C);
        assert!(!defected);

        let switch = Strategy::Retreat.decide(GameMemory::new(C, D), &mut defected);
        assert_eq!(switch.action, D);
        assert!(defected);
        assert!(!switch.move_on_cooperate);

        for last in [(C, C), (D, C), (N, N)] {
            let after = Strategy::Retreat.decide(GameMemory::new(last.0, last.1), &mut defected);
            assert_eq!(after.action, D);
            assert!(after.move_on_cooperate && after.move_on_defect && after.move_on_nothing);
        }
        assert!(defected);
    }

    #[test]
    fn test_moves_without_partner() {
        let stationary: Vec<_> = Strategy::ALL
            .into_iter()
            .filter(|s| !s.moves_without_partner())
            .collect();
        assert_eq!(stationary, vec![Strategy::TftStationary, Strategy::PavlovStationary]);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("naive_c".parse::<Strategy>().unwrap(), Strategy::NaiveC);
        assert_eq!("TFT-Mobile".parse::<Strategy>().unwrap(), Strategy::TftMobile);
        assert!(matches!(
            "grim_trigger".parse::<Strategy>(),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_action_flip() {
        assert_eq!(C.flipped(), D);
        assert_eq!(D.flipped(), C);
        assert_eq!(N.flipped(), N);
    }

    #[test]
    fn test_counts() {
        let mut counts = StrategyCounts::new();
        counts.set(Strategy::Retreat, 3);
        *counts.get_mut(Strategy::NaiveC) += 2;
        assert_eq!(counts.total(), 5);
        let order: Vec<_> = counts.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Strategy::ALL.to_vec());
        assert_eq!(Strategy::ALL[Strategy::Retreat.index()], Strategy::Retreat);
    }
}
