//! Timed power-up effects and the search flags they imply.

use std::collections::BTreeMap;
use std::fmt;

use horde_paths::SearchFlags;
use log::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Effect {
    /// Timed like the others but inert: combat is not modelled.
    DoubleDamage,
    /// Seekers stop moving.
    Freeze,
    /// The survivor may walk into walls.
    ThroughWalls,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DoubleDamage => "double damage",
            Self::Freeze => "freeze",
            Self::ThroughWalls => "through walls",
        })
    }
}

/// Active effects with their remaining ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    active: BTreeMap<Effect, u32>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `effect` for `ticks` ticks, restarting the countdown if it is
    /// already running. Zero ticks cancels it.
    pub fn activate(&mut self, effect: Effect, ticks: u32) {
        if ticks == 0 {
            self.active.remove(&effect);
            return;
        }
        debug!("{effect} active for {ticks} ticks");
        self.active.insert(effect, ticks);
    }

    #[inline]
    pub fn is_active(&self, effect: Effect) -> bool {
        self.active.contains_key(&effect)
    }

    pub fn remaining(&self, effect: Effect) -> Option<u32> {
        self.active.get(&effect).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Effect, u32)> + '_ {
        self.active.iter().map(|(&e, &t)| (e, t))
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Count every effect down by one tick and return those that ran out.
    pub fn tick(&mut self) -> Vec<Effect> {
        let mut expired = Vec::new();
        self.active.retain(|&effect, ticks| {
            *ticks -= 1;
            if *ticks == 0 {
                expired.push(effect);
            }
            *ticks > 0
        });
        for effect in &expired {
            debug!("{effect} expired");
        }
        expired
    }

    /// How searches toward the survivor must treat walls.
    pub fn search_flags(&self) -> SearchFlags {
        if self.is_active(Effect::ThroughWalls) {
            SearchFlags::THROUGH_WALLS
        } else {
            SearchFlags::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_count_down_and_expire() {
        let mut m = Modifiers::new();
        m.activate(Effect::Freeze, 2);
        m.activate(Effect::ThroughWalls, 3);
        assert!(m.is_active(Effect::Freeze));
        assert!(m.tick().is_empty());
        assert_eq!(m.remaining(Effect::Freeze), Some(1));
        assert_eq!(m.tick(), vec![Effect::Freeze]);
        assert!(!m.is_active(Effect::Freeze));
        assert_eq!(m.tick(), vec![Effect::ThroughWalls]);
        assert!(m.is_empty());
        assert!(m.tick().is_empty());
    }

    #[test]
    fn reactivation_restarts_the_countdown() {
        let mut m = Modifiers::new();
        m.activate(Effect::DoubleDamage, 2);
        m.tick();
        m.activate(Effect::DoubleDamage, 2);
        assert_eq!(m.remaining(Effect::DoubleDamage), Some(2));
        m.activate(Effect::DoubleDamage, 0);
        assert!(!m.is_active(Effect::DoubleDamage));
    }

    #[test]
    fn only_through_walls_changes_search_flags() {
        let mut m = Modifiers::new();
        m.activate(Effect::Freeze, 5);
        m.activate(Effect::DoubleDamage, 5);
        assert!(m.search_flags().is_empty());
        m.activate(Effect::ThroughWalls, 5);
        assert_eq!(m.search_flags(), SearchFlags::THROUGH_WALLS);
    }
}
