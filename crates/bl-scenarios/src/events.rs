//! Threshold and event flags surfaced with every frame.

use serde::{Deserialize, Serialize};

/// Boolean conditions a scenario reports to rendering.
///
/// Flags that only make sense while running (bulb blown, short circuit,
/// total internal reflection, equilibrium) are left false when stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    pub can_slide: bool,
    pub bulb_blown: bool,
    pub short_circuit: bool,
    pub total_internal_reflection: bool,
    pub equilibrium: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CanSlide,
    BulbBlown,
    ShortCircuit,
    TotalInternalReflection,
    Equilibrium,
}

impl EventFlags {
    pub fn is_set(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::CanSlide => self.can_slide,
            EventKind::BulbBlown => self.bulb_blown,
            EventKind::ShortCircuit => self.short_circuit,
            EventKind::TotalInternalReflection => self.total_internal_reflection,
            EventKind::Equilibrium => self.equilibrium,
        }
    }

    pub fn active(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| self.is_set(*k))
            .collect()
    }

    /// Flags set now that were clear in `previous` (rising edges).
    pub fn newly_raised(&self, previous: &EventFlags) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| self.is_set(*k) && !previous.is_set(*k))
            .collect()
    }
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::CanSlide,
        EventKind::BulbBlown,
        EventKind::ShortCircuit,
        EventKind::TotalInternalReflection,
        EventKind::Equilibrium,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_edges_only() {
        let before = EventFlags {
            can_slide: true,
            ..EventFlags::default()
        };
        let after = EventFlags {
            can_slide: true,
            bulb_blown: true,
            ..EventFlags::default()
        };
        assert_eq!(after.newly_raised(&before), vec![EventKind::BulbBlown]);
        assert!(before.newly_raised(&after).is_empty());
        assert_eq!(after.active().len(), 2);
    }
}
