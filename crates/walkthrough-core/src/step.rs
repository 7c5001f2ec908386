//! The fixed, ordered procedure.
//!
//! Each of the sixteen steps has a narrative message and a declarative
//! [`Cue`] for each direction. The table is static data; the player
//! interprets cues against the resolved parts.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::id::PartRole;

// ---------------------------------------------------------------------------
// StepId
// ---------------------------------------------------------------------------

/// One stage of the procedure. The declaration order is the procedure order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepId {
    WelcomeMessage,
    CloseLaptop,
    TurnUpsideDown,
    RemoveFastenersA,
    RemoveCasingPanel,
    RemoveFastenersB,
    OpenCover,
    RemoveOldBattery,
    InsertNewBattery,
    CloseCover,
    ReinsertFastenersB,
    ReinsertCasingPanel,
    ReinsertFastenersA,
    RotateBack,
    OpenDevice,
    FinalMessage,
}

impl StepId {
    pub const COUNT: usize = 16;

    pub const FIRST: StepId = StepId::WelcomeMessage;
    pub const LAST: StepId = StepId::FinalMessage;

    pub const ALL: [StepId; StepId::COUNT] = [
        StepId::WelcomeMessage,
        StepId::CloseLaptop,
        StepId::TurnUpsideDown,
        StepId::RemoveFastenersA,
        StepId::RemoveCasingPanel,
        StepId::RemoveFastenersB,
        StepId::OpenCover,
        StepId::RemoveOldBattery,
        StepId::InsertNewBattery,
        StepId::CloseCover,
        StepId::ReinsertFastenersB,
        StepId::ReinsertCasingPanel,
        StepId::ReinsertFastenersA,
        StepId::RotateBack,
        StepId::OpenDevice,
        StepId::FinalMessage,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<StepId> {
        Self::ALL.get(index).copied()
    }

    /// The following step, or `None` at the last step.
    pub fn next(self) -> Option<StepId> {
        Self::from_index(self.index() + 1)
    }

    /// The preceding step, or `None` at the first step.
    pub fn prev(self) -> Option<StepId> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    pub fn definition(self) -> &'static StepDefinition {
        &STEPS[self.index()]
    }

    pub fn message(self) -> &'static str {
        self.definition().message
    }
}

// ---------------------------------------------------------------------------
// Cues
// ---------------------------------------------------------------------------

/// What a step animates in one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// Message only.
    Nothing,
    /// Rotate a part about an axis in its own frame.
    Rotate {
        part: PartRole,
        axis: Vec3,
        degrees: f32,
    },
    /// Rotate a whole subtree about a world axis through another part's
    /// world position.
    RotateGroup {
        group: PartRole,
        pivot: PartRole,
        axis: Vec3,
        degrees: f32,
    },
    /// Translate a part by a world-space offset, keeping its rotation.
    Slide { part: PartRole, offset: Vec3 },
    /// Remove (or insert) every fastener in a group with the tool.
    Fasteners { group: PartRole, insert: bool },
    /// Record the old battery's position and parent, detach it, and move it
    /// out by `offset`.
    ExtractBattery { offset: Vec3 },
    /// Move the old battery back to its recorded position and restore its
    /// recorded parent.
    ReturnBattery,
    /// Move the replacement battery into the old battery's recorded position
    /// and hand it to the assembly.
    InstallNewBattery,
    /// Move the replacement battery back out and restore its pre-install
    /// parent.
    UninstallNewBattery,
}

/// One entry of the procedure table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDefinition {
    pub id: StepId,
    pub message: &'static str,
    pub forward: Cue,
    pub reverse: Cue,
}

impl StepDefinition {
    pub fn cue(&self, reverse: bool) -> Cue {
        if reverse { self.reverse } else { self.forward }
    }
}

/// Lateral travel of the casing panel.
const PANEL_SLIDE: Vec3 = Vec3::new(0.3, 0.0, 0.0);
/// Where the old battery is moved to, relative to its seat.
const BATTERY_OUT: Vec3 = Vec3::new(0.8, 0.2, 0.2);

const fn rotate(part: PartRole, axis: Vec3, degrees: f32) -> Cue {
    Cue::Rotate {
        part,
        axis,
        degrees,
    }
}

const fn flip(degrees: f32) -> Cue {
    Cue::RotateGroup {
        group: PartRole::Assembly,
        pivot: PartRole::Monitor,
        axis: Vec3::Z,
        degrees,
    }
}

const fn fasteners(group: PartRole, insert: bool) -> Cue {
    Cue::Fasteners { group, insert }
}

const fn slide(offset: Vec3) -> Cue {
    Cue::Slide {
        part: PartRole::CasingPanel,
        offset,
    }
}

/// The procedure, in order. `STEPS[i].id.index() == i`.
pub static STEPS: [StepDefinition; StepId::COUNT] = [
    StepDefinition {
        id: StepId::WelcomeMessage,
        message: "First make sure that you have a new battery (AL 15A32) and a screwdriver ready. \
                  Turn off the laptop and remove every connected hardware.",
        forward: Cue::Nothing,
        reverse: Cue::Nothing,
    },
    StepDefinition {
        id: StepId::CloseLaptop,
        message: "Close the Laptop",
        forward: rotate(PartRole::Monitor, Vec3::X, 90.0),
        reverse: rotate(PartRole::Monitor, Vec3::X, -90.0),
    },
    StepDefinition {
        id: StepId::TurnUpsideDown,
        message: "Turn it upside-down",
        forward: flip(180.0),
        reverse: flip(-180.0),
    },
    StepDefinition {
        id: StepId::RemoveFastenersA,
        message: "Remove all visible screws",
        forward: fasteners(PartRole::FastenersA, false),
        reverse: fasteners(PartRole::FastenersA, true),
    },
    StepDefinition {
        id: StepId::RemoveCasingPanel,
        message: "Remove the CD-drive",
        forward: slide(Vec3::new(-PANEL_SLIDE.x, 0.0, 0.0)),
        reverse: slide(PANEL_SLIDE),
    },
    StepDefinition {
        id: StepId::RemoveFastenersB,
        message: "Remove the screws on the side",
        forward: fasteners(PartRole::FastenersB, false),
        reverse: fasteners(PartRole::FastenersB, true),
    },
    StepDefinition {
        id: StepId::OpenCover,
        message: "Open the cover",
        forward: rotate(PartRole::Cover, Vec3::X, -180.0),
        reverse: rotate(PartRole::Cover, Vec3::X, 180.0),
    },
    StepDefinition {
        id: StepId::RemoveOldBattery,
        message: "Remove the old battery",
        forward: Cue::ExtractBattery { offset: BATTERY_OUT },
        reverse: Cue::ReturnBattery,
    },
    StepDefinition {
        id: StepId::InsertNewBattery,
        message: "Insert the new battery",
        forward: Cue::InstallNewBattery,
        reverse: Cue::UninstallNewBattery,
    },
    StepDefinition {
        id: StepId::CloseCover,
        message: "Close the cover",
        forward: rotate(PartRole::Cover, Vec3::X, 180.0),
        reverse: rotate(PartRole::Cover, Vec3::X, -180.0),
    },
    StepDefinition {
        id: StepId::ReinsertFastenersB,
        message: "Insert the screws on the side",
        forward: fasteners(PartRole::FastenersB, true),
        reverse: fasteners(PartRole::FastenersB, false),
    },
    StepDefinition {
        id: StepId::ReinsertCasingPanel,
        message: "Insert the CD-drive",
        forward: slide(PANEL_SLIDE),
        reverse: slide(Vec3::new(-PANEL_SLIDE.x, 0.0, 0.0)),
    },
    StepDefinition {
        id: StepId::ReinsertFastenersA,
        message: "Insert all screws",
        forward: fasteners(PartRole::FastenersA, true),
        reverse: fasteners(PartRole::FastenersA, false),
    },
    StepDefinition {
        id: StepId::RotateBack,
        message: "Turn the laptop upside-down",
        forward: flip(-180.0),
        reverse: flip(180.0),
    },
    StepDefinition {
        id: StepId::OpenDevice,
        message: "Open the laptop, turn it on and test its functionalities. Ready!",
        forward: rotate(PartRole::Monitor, Vec3::X, -90.0),
        reverse: rotate(PartRole::Monitor, Vec3::X, 90.0),
    },
    StepDefinition {
        id: StepId::FinalMessage,
        message: "FinalMessage",
        forward: Cue::Nothing,
        reverse: Cue::Nothing,
    },
];

/// Look up the definition at `index`, or `None` past the end.
pub fn definition_at(index: usize) -> Option<&'static StepDefinition> {
    STEPS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_and_complete() {
        assert_eq!(STEPS.len(), StepId::COUNT);
        for (i, def) in STEPS.iter().enumerate() {
            assert_eq!(def.id.index(), i);
            assert_eq!(StepId::ALL[i], def.id);
            assert!(!def.message.is_empty());
        }
    }

    #[test]
    fn next_and_prev_are_clamped() {
        assert_eq!(StepId::FIRST.prev(), None);
        assert_eq!(StepId::LAST.next(), None);
        assert_eq!(StepId::WelcomeMessage.next(), Some(StepId::CloseLaptop));
        assert_eq!(StepId::FinalMessage.prev(), Some(StepId::OpenDevice));
        assert_eq!(StepId::from_index(16), None);
        assert_eq!(StepId::from_index(15), Some(StepId::FinalMessage));
    }

    #[test]
    fn final_step_is_named_by_its_id() {
        let name = format!("{:?}", StepId::FinalMessage);
        assert_eq!(StepId::FinalMessage.message(), name);
        assert_eq!(StepId::FinalMessage.definition().forward, Cue::Nothing);
    }

    #[test]
    fn definition_at_bounds() {
        assert_eq!(definition_at(0).map(|d| d.id), Some(StepId::WelcomeMessage));
        assert!(definition_at(StepId::COUNT).is_none());
    }

    #[test]
    fn cues_select_direction() {
        let def = StepId::CloseLaptop.definition();
        assert_eq!(def.cue(false), rotate(PartRole::Monitor, Vec3::X, 90.0));
        assert_eq!(def.cue(true), rotate(PartRole::Monitor, Vec3::X, -90.0));
    }

    #[test]
    fn rotations_cancel_across_directions() {
        for def in &STEPS {
            match (def.forward, def.reverse) {
                (Cue::Rotate { degrees: f, .. }, Cue::Rotate { degrees: r, .. })
                | (Cue::RotateGroup { degrees: f, .. }, Cue::RotateGroup { degrees: r, .. }) => {
                    assert_eq!(f, -r, "{:?}", def.id)
                }
                (Cue::Slide { offset: f, .. }, Cue::Slide { offset: r, .. }) => {
                    assert_eq!(f, -r, "{:?}", def.id)
                }
                (Cue::Fasteners { insert: f, .. }, Cue::Fasteners { insert: r, .. }) => {
                    assert_ne!(f, r, "{:?}", def.id)
                }
                _ => {}
            }
        }
    }

    #[test]
    fn whole_procedure_nets_to_zero_rotation() {
        let mut monitor = 0.0;
        let mut assembly = 0.0;
        for def in &STEPS {
            match def.forward {
                Cue::Rotate {
                    part: PartRole::Monitor,
                    degrees,
                    ..
                } => monitor += degrees,
                Cue::RotateGroup { degrees, .. } => assembly += degrees,
                _ => {}
            }
        }
        assert_eq!(monitor, 0.0);
        assert_eq!(assembly, 0.0);
    }
}
