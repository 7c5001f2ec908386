use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a part (scene node) in the scene graph.
    pub struct PartId;
}

/// The role a resolved part plays in the procedure.
///
/// Steps refer to parts by role; the [`crate::registry::PartRegistry`] maps
/// each role to the concrete [`PartId`] resolved at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartRole {
    /// The root of the whole device. Rotated as a group when flipping.
    Assembly,
    /// The main-body pivot (the hinged display).
    Monitor,
    /// The electronics cover that opens to expose the battery.
    Cover,
    /// The battery being replaced.
    OldBattery,
    /// The removable casing panel (drive bay).
    CasingPanel,
    /// First fastener group (visible screws).
    FastenersA,
    /// Second fastener group (side screws).
    FastenersB,
    /// The screwdriver.
    Tool,
    /// The replacement battery.
    NewBattery,
}

impl PartRole {
    /// Every role, in registry resolution order.
    pub const ALL: [PartRole; 9] = [
        PartRole::Assembly,
        PartRole::Monitor,
        PartRole::Cover,
        PartRole::OldBattery,
        PartRole::CasingPanel,
        PartRole::FastenersA,
        PartRole::FastenersB,
        PartRole::Tool,
        PartRole::NewBattery,
    ];
}
