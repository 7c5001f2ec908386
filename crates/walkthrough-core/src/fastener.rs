//! Fastener removal and insertion with the tool.
//!
//! A fastener group is a part whose children are the fasteners, in authored
//! order. Removal walks that order; insertion walks it backwards. For each
//! fastener the tool first moves to an approach pose above it, then the
//! fastener moves (rotation unchanged) to its terminal target: the shared
//! staging position when removing, its recorded original position when
//! inserting.
//!
//! Original positions are captured in an [`OriginalPoseMap`] the first time a
//! fastener is seen and never overwritten, so any number of remove/insert
//! cycles return each fastener to the same place.

use glam::{Quat, Vec3};
use slotmap::SecondaryMap;

use crate::choreography::{Choreography, Frame, MoveAndRotate, TickStatus};
use crate::config::FastenerConfig;
use crate::id::PartId;
use crate::pose::{Pose, euler_degrees};
use crate::scene::{SceneError, SceneGraph};

// ---------------------------------------------------------------------------
// OriginalPoseMap
// ---------------------------------------------------------------------------

/// Write-once map from fastener to its world position at first encounter.
#[derive(Debug, Clone, Default)]
pub struct OriginalPoseMap {
    positions: SecondaryMap<PartId, Vec3>,
}

impl OriginalPoseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `position` for `part` unless an entry already exists. Returns the
    /// stored (first-recorded) position either way.
    pub fn record_if_absent(&mut self, part: PartId, position: Vec3) -> Vec3 {
        if let Some(existing) = self.positions.get(part) {
            return *existing;
        }
        self.positions.insert(part, position);
        position
    }

    pub fn get(&self, part: PartId) -> Option<Vec3> {
        self.positions.get(part).copied()
    }

    pub fn contains(&self, part: PartId) -> bool {
        self.positions.contains_key(part)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FastenerSequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Tool,
    Fastener,
}

#[derive(Debug, Clone, Copy)]
struct Fastener {
    part: PartId,
    original: Vec3,
}

/// One-at-a-time removal (or insertion) of every fastener in a group.
#[derive(Debug, Clone)]
pub struct FastenerSequence {
    tool: PartId,
    insert: bool,
    duration: f32,
    staging: Vec3,
    tool_offset: Vec3,
    tool_rotation: Quat,
    /// Fasteners in visiting order.
    fasteners: Vec<Fastener>,
    tool_backup: Pose,
    cursor: usize,
    active: Option<(Leg, MoveAndRotate)>,
}

impl FastenerSequence {
    /// Capture the group's fasteners (recording first-seen originals) and the
    /// tool's current pose.
    pub fn new(
        scene: &SceneGraph,
        originals: &mut OriginalPoseMap,
        group: PartId,
        tool: PartId,
        insert: bool,
        duration: f32,
        config: &FastenerConfig,
    ) -> Result<Self, SceneError> {
        let mut fasteners = Vec::with_capacity(scene.children(group).len());
        for &part in scene.children(group) {
            let position = scene.world_pose(part)?.position;
            fasteners.push(Fastener {
                part,
                original: originals.record_if_absent(part, position),
            });
        }
        if insert {
            fasteners.reverse();
        }

        Ok(Self {
            tool,
            insert,
            duration,
            staging: config.staging_position,
            tool_offset: config.tool_offset,
            tool_rotation: euler_degrees(config.tool_approach_euler_deg),
            fasteners,
            tool_backup: scene.world_pose(tool)?,
            cursor: 0,
            active: None,
        })
    }

    /// Whether this sequence inserts (rather than removes) fasteners.
    pub fn is_insertion(&self) -> bool {
        self.insert
    }

    /// Fasteners in the order they are visited.
    pub fn order(&self) -> Vec<PartId> {
        self.fasteners.iter().map(|f| f.part).collect()
    }

    /// Where `fastener` ends up when this sequence finishes.
    fn terminal(&self, fastener: &Fastener) -> Vec3 {
        if self.insert {
            fastener.original
        } else {
            self.staging
        }
    }

    fn begin_leg(&mut self, scene: &SceneGraph, leg: Leg) -> Result<(), SceneError> {
        let fastener = self.fasteners[self.cursor];
        let motion = match leg {
            Leg::Tool => {
                let base = if self.insert {
                    fastener.original
                } else {
                    scene.world_pose(fastener.part)?.position
                };
                MoveAndRotate::new(
                    scene,
                    self.tool,
                    Pose::new(base + self.tool_offset, self.tool_rotation),
                    self.duration,
                )?
            }
            Leg::Fastener => MoveAndRotate::translate_to(
                scene,
                fastener.part,
                self.terminal(&fastener),
                self.duration,
            )?,
        };
        self.active = Some((leg, motion));
        Ok(())
    }

    /// Natural end. The tool goes back to where it started only after an
    /// insertion; an uninterrupted removal leaves it at the last fastener.
    fn complete(&mut self, scene: &mut SceneGraph) -> Result<TickStatus, SceneError> {
        if self.insert {
            scene.set_world_pose(self.tool, self.tool_backup)?;
        }
        Ok(TickStatus::Done)
    }

    /// Interrupted end: every fastener jumps to its terminal target and the
    /// tool goes back to where it started.
    fn skip(&mut self, scene: &mut SceneGraph) -> Result<TickStatus, SceneError> {
        self.active = None;
        for fastener in &self.fasteners {
            scene.set_world_position(fastener.part, self.terminal(fastener))?;
        }
        scene.set_world_pose(self.tool, self.tool_backup)?;
        log::debug!(
            "fastener sequence skipped at {}/{}",
            self.cursor,
            self.fasteners.len()
        );
        Ok(TickStatus::Done)
    }
}

impl Choreography for FastenerSequence {
    fn tick(&mut self, scene: &mut SceneGraph, frame: Frame) -> Result<TickStatus, SceneError> {
        if frame.interrupted {
            return self.skip(scene);
        }
        if self.cursor >= self.fasteners.len() {
            return self.complete(scene);
        }
        if self.active.is_none() {
            self.begin_leg(scene, Leg::Tool)?;
        }

        let Some((leg, motion)) = self.active.as_mut() else {
            return Ok(TickStatus::Continue);
        };
        let leg = *leg;
        if motion.tick(scene, frame)? == TickStatus::Continue {
            return Ok(TickStatus::Continue);
        }

        match leg {
            Leg::Tool => self.begin_leg(scene, Leg::Fastener)?,
            Leg::Fastener => {
                self.active = None;
                self.cursor += 1;
                if self.cursor >= self.fasteners.len() {
                    return self.complete(scene);
                }
            }
        }
        Ok(TickStatus::Continue)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choreography::run_to_end;

    const EPS: f32 = 1e-4;

    struct Fixture {
        scene: SceneGraph,
        group: PartId,
        tool: PartId,
        screws: Vec<PartId>,
        originals: OriginalPoseMap,
        config: FastenerConfig,
    }

    fn fixture(count: usize) -> Fixture {
        let mut scene = SceneGraph::new();
        let group = scene
            .add_part("Screws", None, Pose::from_position(Vec3::new(0.0, 0.1, 0.0)))
            .unwrap();
        let screws = (0..count)
            .map(|i| {
                scene
                    .add_part(
                        &format!("screw{i}"),
                        Some(group),
                        Pose::from_position(Vec3::new(i as f32 * 0.2, 0.0, 0.3)),
                    )
                    .unwrap()
            })
            .collect();
        let tool = scene
            .add_part("tool", None, Pose::from_position(Vec3::new(1.0, 1.0, 1.0)))
            .unwrap();
        Fixture {
            scene,
            group,
            tool,
            screws,
            originals: OriginalPoseMap::new(),
            config: FastenerConfig::default(),
        }
    }

    fn sequence(f: &mut Fixture, insert: bool) -> FastenerSequence {
        FastenerSequence::new(
            &f.scene,
            &mut f.originals,
            f.group,
            f.tool,
            insert,
            0.1,
            &f.config,
        )
        .unwrap()
    }

    fn position(f: &Fixture, id: PartId) -> Vec3 {
        f.scene.world_pose(id).unwrap().position
    }

    // -----------------------------------------------------------------------
    // OriginalPoseMap
    // -----------------------------------------------------------------------

    #[test]
    fn original_pose_map_is_write_once() {
        let f = fixture(1);
        let mut map = OriginalPoseMap::new();
        assert_eq!(map.record_if_absent(f.screws[0], Vec3::X), Vec3::X);
        assert_eq!(map.record_if_absent(f.screws[0], Vec3::Y), Vec3::X);
        assert_eq!(map.get(f.screws[0]), Some(Vec3::X));
        assert_eq!(map.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn removal_uses_natural_order_insertion_reversed() {
        let mut f = fixture(3);
        let removal = sequence(&mut f, false);
        assert_eq!(removal.order(), f.screws);
        let insertion = sequence(&mut f, true);
        let mut reversed = f.screws.clone();
        reversed.reverse();
        assert_eq!(insertion.order(), reversed);
        assert!(insertion.is_insertion());
    }

    #[test]
    fn first_encounter_records_originals() {
        let mut f = fixture(3);
        let _ = sequence(&mut f, false);
        assert_eq!(f.originals.len(), 3);
        for &s in &f.screws {
            assert!(f.originals.get(s).unwrap().distance(position(&f, s)) < EPS);
        }
    }

    // -----------------------------------------------------------------------
    // Removal / insertion
    // -----------------------------------------------------------------------

    #[test]
    fn removal_parks_every_fastener_and_leaves_tool_at_last() {
        let mut f = fixture(3);
        let mut seq = sequence(&mut f, false);
        run_to_end(&mut seq, &mut f.scene, 0.05).unwrap();
        for &s in &f.screws {
            assert!(position(&f, s).distance(f.config.staging_position) < EPS);
        }
        let last_original = f.originals.get(f.screws[2]).unwrap();
        let tool = f.scene.world_pose(f.tool).unwrap();
        assert!(tool.position.distance(last_original + f.config.tool_offset) < EPS);
    }

    #[test]
    fn fastener_rotation_unchanged() {
        let mut f = fixture(2);
        let before = f.scene.world_pose(f.screws[0]).unwrap().rotation;
        let mut seq = sequence(&mut f, false);
        run_to_end(&mut seq, &mut f.scene, 0.05).unwrap();
        let after = f.scene.world_pose(f.screws[0]).unwrap().rotation;
        assert!(crate::pose::rotation_distance(before, after) < EPS);
    }

    #[test]
    fn insertion_restores_originals_and_tool() {
        let mut f = fixture(3);
        let tool_before = f.scene.world_pose(f.tool).unwrap();
        let mut removal = sequence(&mut f, false);
        run_to_end(&mut removal, &mut f.scene, 0.05).unwrap();

        let tool_after_removal = f.scene.world_pose(f.tool).unwrap();
        let mut insertion = sequence(&mut f, true);
        run_to_end(&mut insertion, &mut f.scene, 0.05).unwrap();

        for &s in &f.screws {
            assert!(position(&f, s).distance(f.originals.get(s).unwrap()) < EPS);
        }
        // Insertion restores the tool to its pose at the start of the insertion.
        assert!(f.scene.world_pose(f.tool).unwrap().approx_eq(&tool_after_removal, EPS));
        assert!(!tool_after_removal.approx_eq(&tool_before, EPS));
    }

    #[test]
    fn repeated_cycles_reuse_first_originals() {
        let mut f = fixture(3);
        let firsts: Vec<Vec3> = f.screws.iter().map(|&s| position(&f, s)).collect();
        for _ in 0..3 {
            let mut removal = sequence(&mut f, false);
            run_to_end(&mut removal, &mut f.scene, 0.05).unwrap();
            let mut insertion = sequence(&mut f, true);
            run_to_end(&mut insertion, &mut f.scene, 0.05).unwrap();
        }
        for (s, first) in f.screws.iter().zip(&firsts) {
            assert_eq!(f.originals.get(*s), Some(*first));
            assert!(position(&f, *s).distance(*first) < EPS);
        }
    }

    #[test]
    fn visits_one_fastener_at_a_time() {
        let mut f = fixture(2);
        let mut seq = sequence(&mut f, false);
        // Tool leg and fastener leg for the first screw.
        for _ in 0..4 {
            seq.tick(&mut f.scene, Frame::new(0.05)).unwrap();
        }
        assert!(position(&f, f.screws[0]).distance(f.config.staging_position) < EPS);
        let second_original = f.originals.get(f.screws[1]).unwrap();
        assert!(position(&f, f.screws[1]).distance(second_original) < EPS);
    }

    // -----------------------------------------------------------------------
    // Interruption
    // -----------------------------------------------------------------------

    #[test]
    fn interrupted_removal_parks_all_and_restores_tool() {
        for ticks_before_skip in 0..12 {
            let mut f = fixture(4);
            let tool_before = f.scene.world_pose(f.tool).unwrap();
            let mut seq = sequence(&mut f, false);
            let mut done = false;
            for _ in 0..ticks_before_skip {
                if seq.tick(&mut f.scene, Frame::new(0.04)).unwrap() == TickStatus::Done {
                    done = true;
                    break;
                }
            }
            if done {
                continue;
            }
            assert_eq!(seq.tick(&mut f.scene, Frame::interrupted()).unwrap(), TickStatus::Done);
            for &s in &f.screws {
                assert!(position(&f, s).distance(f.config.staging_position) < EPS);
            }
            assert!(f.scene.world_pose(f.tool).unwrap().approx_eq(&tool_before, EPS));
        }
    }

    #[test]
    fn interrupted_insertion_returns_all_to_originals() {
        let mut f = fixture(4);
        let mut removal = sequence(&mut f, false);
        run_to_end(&mut removal, &mut f.scene, 0.05).unwrap();

        let mut insertion = sequence(&mut f, true);
        insertion.tick(&mut f.scene, Frame::new(0.05)).unwrap();
        insertion.tick(&mut f.scene, Frame::new(0.07)).unwrap();
        insertion.tick(&mut f.scene, Frame::interrupted()).unwrap();
        for &s in &f.screws {
            assert!(position(&f, s).distance(f.originals.get(s).unwrap()) < EPS);
        }
    }

    #[test]
    fn empty_group_finishes_immediately() {
        let mut f = fixture(0);
        let mut seq = sequence(&mut f, false);
        assert_eq!(seq.tick(&mut f.scene, Frame::new(0.1)).unwrap(), TickStatus::Done);
    }
}
