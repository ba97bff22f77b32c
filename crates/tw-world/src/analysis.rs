//! Per-tick world analysis: what the planner needs to know about structures
//! before it picks intents.

use serde::{Deserialize, Serialize};

use tw_core::{StructureId, Tick, Vec2};

use crate::catalog::{StructureCatalog, StructureKind};
use crate::structure::Structure;

/// An open job.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workplace {
    pub structure: StructureId,
    pub kind: StructureKind,
    pub open_slots: u32,
    pub pos: Vec2,
}

/// A visitable hotspot and its free (unoccupied, unreserved) slots.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub structure: StructureId,
    pub kind: StructureKind,
    pub free: u32,
    pub pos: Vec2,
}

/// A renderable point of interest.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub structure: StructureId,
    pub kind: StructureKind,
    pub pos: Vec2,
    pub complete: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldAnalysis {
    /// Tick this analysis describes.  `None` until first computed.
    pub computed_at: Option<Tick>,
    /// Sorted by structure id.
    pub workplaces: Vec<Workplace>,
    /// Sorted by structure id.
    pub hotspots: Vec<Hotspot>,
    pub pois: Vec<Poi>,
}

impl WorldAnalysis {
    pub fn compute(structures: &[Structure], catalog: &StructureCatalog, tick: Tick) -> Self {
        let mut out = WorldAnalysis { computed_at: Some(tick), ..Default::default() };

        for s in structures {
            let Some(spec) = catalog.get(s.kind) else { continue };
            let pos = s.center(spec);

            out.pois.push(Poi { structure: s.id, kind: s.kind, pos, complete: s.complete });

            let open_slots = s.open_worker_slots(spec);
            if open_slots > 0 {
                out.workplaces.push(Workplace { structure: s.id, kind: s.kind, open_slots, pos });
            }
            if s.complete && spec.is_hotspot() {
                out.hotspots.push(Hotspot {
                    structure: s.id,
                    kind: s.kind,
                    free: s.hotspot_free(spec),
                    pos,
                });
            }
        }

        out.workplaces.sort_by_key(|w| w.structure);
        out.hotspots.sort_by_key(|h| h.structure);
        out
    }

    /// `true` if this analysis was computed on `tick`.
    #[inline]
    pub fn is_current(&self, tick: Tick) -> bool {
        self.computed_at == Some(tick)
    }

    /// Workplaces with open slots on `tick`; empty when the analysis is stale.
    pub fn open_workplaces(&self, tick: Tick) -> &[Workplace] {
        if self.is_current(tick) { &self.workplaces } else { &[] }
    }
}
