//! Hotspot slot bookkeeping and destination choice.
//!
//! A visit holds one slot from the moment it is planned: `reserved` while
//! the visitor is on the way, `occupants` once they arrive.  Free slots are
//! `capacity - occupants - reserved`, so agents planning in the same tick
//! can never book more visitors than the hotspot holds.

use tw_core::{AgentRng, StructureId, Vec2};
use tw_world::{StructureKind, WorldSnapshot};

/// Take a reservation if a slot is free.  Returns `false` when full or gone.
pub fn reserve(world: &mut WorldSnapshot, id: StructureId) -> bool {
    let free = match world.structure(id) {
        Some(s) => world.catalog.get(s.kind).map(|spec| s.hotspot_free(spec)).unwrap_or(0),
        None => 0,
    };
    if free == 0 {
        return false;
    }
    match world.structure_mut(id) {
        Some(s) => {
            s.reserved += 1;
            true
        }
        None => false,
    }
}

/// Give a reservation back without visiting.
pub fn release_reservation(world: &mut WorldSnapshot, id: StructureId) {
    if let Some(s) = world.structure_mut(id) {
        s.reserved = s.reserved.saturating_sub(1);
    }
}

/// Convert a reservation into an occupant on arrival.
pub fn occupy(world: &mut WorldSnapshot, id: StructureId) {
    if let Some(s) = world.structure_mut(id) {
        s.reserved = s.reserved.saturating_sub(1);
        s.occupants += 1;
    }
}

/// A visitor leaves.
pub fn leave(world: &mut WorldSnapshot, id: StructureId) {
    if let Some(s) = world.structure_mut(id) {
        s.occupants = s.occupants.saturating_sub(1);
    }
}

/// Pick a hotspot of one of `kinds` with a free slot, weighted towards the
/// nearest: with `n` candidates sorted by distance the one at rank `i`
/// carries weight `n - i`.
///
/// Candidates come from the world analysis but free slots are re-read from
/// the live structure, since earlier agents this tick may have booked them.
pub fn choose_hotspot(
    world: &WorldSnapshot,
    kinds: &[StructureKind],
    from: Vec2,
    rng: &mut AgentRng,
) -> Option<StructureId> {
    let mut candidates: Vec<(f32, StructureId)> = world
        .analysis
        .hotspots
        .iter()
        .filter(|h| kinds.contains(&h.kind))
        .filter(|h| {
            world
                .structure(h.structure)
                .and_then(|s| world.catalog.get(s.kind).map(|spec| s.complete && s.hotspot_free(spec) > 0))
                .unwrap_or(false)
        })
        .map(|h| (h.pos.distance_sq(from), h.structure))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let n = candidates.len() as u32;
    let weights: Vec<u32> = (0..n).map(|rank| n - rank).collect();
    let pick = rng.weighted_index(&weights)?;
    Some(candidates[pick].1)
}
