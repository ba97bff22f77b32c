//! Construction sites: atomic cost consumption and builder-driven progress.

use std::sync::Arc;

use tracing::{debug, trace};

use tw_core::StructureId;
use tw_world::{Intent, Structure, StructureSpec, WorldSnapshot};

use crate::{EconomyEngine, EconomyReport};

/// Take the whole build cost out of the site's inventory at once.
fn consume_cost(site: &mut Structure, spec: &StructureSpec) {
    for (&r, &qty) in &spec.build_cost {
        site.withdraw(r, qty);
    }
    site.build_started = true;
}

fn finish(site: &mut Structure) {
    site.build_progress = 100.0;
    site.complete = true;
}

impl EconomyEngine {
    /// `funded` lists the sites whose cost was met before this pass's
    /// deliveries; only those may complete without a builder.
    pub(crate) fn construct(
        &self,
        world: &mut WorldSnapshot,
        dt_ms: u64,
        funded: &[StructureId],
        report: &mut EconomyReport,
    ) {
        let catalog = Arc::clone(&world.catalog);
        let mut completed = Vec::new();

        for slot in 0..world.structures.len() {
            let s = &world.structures[slot];
            if s.complete {
                continue;
            }
            let Some(spec) = catalog.get(s.kind) else { continue };
            if !s.cost_met(spec) {
                continue;
            }
            let builders = match self.builders_at(world, s.id) {
                Ok(n) => n,
                Err(err) => {
                    debug!(%err, "construction skipped");
                    continue;
                }
            };

            let mut next = s.clone();
            if builders == 0 {
                if !self.cfg.free_complete || !funded.contains(&next.id) {
                    continue;
                }
                if !next.build_started {
                    consume_cost(&mut next, spec);
                    report.sites_started += 1;
                }
                finish(&mut next);
            } else {
                if !next.build_started {
                    consume_cost(&mut next, spec);
                    report.sites_started += 1;
                    debug!(structure = %next.id, kind = ?next.kind, builders, "construction started");
                }
                let gain = self.cfg.build_rate_per_builder * builders as f32 * dt_ms as f32 / 1000.0;
                next.build_progress = (next.build_progress + gain).min(100.0);
                trace!(structure = %next.id, progress = next.build_progress, builders, "building");
                if next.build_progress >= 100.0 {
                    finish(&mut next);
                }
            }

            if next.complete {
                completed.push(next.id);
            }
            world.patch_structure(slot, next);
        }

        if completed.is_empty() {
            return;
        }
        report.sites_completed += completed.len() as u32;
        world.bump_structure_revision();

        // Builders of a finished site go back to picking tasks.
        for slot in 0..world.agents.len() {
            let Intent::Construct { target } = world.agents[slot].intent else { continue };
            if completed.contains(&target) {
                let mut agent = world.agents[slot].clone();
                agent.intent = Intent::Work;
                agent.goal_target = None;
                world.patch_agent(slot, agent);
            }
        }
        for id in &completed {
            debug!(structure = %id, "construction complete");
        }
    }
}
