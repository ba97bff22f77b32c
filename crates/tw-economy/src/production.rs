//! Production (outputs only) and transformation (inputs to outputs).

use std::sync::Arc;

use tracing::debug;

use tw_world::{Activity, Structure, StructureSpec, WorldSnapshot};

use crate::{EconomyEngine, EconomyReport};

/// Every output of one batch fits under its cap.
pub fn batch_fits(structure: &Structure, spec: &StructureSpec) -> bool {
    spec.produces.iter().all(|(&r, &qty)| structure.stock(r) + qty <= spec.cap_for(r))
}

/// Every input of one batch is in stock.
pub fn inputs_ready(structure: &Structure, spec: &StructureSpec) -> bool {
    spec.consumes.iter().all(|(&r, &qty)| structure.stock(r) >= qty)
}

fn output_batch(structure: &mut Structure, spec: &StructureSpec) {
    for (&r, &qty) in &spec.produces {
        structure.deposit(spec, r, qty);
    }
}

impl EconomyEngine {
    /// Advance accumulators of complete producers by `dt × effective
    /// workers` and emit a batch per full interval while output fits.  A
    /// blocked producer keeps everything it has accumulated.
    pub(crate) fn produce(&self, world: &mut WorldSnapshot, dt_ms: u64, report: &mut EconomyReport) {
        let catalog = Arc::clone(&world.catalog);
        for slot in 0..world.structures.len() {
            let s = &world.structures[slot];
            let Some(spec) = catalog.get(s.kind) else { continue };
            if !s.complete || !spec.is_producer() || spec.production_interval_ms == 0 {
                continue;
            }
            let effective = (s.workers.len() as u64).min(u64::from(spec.max_effective_workers));
            if effective == 0 {
                continue;
            }

            let interval = spec.production_interval_ms;
            let mut next = s.clone();
            next.production_acc_ms = next.production_acc_ms.saturating_add(dt_ms * effective);
            let mut batches = 0;
            while next.production_acc_ms >= interval {
                if !batch_fits(&next, spec) {
                    break;
                }
                output_batch(&mut next, spec);
                next.production_acc_ms -= interval;
                batches += 1;
            }
            if batches > 0 {
                debug!(structure = %next.id, kind = ?next.kind, batches, "produced");
            }
            report.batches_produced += batches;
            world.patch_structure(slot, next);
        }
    }

    /// One batch per tick for each complete transformer with a worker on
    /// site.  Output room is checked before any input is consumed.
    pub(crate) fn transform(&self, world: &mut WorldSnapshot, report: &mut EconomyReport) {
        let catalog = Arc::clone(&world.catalog);
        let margin = self.cfg.influence_margin;
        for slot in 0..world.structures.len() {
            let s = &world.structures[slot];
            let Some(spec) = catalog.get(s.kind) else { continue };
            if !s.complete || !spec.is_transformer() {
                continue;
            }
            let staffed = s.workers.iter().any(|&w| {
                world.agent(w).is_some_and(|a| {
                    a.workplace == Some(s.id)
                        && a.activity == Activity::Working
                        && world.in_influence(s.id, a.pos, margin)
                })
            });
            if !staffed || !batch_fits(s, spec) || !inputs_ready(s, spec) {
                continue;
            }

            let mut next = s.clone();
            for (&r, &qty) in &spec.consumes {
                next.withdraw(r, qty);
            }
            output_batch(&mut next, spec);
            debug!(structure = %next.id, kind = ?next.kind, "transformed");
            report.batches_transformed += 1;
            world.patch_structure(slot, next);
        }
    }
}
