use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::rtc::{CallOutcome, WashId};

use super::{RoutineContext, RoutineKind};

/// Runs one iteration of `kind`. Every timing record produced on the way is
/// handed to the sink, including those of steps that failed.
pub(crate) async fn run_tick(kind: RoutineKind, ctx: &RoutineContext) {
    match kind {
        RoutineKind::Enqueue => enqueue_tick(ctx).await,
        RoutineKind::List => list_tick(ctx).await,
        RoutineKind::Relocate => relocate_tick(ctx).await,
    }
}

async fn enqueue_tick(ctx: &RoutineContext) {
    let Some(wash) = enqueue(ctx, RoutineKind::Enqueue).await else {
        return;
    };
    if ctx.policy.delete_after_enqueue {
        delete(ctx, RoutineKind::Enqueue, wash).await;
    }
}

async fn list_tick(ctx: &RoutineContext) {
    let CallOutcome { record, result } = ctx.api.list_queue().await;
    ctx.records.submit(record).await;
    match result {
        Ok(Some(entries)) => debug!(entries = entries.len(), "Listed controller queue"),
        Ok(None) => debug!("Controller returned no queue"),
        Err(err) => warn!(routine = %RoutineKind::List, error = %err, "Failed to list queue"),
    }
}

async fn relocate_tick(ctx: &RoutineContext) {
    let routine = RoutineKind::Relocate;
    let Some(wash) = enqueue(ctx, routine).await else {
        return;
    };

    let CallOutcome { record, result } = ctx.api.list_queue().await;
    ctx.records.submit(record).await;
    let queue_len = match result {
        Ok(entries) => entries.map_or(0, |entries| entries.len()),
        Err(err) => {
            warn!(routine = %routine, error = %err, "Failed to list queue; not attempting move");
            delete(ctx, routine, wash).await;
            return;
        }
    };

    let mut rng = StdRng::from_entropy();
    match pick_target(&mut rng, queue_len, ctx.policy.include_head) {
        Some(before) => {
            let CallOutcome { record, result } = ctx.api.move_wash(wash, before).await;
            ctx.records.submit(record).await;
            if let Err(err) = result {
                warn!(routine = %routine, wash_id = %wash, before, error = %err, "Failed to move wash");
            }
        }
        None => debug!(routine = %routine, queue_len, "Queue too short for a move"),
    }

    delete(ctx, routine, wash).await;
}

/// Queues the synthetic wash and returns its id when the controller sent one.
async fn enqueue(ctx: &RoutineContext, routine: RoutineKind) -> Option<WashId> {
    let CallOutcome { record, result } = ctx.api.enqueue_wash(ctx.policy.package).await;
    ctx.records.submit(record).await;
    match result {
        Ok(Some(wash)) => Some(wash),
        Ok(None) => {
            debug!(routine = %routine, "Controller returned no wash id");
            None
        }
        Err(err) => {
            warn!(routine = %routine, error = %err, "Failed to queue wash");
            None
        }
    }
}

async fn delete(ctx: &RoutineContext, routine: RoutineKind, wash: WashId) {
    let CallOutcome { record, result } = ctx.api.delete_wash(wash).await;
    ctx.records.submit(record).await;
    if let Err(err) = result {
        warn!(routine = %routine, wash_id = %wash, error = %err, "Failed to delete queued wash");
    }
}

/// Draws a uniformly random move target in `[0, len)`, or `[1, len)` when
/// the head is excluded. `None` when the range is empty.
#[must_use]
pub fn pick_target<R: Rng + ?Sized>(rng: &mut R, len: usize, include_head: bool) -> Option<i64> {
    let lower = usize::from(!include_head);
    if len <= lower {
        return None;
    }
    i64::try_from(rng.gen_range(lower..len)).ok()
}
