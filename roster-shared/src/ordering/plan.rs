/// Reorder planning
///
/// Turns a batch of [`PositionUpdate`]s into the ordered list of writes that
/// applies it. Planning is pure: it reads a snapshot of the scope and returns
/// steps, so the reindexer can validate everything before the first write.
///
/// # Algorithm
///
/// Updates are processed ascending by target position. For each one the
/// record's *current* position is read from a live map that already reflects
/// every earlier step of the batch (never from the caller's view of the old
/// position):
///
/// ```text
/// cur < new   ->  siblings in (cur, new] shift by -1
/// cur > new   ->  siblings in [new, cur) shift by +1
/// cur == new  ->  nothing
/// ```
///
/// Reading `cur` from the live map is what keeps two records moving past
/// each other in one batch from being shifted twice.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::error::{OrderingError, OrderingResult};
use super::scope::{Placement, PositionUpdate};

/// One write produced by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep {
    /// Add `delta` to every position in `from..=to`
    Shift { from: i32, to: i32, delta: i32 },

    /// Move one record to `position`
    Place { id: Uuid, position: i32 },
}

/// Planned reorder of one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderPlan {
    /// Writes, in the order they must be applied
    pub steps: Vec<PlanStep>,

    /// Requested IDs that are not part of the scope
    pub skipped: Vec<Uuid>,

    /// Number of records placed at a new position
    pub moved: usize,

    /// Scope after the plan is applied, ascending by position
    pub result: Vec<Placement>,
}

impl ReorderPlan {
    /// Whether applying the plan writes nothing
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Rejects batches that name a record or a target position twice
///
/// This needs no knowledge of the scope, so request handlers can run it
/// before opening a transaction.
pub fn check_batch(updates: &[PositionUpdate]) -> OrderingResult<()> {
    let mut ids = HashSet::with_capacity(updates.len());
    let mut targets = HashSet::with_capacity(updates.len());

    for update in updates {
        if !ids.insert(update.id) {
            return Err(OrderingError::DuplicateId(update.id));
        }
        if !targets.insert(update.new_position) {
            return Err(OrderingError::DuplicateTarget(update.new_position));
        }
    }

    Ok(())
}

/// Plans a batch of moves against the current layout of a scope
///
/// `current` must hold every record of the scope. Targets are checked against
/// `1..=current.len()` before anything is planned; IDs that are not in
/// `current` are skipped and reported in [`ReorderPlan::skipped`].
///
/// # Errors
///
/// - `InvalidPosition` if a target is outside `1..=N`
/// - `DuplicateId` / `DuplicateTarget` if the batch is ambiguous
pub fn plan_reorder(
    current: &[Placement],
    updates: &[PositionUpdate],
) -> OrderingResult<ReorderPlan> {
    check_batch(updates)?;

    let len = current.len();
    if let Some(bad) = updates
        .iter()
        .find(|u| u.new_position < 1 || u.new_position as usize > len)
    {
        return Err(OrderingError::InvalidPosition {
            position: bad.new_position,
            len,
        });
    }

    let mut live: HashMap<Uuid, i32> = current.iter().map(|p| (p.id, p.position)).collect();

    // Stable sort: with duplicate targets rejected, input order never decides
    let mut sorted = updates.to_vec();
    sorted.sort_by_key(|u| u.new_position);

    let mut plan = ReorderPlan::default();

    for update in sorted {
        let Some(&cur) = live.get(&update.id) else {
            plan.skipped.push(update.id);
            continue;
        };
        let target = update.new_position;

        let (from, to, delta) = if cur < target {
            (cur + 1, target, -1)
        } else if cur > target {
            (target, cur - 1, 1)
        } else {
            continue;
        };

        for (id, position) in live.iter_mut() {
            if *id != update.id && (from..=to).contains(position) {
                *position += delta;
            }
        }
        live.insert(update.id, target);

        plan.steps.push(PlanStep::Shift { from, to, delta });
        plan.steps.push(PlanStep::Place {
            id: update.id,
            position: target,
        });
        plan.moved += 1;
    }

    let mut result: Vec<Placement> = live
        .into_iter()
        .map(|(id, position)| Placement::new(id, position))
        .collect();
    result.sort_by_key(|p| p.position);
    plan.result = result;

    Ok(plan)
}
