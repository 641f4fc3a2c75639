//! Priority ordering engine.
//!
//! # Responsibility
//! - Compute insertion and rearrangement priorities over one parent's
//!   children, given their priorities in display order.
//! - Stay pure: no store access, no side effects beyond diagnostics.
//!
//! # Invariants
//! - `N` children are surrounded by `N + 1` edge positions; edge `0` is
//!   above the first child and edge `N` below the last.
//! - Inserted priorities are the midpoint of the target edge's bounds.
//! - Rearranged items keep their relative order, for upward and downward
//!   moves alike.
//!
//! Repeated insertion at the same edge halves the gap each time, so the
//! gap eventually collapses below `f64` resolution. `has_room` detects
//! that and `respaced_priorities` supplies a fresh, evenly spaced layout.

use log::warn;

/// Distance used beyond the head/tail and for an empty parent.
pub const DEFAULT_PRIORITY_SPACING: f64 = 100.0;

/// Open priority interval around one edge position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBounds {
    /// Priority of the child above the edge (or the head + spacing).
    pub above: f64,
    /// Priority of the child below the edge (or the tail - spacing).
    pub below: f64,
}

impl EdgeBounds {
    pub fn midpoint(&self) -> f64 {
        self.below + (self.above - self.below) / 2.0
    }

    /// Whether `value` lies strictly inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        value < self.above && value > self.below
    }

    /// Whether the midpoint is still distinguishable from both bounds.
    pub fn has_room(&self) -> bool {
        self.contains(self.midpoint())
    }
}

/// New priority for the child at `index` in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityAssignment {
    pub index: usize,
    pub priority: f64,
}

/// Bounds of `edge` over `priorities` (display order, descending).
///
/// Returns `None` when `edge > priorities.len()`.
pub fn edge_bounds(priorities: &[f64], edge: usize, spacing: f64) -> Option<EdgeBounds> {
    if edge > priorities.len() {
        return None;
    }
    Some(clamped_edge_bounds(priorities, edge, spacing))
}

/// Bounds of `edge`, treating any edge past the tail as the tail edge.
pub fn clamped_edge_bounds(priorities: &[f64], edge: usize, spacing: f64) -> EdgeBounds {
    let count = priorities.len();
    let edge = edge.min(count);
    let (Some(&head), Some(&tail)) = (priorities.first(), priorities.last()) else {
        return EdgeBounds {
            above: spacing,
            below: -spacing,
        };
    };
    let above = if edge == 0 {
        head + spacing
    } else {
        priorities[edge - 1]
    };
    let below = if edge == count {
        tail - spacing
    } else {
        priorities[edge]
    };
    EdgeBounds { above, below }
}

/// Priority for a new child inserted at `edge`.
///
/// Out-of-range edges are logged and yield `None`.
pub fn insert_priority(priorities: &[f64], edge: usize, spacing: f64) -> Option<f64> {
    match edge_bounds(priorities, edge, spacing) {
        Some(bounds) => Some(bounds.midpoint()),
        None => {
            warn!(
                "event=insert_priority module=ordering status=skipped reason=edge_out_of_range edge={edge} count={}",
                priorities.len()
            );
            None
        }
    }
}

/// Priorities that move the children at `sources` to `target_edge`.
///
/// Returns an empty plan when nothing should move:
/// - empty selection or any out-of-range index or edge (logged);
/// - `target_edge` inside `min(sources) ..= max(sources) + 1` (silent, a
///   drop onto the selection itself).
///
/// The `count` moved items receive the interior points of the target
/// interval split into `count + 1` equal steps. Items are assigned in
/// their original display order from the top of the interval down, which
/// keeps the selection's relative order whichever direction it travels.
pub fn rearrange_priorities(
    priorities: &[f64],
    sources: &[usize],
    target_edge: usize,
    spacing: f64,
) -> Vec<PriorityAssignment> {
    let count = priorities.len();
    let mut selection = sources.to_vec();
    selection.sort_unstable();
    selection.dedup();

    let (Some(&first), Some(&last)) = (selection.first(), selection.last()) else {
        warn!("event=rearrange_priorities module=ordering status=skipped reason=empty_selection");
        return Vec::new();
    };
    if last >= count {
        warn!(
            "event=rearrange_priorities module=ordering status=skipped reason=source_out_of_range index={last} count={count}"
        );
        return Vec::new();
    }
    if target_edge >= first && target_edge <= last + 1 {
        return Vec::new();
    }
    let Some(bounds) = edge_bounds(priorities, target_edge, spacing) else {
        warn!(
            "event=rearrange_priorities module=ordering status=skipped reason=edge_out_of_range edge={target_edge} count={count}"
        );
        return Vec::new();
    };

    let step = (bounds.above - bounds.below) / (selection.len() + 1) as f64;
    selection
        .into_iter()
        .enumerate()
        .map(|(position, index)| PriorityAssignment {
            index,
            priority: bounds.above - step * (position + 1) as f64,
        })
        .collect()
}

/// Whether a rearrangement plan still yields a strictly descending order
/// inside `bounds`.
pub fn plan_fits(plan: &[PriorityAssignment], bounds: EdgeBounds) -> bool {
    let mut previous = bounds.above;
    for assignment in plan {
        if assignment.priority >= previous {
            return false;
        }
        previous = assignment.priority;
    }
    previous > bounds.below
}

/// Evenly spaced priorities for `count` children: `count * spacing` down to
/// `spacing`, in display order.
pub fn respaced_priorities(count: usize, spacing: f64) -> Vec<f64> {
    (0..count)
        .map(|position| (count - position) as f64 * spacing)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        clamped_edge_bounds, edge_bounds, insert_priority, plan_fits, rearrange_priorities,
        respaced_priorities, EdgeBounds, PriorityAssignment, DEFAULT_PRIORITY_SPACING,
    };

    const K: f64 = DEFAULT_PRIORITY_SPACING;
    const FIVE: [f64; 5] = [50.0, 40.0, 30.0, 20.0, 10.0];

    #[test]
    fn empty_list_bounds_are_plus_minus_spacing() {
        assert_eq!(
            edge_bounds(&[], 0, K),
            Some(EdgeBounds {
                above: K,
                below: -K
            })
        );
        assert_eq!(insert_priority(&[], 0, K), Some(0.0));
    }

    #[test]
    fn end_edges_extend_by_spacing() {
        let head = edge_bounds(&FIVE, 0, K).unwrap();
        assert_eq!(head.above, 150.0);
        assert_eq!(head.below, 50.0);

        let tail = edge_bounds(&FIVE, 5, K).unwrap();
        assert_eq!(tail.above, 10.0);
        assert_eq!(tail.below, -90.0);

        assert_eq!(edge_bounds(&FIVE, 6, K), None);
    }

    #[test]
    fn clamped_bounds_treat_far_edges_as_tail() {
        assert_eq!(
            clamped_edge_bounds(&FIVE, 9, K),
            edge_bounds(&FIVE, 5, K).unwrap()
        );
        assert_eq!(
            clamped_edge_bounds(&[], 3, K),
            EdgeBounds {
                above: K,
                below: -K
            }
        );
    }

    #[test]
    fn insertion_at_head_and_tail_escapes_current_extremes() {
        assert!(insert_priority(&FIVE, 0, K).unwrap() > 50.0);
        assert!(insert_priority(&FIVE, 5, K).unwrap() < 10.0);
    }

    #[test]
    fn insertion_lies_strictly_between_neighbors() {
        for edge in 1..FIVE.len() {
            let value = insert_priority(&FIVE, edge, K).unwrap();
            assert!(value < FIVE[edge - 1] && value > FIVE[edge], "edge {edge}");
        }
    }

    #[test]
    fn repeated_insertion_at_same_edge_halves_the_gap() {
        let mut above = 50.0;
        let below = 40.0;
        let mut gap = above - below;
        for _ in 0..30 {
            let value = insert_priority(&[above, below], 1, K).unwrap();
            assert!(value < above && value > below);
            let new_gap = value - below;
            assert_eq!(new_gap, gap / 2.0);
            gap = new_gap;
            above = value;
        }
    }

    #[test]
    fn repeated_insertion_eventually_exhausts_precision() {
        let mut bounds = EdgeBounds {
            above: 50.0,
            below: 40.0,
        };
        let mut insertions = 0;
        while bounds.has_room() {
            bounds.above = bounds.midpoint();
            insertions += 1;
            assert!(insertions < 200, "gap never collapsed");
        }
        assert!(insertions > 40);
    }

    #[test]
    fn drop_inside_own_span_is_noop() {
        assert!(rearrange_priorities(&FIVE, &[1, 2], 1, K).is_empty());
        assert!(rearrange_priorities(&FIVE, &[1, 2], 2, K).is_empty());
        assert!(rearrange_priorities(&FIVE, &[1, 2], 3, K).is_empty());
        assert!(rearrange_priorities(&FIVE, &[1, 3], 2, K).is_empty());
    }

    #[test]
    fn out_of_range_selection_is_noop() {
        assert!(rearrange_priorities(&FIVE, &[1, 5], 0, K).is_empty());
        assert!(rearrange_priorities(&FIVE, &[], 0, K).is_empty());
        assert!(rearrange_priorities(&FIVE, &[1], 9, K).is_empty());
    }

    #[test]
    fn single_item_moved_to_head_exceeds_old_head() {
        let plan = rearrange_priorities(&FIVE, &[1], 0, K);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].index, 1);
        assert!(plan[0].priority > 50.0);
    }

    #[test]
    fn upward_multi_move_keeps_selection_order() {
        let plan = rearrange_priorities(&FIVE, &[4, 2], 1, K);
        assert_eq!(
            plan,
            vec![
                PriorityAssignment {
                    index: 2,
                    priority: 50.0 - 10.0 / 3.0
                },
                PriorityAssignment {
                    index: 4,
                    priority: 50.0 - 20.0 / 3.0
                },
            ]
        );
    }

    #[test]
    fn downward_multi_move_keeps_selection_order() {
        let plan = rearrange_priorities(&FIVE, &[0, 2], 5, K);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].index, 0);
        assert_eq!(plan[1].index, 2);
        assert!(plan[0].priority < 10.0);
        assert!(plan[0].priority > plan[1].priority);
        assert!(plan[1].priority > -90.0);
    }

    #[test]
    fn plan_fits_detects_collapsed_interval() {
        let bounds = EdgeBounds {
            above: 1.0,
            below: 1.0 - f64::EPSILON,
        };
        let plan = [
            PriorityAssignment {
                index: 0,
                priority: 1.0 - f64::EPSILON / 2.0,
            },
            PriorityAssignment {
                index: 1,
                priority: 1.0 - f64::EPSILON / 2.0,
            },
        ];
        assert!(!plan_fits(&plan, bounds));
    }

    #[test]
    fn respaced_priorities_descend_by_spacing() {
        assert_eq!(respaced_priorities(3, K), vec![300.0, 200.0, 100.0]);
        assert!(respaced_priorities(0, K).is_empty());
    }
}
