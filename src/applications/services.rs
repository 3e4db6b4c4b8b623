//! Lane ordering rules shared by every [`ApplicationStore`](super::repo::ApplicationStore)
//! implementation. Nothing here touches storage.

use super::repo_types::ApplicationStatus;
use crate::db::StoreError;

/// Highest slot a card can be created at or dropped on.
pub const MAX_ORDER_INDEX: i32 = 100_000;

/// Shift applied to the other cards of one lane when a card is dropped.
///
/// Affects every application of the owner in `status` whose `order_index`
/// lies in `lower..=upper` (unbounded above when `upper` is `None`),
/// excluding the moved card itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingShift {
    pub status: ApplicationStatus,
    pub lower: i32,
    pub upper: Option<i32>,
    pub delta: i32,
}

impl SiblingShift {
    pub fn covers(&self, order_index: i32) -> bool {
        order_index >= self.lower && self.upper.map_or(true, |upper| order_index <= upper)
    }

    /// New slot of a covered sibling.
    pub fn shifted(&self, order_index: i32) -> Result<i32, StoreError> {
        order_index
            .checked_add(self.delta)
            .ok_or(StoreError::OrderOverflow)
    }
}

/// Which siblings move to make room for a card going from
/// (`from`, `from_index`) to (`to`, `to_index`).
///
/// Entering another lane pushes everything at or after the drop slot down by
/// one; the lane that was left keeps its gap. Within one lane the cards between
/// the old and new slot close up behind the moved card.
pub fn plan_move(
    from: ApplicationStatus,
    from_index: i32,
    to: ApplicationStatus,
    to_index: i32,
) -> Option<SiblingShift> {
    if from != to {
        return Some(SiblingShift {
            status: to,
            lower: to_index,
            upper: None,
            delta: 1,
        });
    }

    match to_index.cmp(&from_index) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Less => Some(SiblingShift {
            status: to,
            lower: to_index,
            upper: Some(from_index - 1),
            delta: 1,
        }),
        std::cmp::Ordering::Greater => Some(SiblingShift {
            status: to,
            lower: from_index + 1,
            upper: Some(to_index),
            delta: -1,
        }),
    }
}

/// Stage labels that survive a move into `status`: only the one matching
/// the lane is kept.
pub fn reconcile_stages(
    status: ApplicationStatus,
    interview_stage: Option<String>,
    rejection_stage: Option<String>,
) -> (Option<String>, Option<String>) {
    match status {
        ApplicationStatus::Interviewing => (interview_stage, None),
        ApplicationStatus::Rejected => (None, rejection_stage),
        ApplicationStatus::Applied | ApplicationStatus::Offer => (None, None),
    }
}

/// Slot for a newly created card: after the last one, or 0 in an empty lane.
pub fn next_order_index(current_max: Option<i32>) -> Result<i32, StoreError> {
    match current_max {
        None => Ok(0),
        Some(max) if max >= MAX_ORDER_INDEX => Err(StoreError::OrderOverflow),
        Some(max) => Ok(max + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    fn apply(plan: Option<SiblingShift>, lane: &[i32]) -> Vec<i32> {
        lane.iter()
            .map(|&i| match plan {
                Some(p) if p.covers(i) => i + p.delta,
                _ => i,
            })
            .collect()
    }

    #[test]
    fn lane_change_pushes_target_lane_from_drop_slot() {
        let plan = plan_move(Applied, 4, Interviewing, 0);
        assert_eq!(
            plan,
            Some(SiblingShift {
                status: Interviewing,
                lower: 0,
                upper: None,
                delta: 1
            })
        );
        assert_eq!(apply(plan, &[0, 1, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn lane_change_past_the_end_shifts_nothing_existing() {
        let plan = plan_move(Applied, 0, Offer, 7);
        assert_eq!(apply(plan, &[0, 1, 2]), vec![0, 1, 2]);
    }

    #[test]
    fn moving_up_in_lane_pushes_displaced_cards_down() {
        // Card at 3 dropped at 1: cards 1 and 2 make room.
        let plan = plan_move(Applied, 3, Applied, 1);
        assert_eq!(apply(plan, &[0, 1, 2, 4]), vec![0, 2, 3, 4]);
    }

    #[test]
    fn moving_down_in_lane_closes_the_gap() {
        // Card at 0 dropped at 2: cards 1 and 2 slide up.
        let plan = plan_move(Offer, 0, Offer, 2);
        assert_eq!(apply(plan, &[1, 2, 3]), vec![0, 1, 3]);
    }

    #[test]
    fn dropping_in_place_is_a_no_op() {
        assert_eq!(plan_move(Rejected, 2, Rejected, 2), None);
    }

    #[test]
    fn stages_follow_the_lane() {
        let i = Some("Phone screen".to_string());
        let r = Some("After onsite".to_string());

        assert_eq!(
            reconcile_stages(Interviewing, i.clone(), r.clone()),
            (i.clone(), None)
        );
        assert_eq!(
            reconcile_stages(Rejected, i.clone(), r.clone()),
            (None, r.clone())
        );
        assert_eq!(reconcile_stages(Offer, i.clone(), r.clone()), (None, None));
        assert_eq!(reconcile_stages(Applied, i, r), (None, None));
    }

    #[test]
    fn new_cards_go_to_the_end_of_the_lane() {
        assert_eq!(next_order_index(None).unwrap(), 0);
        assert_eq!(next_order_index(Some(0)).unwrap(), 1);
        assert_eq!(next_order_index(Some(9)).unwrap(), 10);
    }

    #[test]
    fn full_lane_refuses_another_card_instead_of_overflowing() {
        assert_eq!(
            next_order_index(Some(MAX_ORDER_INDEX - 1)).unwrap(),
            MAX_ORDER_INDEX
        );
        assert!(matches!(
            next_order_index(Some(MAX_ORDER_INDEX)),
            Err(StoreError::OrderOverflow)
        ));
        assert!(matches!(
            next_order_index(Some(i32::MAX)),
            Err(StoreError::OrderOverflow)
        ));
    }

    #[test]
    fn shifting_past_i32_max_is_an_error() {
        let plan = plan_move(Applied, 0, Offer, 0).unwrap();
        assert_eq!(plan.shifted(5).unwrap(), 6);
        assert!(matches!(
            plan.shifted(i32::MAX),
            Err(StoreError::OrderOverflow)
        ));
    }
}
