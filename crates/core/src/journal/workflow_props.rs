//! Property-based tests for the entry workflow.
//!
//! - Nothing re-enters DRAFT
//! - Terminal statuses accept no transition
//! - Every accepted transition starts from the action's `from_status`

use comptable_shared::types::UserId;
use proptest::prelude::*;

use super::types::EntryStatus;
use super::workflow::{EntryAction, EntryWorkflow};

fn status_strategy() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Draft),
        Just(EntryStatus::Validated),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Rejected),
        Just(EntryStatus::Cancelled),
    ]
}

fn all_transitions(current: EntryStatus) -> Vec<Option<EntryAction>> {
    let actor = UserId::new();
    vec![
        EntryWorkflow::validate(current, actor).ok(),
        EntryWorkflow::reject(current, "reason", actor).ok(),
        EntryWorkflow::post(current, actor).ok(),
        EntryWorkflow::cancel(current, "reason", actor).ok(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_never_back_to_draft(current in status_strategy()) {
        for action in all_transitions(current).into_iter().flatten() {
            prop_assert_ne!(action.new_status(), EntryStatus::Draft);
            prop_assert_ne!(action.new_status(), current);
        }
    }

    #[test]
    fn prop_terminal_is_final(current in status_strategy()) {
        let accepted = all_transitions(current).into_iter().flatten().count();
        if current.is_terminal() {
            prop_assert_eq!(accepted, 0);
        } else {
            prop_assert_eq!(accepted, 2);
        }
    }

    #[test]
    fn prop_action_matches_current(current in status_strategy()) {
        for action in all_transitions(current).into_iter().flatten() {
            prop_assert_eq!(action.from_status(), current);
        }
    }
}
