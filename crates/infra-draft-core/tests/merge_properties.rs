//! Property tests for the merge algebra
//!
//! `combine` must be associative with `create` as identity, and grouping
//! operations (nesting, or building sub-drafts and combining them) must
//! never change the result.

mod common;

use common::{job, retries, tags, Job, JobList, JobScalar};
use infra_draft_core::{Draft, Operation};
use proptest::prelude::*;

fn op_strategy() -> impl Strategy<Value = Operation<Job>> {
    prop_oneof![
        (0u32..10).prop_map(retries),
        "[a-z]{1,3}".prop_map(|q| Operation::set(JobScalar::Queue(q))),
        prop::collection::vec("[a-z]{1,3}", 0..3)
            .prop_map(|t| Operation::append(JobList::Tags(t))),
        prop::collection::vec("[a-z]{1,3}", 0..3)
            .prop_map(|s| Operation::set(JobScalar::Schedules(s))),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Operation<Job>>> {
    prop::collection::vec(op_strategy(), 0..6)
}

fn draft_strategy() -> impl Strategy<Value = Draft<Job>> {
    ops_strategy().prop_map(|ops| job("job1").apply_all(ops))
}

proptest! {
    #[test]
    fn combine_is_associative(a in draft_strategy(), b in draft_strategy(), c in draft_strategy()) {
        prop_assert_eq!(a.combine(&b).combine(&c), a.combine(&b.combine(&c)));
    }

    #[test]
    fn create_is_left_identity(b in draft_strategy()) {
        prop_assert_eq!(job("job1").combine(&b), b);
    }

    #[test]
    fn create_is_right_identity(a in draft_strategy()) {
        prop_assert_eq!(a.combine(&job("job1")), a);
    }

    #[test]
    fn nesting_does_not_change_result(ops in ops_strategy()) {
        let flat = job("job1").apply_all(ops.clone());
        let nested = job("job1").apply(Operation::nested(ops));
        prop_assert_eq!(flat, nested);
    }

    #[test]
    fn split_and_combine_matches_sequential_apply(first in ops_strategy(), second in ops_strategy()) {
        let sequential = job("job1").apply_all(first.clone()).apply_all(second.clone());
        let combined = job("job1").apply_all(first).combine(&job("job1").apply_all(second));
        prop_assert_eq!(sequential, combined);
    }

    #[test]
    fn list_length_is_sum_of_contributions(batches in prop::collection::vec(prop::collection::vec("[a-z]", 0..4), 0..5)) {
        let expected: usize = batches.iter().map(Vec::len).sum();
        let draft = batches
            .into_iter()
            .fold(job("job1"), |draft, batch| draft.append(JobList::Tags(batch)));
        prop_assert_eq!(draft.fields().tags.len(), expected);
    }

    #[test]
    fn finalize_is_deterministic(a in draft_strategy()) {
        let first = a.clone().finalize(|_, config| config.clone());
        let second = a.finalize(|_, config| config.clone());
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_tags_helper_appends() {
    let draft = job("job1").apply(tags(&["a"])).apply(tags(&["a"]));
    assert_eq!(draft.fields().tags.items(), &["a", "a"]);
}
