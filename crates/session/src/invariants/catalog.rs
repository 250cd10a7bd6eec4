//! Catalog of session invariants.

#![allow(dead_code)]

/// - Single Mutation In Flight: at most one `Add` or `Cancel` is outstanding; statements enqueued
///   meanwhile wait in `pending` and are issued as acknowledgements arrive. A failure needing a
///   `Cancel` while another mutation is outstanding holds it back until that one is acknowledged.
///   - Enforced in: [`crate::Ledger::in_flight`], `Ledger::enqueue`, `Ledger::fail`, `Session::retreat`,
///     `Session::sync_to_cursor`, `Session::reset`
///   - Tested by: [`crate::invariants::test_single_mutation_in_flight`]
///   - Failure symptom: kernel rejects an `Add` whose parent was cancelled, ids attach to the wrong statements.
pub(crate) const SINGLE_MUTATION_IN_FLIGHT: () = ();

/// - Committed Order Matches Kernel: `committed` lists statements in the order the kernel assigned
///   their ids, and every `Add` names the previous committed id (or the root) as parent.
///   - Enforced in: `Ledger::acknowledge_add`, [`crate::Ledger::tail_id`]
///   - Tested by: [`crate::invariants::test_committed_order_matches_kernel`]
///   - Failure symptom: statements processed against the wrong kernel state.
pub(crate) const COMMITTED_ORDER_MATCHES_KERNEL: () = ();

/// - Advance Waits For Cancel: no statement is chosen while a `Cancel` is outstanding or held back,
///   since the ledger tail still names states the kernel is about to drop.
///   - Enforced in: [`crate::Ledger::is_cancelling`], `Session::advance`
///   - Tested by: [`crate::invariants::test_advance_waits_for_cancel`]
///   - Failure symptom: the statement after a retracted one is submitted and the retracted one is skipped.
pub(crate) const ADVANCE_WAITS_FOR_CANCEL: () = ();

/// - Registry Mirrors Committed: an id resolves to a statement exactly while that statement is
///   committed; retraction removes both together.
///   - Enforced in: `Ledger::acknowledge_add`, `Ledger::retract`, `Ledger::reset`
///   - Tested by: [`crate::invariants::test_registry_mirrors_committed`]
///   - Failure symptom: goals or `Processed` feedback applied to retracted statements.
pub(crate) const REGISTRY_MIRRORS_COMMITTED: () = ();

/// - Failure Abandons Queue: a kernel error clears `pending`, clears the discarded statements' marks,
///   ends any seek, and leaves exactly one statement marked as error.
///   - Enforced in: `Ledger::fail`, `Session::on_failure`
///   - Tested by: [`crate::invariants::test_failure_abandons_queue`]
///   - Failure symptom: statements after a failing one keep being submitted.
pub(crate) const FAILURE_ABANDONS_QUEUE: () = ();

/// - Comments Never Submitted: comments and recognized directives are accepted locally and never
///   appear in an `Add`.
///   - Enforced in: [`crate::Session::advance`]
///   - Tested by: [`crate::invariants::test_comments_never_submitted`]
///   - Failure symptom: kernel parse errors on comment-only input, extra undo states.
pub(crate) const COMMENTS_NEVER_SUBMITTED: () = ();

/// - Feedback For Unknown State Dropped: `Processed`, `GoalInfo` and `Cancelled` naming ids the
///   ledger does not hold change nothing.
///   - Enforced in: `Session::on_processed`, `Ledger::record_goals`, `Ledger::retract`
///   - Tested by: [`crate::invariants::test_feedback_for_unknown_state_dropped`]
///   - Failure symptom: marks or goals appear on text the kernel no longer knows.
pub(crate) const FEEDBACK_FOR_UNKNOWN_STATE_DROPPED: () = ();

/// - Goals Shown Only When Idle: goal display is updated from `GoalInfo` only while nothing is
///   pending; retraction shows the new tail's cached goals.
///   - Enforced in: `Ledger::record_goals`, `Ledger::retract`
///   - Tested by: [`crate::invariants::test_goals_shown_only_when_idle`]
///   - Failure symptom: goal panel flickers through intermediate states during batch submission.
pub(crate) const GOALS_SHOWN_ONLY_WHEN_IDLE: () = ();
