pub(crate) mod catalog;

/// Stubs for rustdoc link targets.
#[cfg(doc)]
pub(crate) mod stubs {
	pub fn test_single_mutation_in_flight() {}
	pub fn test_committed_order_matches_kernel() {}
	pub fn test_advance_waits_for_cancel() {}
	pub fn test_registry_mirrors_committed() {}
	pub fn test_failure_abandons_queue() {}
	pub fn test_comments_never_submitted() {}
	pub fn test_feedback_for_unknown_state_dropped() {}
	pub fn test_goals_shown_only_when_idle() {}
}

#[cfg(doc)]
pub(crate) use stubs::*;

#[cfg(test)]
mod proofs;

#[cfg(test)]
#[allow(unused_imports)]
pub(crate) use proofs::*;
