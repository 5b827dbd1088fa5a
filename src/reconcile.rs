//! Label Reconciliation
//!
//! Pure set-diff policy deciding which labels to add, remove, or keep

use std::collections::BTreeSet;

/// Outcome of reconciling a pull request's labels against the computed set
///
/// `final_labels` is always derived from `current` plus `to_add` (minus
/// `to_remove` when deletion is enabled), never rebuilt from the computed set
/// alone. Labels the rule set does not know about therefore survive
/// reconciliation untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Labels the files require but the PR does not yet carry
    pub to_add: BTreeSet<String>,

    /// Known labels the PR carries but the files no longer justify
    pub to_remove: BTreeSet<String>,

    /// Known labels that are already correct
    pub to_keep: BTreeSet<String>,

    /// The label set to write back to the PR
    pub final_labels: BTreeSet<String>,
}

/// Reconcile the labels currently on a PR with the labels its files compute
///
/// `known` is the set of labels the rule set is authoritative over; labels
/// outside it are never removed, regardless of `delete_old`. Total over any
/// finite inputs, no I/O, no failure modes.
pub fn reconcile(
    current: &BTreeSet<String>,
    computed: &BTreeSet<String>,
    known: &BTreeSet<String>,
    delete_old: bool,
) -> Reconciliation {
    let to_add: BTreeSet<String> = computed.difference(current).cloned().collect();

    let owned: BTreeSet<String> = current.intersection(known).cloned().collect();
    let to_remove: BTreeSet<String> = owned.difference(computed).cloned().collect();
    let to_keep: BTreeSet<String> = owned
        .iter()
        .filter(|label| !to_add.contains(*label) && !to_remove.contains(*label))
        .cloned()
        .collect();

    let mut final_labels: BTreeSet<String> = current.union(&to_add).cloned().collect();
    if delete_old {
        final_labels = final_labels.difference(&to_remove).cloned().collect();
    }

    Reconciliation {
        to_add,
        to_remove,
        to_keep,
        final_labels,
    }
}
