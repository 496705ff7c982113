//! FIFO queue ordering for entries.
//!
//! Unread entries come first, oldest `added` first; read entries follow,
//! oldest `read` first. The id breaks every remaining tie, so distinct
//! entries never compare equal.

use crate::model::entry::Entry;
use std::cmp::Ordering;

/// Compares two entries in FIFO order.
pub fn fifo_cmp(a: &Entry, b: &Entry) -> Ordering {
    match (a.read, b.read) {
        (None, None) => a.added.cmp(&b.added).then_with(|| a.id.cmp(&b.id)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.id.cmp(&b.id)),
    }
}

/// Sorts entries in place, oldest unread first.
pub fn fifo_sort<E: AsRef<Entry>>(entries: &mut [E]) {
    entries.sort_by(|a, b| fifo_cmp(a.as_ref(), b.as_ref()));
}

impl AsRef<Entry> for Entry {
    fn as_ref(&self) -> &Entry {
        self
    }
}
