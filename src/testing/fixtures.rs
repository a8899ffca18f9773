//! Pre-built datasets with a known group structure.

use serde::{Deserialize, Serialize};

/// The integers `0..21`, grouped by [`three_group_key`] into three groups of
/// different sizes: `GROUP-1` has 8 elements, `GROUP-2` has 7 and `GROUP-3`
/// has 6.
///
/// # Example
///
/// ```
/// use grouplane::testing::{three_group_dataset, three_group_key};
///
/// let data = three_group_dataset();
/// assert_eq!(data.len(), 21);
/// assert_eq!(data.iter().filter(|e| three_group_key(e) == "GROUP-1").count(), 8);
/// ```
#[must_use]
pub fn three_group_dataset() -> Vec<u32> {
    (0..21).collect()
}

/// Group key for [`three_group_dataset`].
///
/// The first 18 elements cycle through the three groups; the tail is skewed
/// towards `GROUP-1` and `GROUP-2`.
#[must_use]
pub fn three_group_key(element: &u32) -> String {
    let group = match *element {
        18 | 19 => 1,
        20 => 2,
        e => e % 3 + 1,
    };
    format!("GROUP-{group}")
}

/// An event tied to one customer, in arrival order per customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerEvent {
    pub customer: String,
    pub seq: u32,
    pub amount_cents: u64,
}

/// A small interleaved event stream for four customers.
///
/// `alice` has 4 events, `bob` 3, `carol` 2 and `dave` 1. Each customer's
/// `seq` counts up from 0 in stream order.
///
/// # Example
///
/// ```
/// use grouplane::testing::customer_events;
///
/// let events = customer_events();
/// assert_eq!(events.len(), 10);
/// assert_eq!(events[0].customer, "alice");
/// ```
#[must_use]
pub fn customer_events() -> Vec<CustomerEvent> {
    let order = [
        "alice", "bob", "alice", "carol", "bob", "alice", "dave", "carol", "bob", "alice",
    ];
    let mut next_seq = std::collections::HashMap::new();
    order
        .iter()
        .enumerate()
        .map(|(i, customer)| {
            let seq = next_seq.entry(*customer).or_insert(0u32);
            let event = CustomerEvent {
                customer: (*customer).to_string(),
                seq: *seq,
                amount_cents: 100 * (i as u64 + 1),
            };
            *seq += 1;
            event
        })
        .collect()
}
