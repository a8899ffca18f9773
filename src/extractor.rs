//! Mapping of data elements to the group they belong to.
//!
//! Pick a key that captures the causal unit of your data: all events for one
//! customer, one order, one account. Every element with an equal key is
//! delivered to the same worker, in dataset order.
//!
//! The extractor must be pure. Returning different keys for the same element
//! across calls breaks the affinity guarantee.

/// Derives a group key from one element.
///
/// Any `Fn(&T) -> K` closure is an extractor:
///
/// ```
/// use grouplane::GroupKeyExtractor;
///
/// let by_parity = |n: &u32| n % 2;
/// assert_eq!(by_parity.extract_group_key(&7), 1);
/// ```
pub trait GroupKeyExtractor<T, K> {
    /// Return the group key of `element`.
    fn extract_group_key(&self, element: &T) -> K;
}

impl<T, K, F> GroupKeyExtractor<T, K> for F
where
    F: Fn(&T) -> K,
{
    fn extract_group_key(&self, element: &T) -> K {
        self(element)
    }
}
