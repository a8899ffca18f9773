//! Fetch elements by position from a dataset without random access.
//!
//! [`elements_at`] makes a single forward pass over the source, so the cost
//! is `O(len + k log k)` for `k` requested positions instead of one walk per
//! position.

use crate::error::{Error, Result};
use crate::source::SequentialSource;
use std::collections::BTreeSet;

/// Return clones of the elements at `positions`, in ascending position order.
///
/// Duplicate positions are collapsed. All positions are validated before
/// the scan starts, so a failure never yields a partial result.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] carrying the smallest offending
/// position if any position is `>= source.len()`.
///
/// # Example
///
/// ```
/// use grouplane::elements_at;
/// use std::collections::LinkedList;
///
/// let list: LinkedList<&str> = ["a", "b", "c", "d"].into_iter().collect();
/// let picked = elements_at(&list, [3, 1, 3])?;
/// assert_eq!(picked, vec!["b", "d"]);
/// # Ok::<(), grouplane::Error>(())
/// ```
pub fn elements_at<S>(source: &S, positions: impl IntoIterator<Item = usize>) -> Result<Vec<S::Item>>
where
    S: SequentialSource + ?Sized,
    S::Item: Clone,
{
    let wanted: Vec<usize> = positions
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let len = source.len();
    if let Some(&index) = wanted.iter().find(|&&p| p >= len) {
        return Err(Error::IndexOutOfRange { index, len });
    }
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let out = source.scan(|items| {
        let mut out = Vec::with_capacity(wanted.len());
        let mut next = wanted.iter().copied().peekable();
        for (index, item) in items.enumerate() {
            match next.peek() {
                Some(&want) if want == index => {
                    out.push(item.clone());
                    next.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        out
    });

    // A source that shrank between the size check and the scan.
    if out.len() < wanted.len() {
        return Err(Error::IndexOutOfRange {
            index: wanted[out.len()],
            len: source.len(),
        });
    }
    Ok(out)
}

/// Fetch distinct `positions` in one pass and return them in the given order.
pub(crate) fn elements_in_order<S>(source: &S, positions: &[usize]) -> Result<Vec<S::Item>>
where
    S: SequentialSource + ?Sized,
    S::Item: Clone,
{
    let fetched = elements_at(source, positions.iter().copied())?;
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let mut slots: Vec<Option<S::Item>> = fetched.into_iter().map(Some).collect();
    Ok(positions
        .iter()
        .filter_map(|p| {
            sorted
                .binary_search(p)
                .ok()
                .and_then(|i| slots[i].take())
        })
        .collect())
}
