//! Integrity checks on solutions.
//! 
//! A solution is valid when its bins hold exactly the original items: same
//! cardinality, no duplicated id, every `(id, size)` pair matched once. A bin
//! loaded beyond its capacity is reported as well.

use crate::instance::Item;
use crate::solution::Solution;
use std::collections::{HashMap, HashSet};

/// Reason a solution is not a valid partition of the original items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// The solution holds a different number of items
    CardinalityMismatch { expected: usize, found: usize },
    /// The same id appears more than once
    DuplicateItem { id: usize },
    /// An item has no matching `(id, size)` in the original items
    UnknownItem { id: usize, size: i64 },
    /// A bin holds more than its capacity
    CapacityExceeded { bin: usize, load: i64, capacity: i64 },
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityError::CardinalityMismatch { expected, found } => write!(
                f,
                "Solution holds {} items but the instance has {}",
                found, expected
            ),
            IntegrityError::DuplicateItem { id } => {
                write!(f, "Item {} appears more than once", id)
            }
            IntegrityError::UnknownItem { id, size } => write!(
                f,
                "Item {} of size {} does not match any original item",
                id, size
            ),
            IntegrityError::CapacityExceeded { bin, load, capacity } => write!(
                f,
                "Bin {} is loaded with {} which exceeds capacity {}",
                bin, load, capacity
            ),
        }
    }
}

impl std::error::Error for IntegrityError {}

/// Check that `solution` is a feasible partition of `original`
pub fn check(solution: &Solution, original: &[Item]) -> Result<(), IntegrityError> {
    let found = solution.item_count();
    if found != original.len() {
        return Err(IntegrityError::CardinalityMismatch {
            expected: original.len(),
            found,
        });
    }

    let mut unmatched: HashMap<(usize, i64), usize> = HashMap::with_capacity(original.len());
    for item in original {
        *unmatched.entry((item.id, item.size)).or_insert(0) += 1;
    }

    let mut seen = HashSet::with_capacity(found);
    for (index, bin) in solution.bins.iter().enumerate() {
        if bin.load() > bin.capacity() || bin.remaining() < 0 {
            return Err(IntegrityError::CapacityExceeded {
                bin: index,
                load: bin.load(),
                capacity: bin.capacity(),
            });
        }

        for item in bin.items() {
            if !seen.insert(item.id) {
                return Err(IntegrityError::DuplicateItem { id: item.id });
            }
            match unmatched.get_mut(&(item.id, item.size)) {
                Some(count) if *count > 0 => *count -= 1,
                _ => {
                    return Err(IntegrityError::UnknownItem {
                        id: item.id,
                        size: item.size,
                    })
                }
            }
        }
    }

    Ok(())
}

/// Boolean form of [`check`], logging the violation
pub fn is_valid(solution: &Solution, original: &[Item]) -> bool {
    match check(solution, original) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Integrity check failed for {} solution: {}", solution.algorithm, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::Bin;

    fn items() -> Vec<Item> {
        vec![Item::new(0, 4), Item::new(1, 8), Item::new(2, 5), Item::new(3, 3)]
    }

    fn solution_of(groups: &[&[Item]]) -> Solution {
        let bins = groups
            .iter()
            .map(|group| {
                let mut bin = Bin::new(10);
                for &item in group.iter() {
                    assert!(bin.add(item));
                }
                bin
            })
            .collect();
        Solution::from_bins(10, bins, "test")
    }

    #[test]
    fn test_valid_partition() {
        let it = items();
        let sol = solution_of(&[&[it[1]], &[it[2], it[0]], &[it[3]]]);
        assert_eq!(check(&sol, &it), Ok(()));
        assert!(is_valid(&sol, &it));
    }

    #[test]
    fn test_missing_item() {
        let it = items();
        let sol = solution_of(&[&[it[1]], &[it[2], it[0]]]);
        assert_eq!(
            check(&sol, &it),
            Err(IntegrityError::CardinalityMismatch { expected: 4, found: 3 })
        );
    }

    #[test]
    fn test_duplicate_item() {
        let it = items();
        let sol = solution_of(&[&[it[1]], &[it[2], it[0]], &[it[0]]]);
        assert_eq!(check(&sol, &it), Err(IntegrityError::DuplicateItem { id: 0 }));
    }

    #[test]
    fn test_size_mismatch() {
        let it = items();
        let forged = Item::new(3, 2);
        let sol = solution_of(&[&[it[1]], &[it[2], it[0]], &[forged]]);
        assert_eq!(
            check(&sol, &it),
            Err(IntegrityError::UnknownItem { id: 3, size: 2 })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = IntegrityError::DuplicateItem { id: 7 };
        assert_eq!(err.to_string(), "Item 7 appears more than once");
    }
}
