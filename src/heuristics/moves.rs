//! Move primitives shared by the neighborhoods and the shaking step.
//!
//! Each primitive checks feasibility on the borrowed bins first and only
//! clones them once the move is known to fit. `None` means the move was not
//! applicable; the input is never touched.

use crate::bins::Bin;
use crate::instance::Item;

fn collect_at(bin: &Bin, positions: &[usize]) -> Option<Vec<Item>> {
    positions.iter().map(|&p| bin.items().get(p).copied()).collect()
}

fn total_size(items: &[Item]) -> i64 {
    items.iter().map(|it| it.size).sum()
}

/// Exchange the items stored at `from_a` in bin `a` with those at `from_b` in bin `b`
pub fn swap_groups(
    bins: &[Bin],
    a: usize,
    from_a: &[usize],
    b: usize,
    from_b: &[usize],
) -> Option<Vec<Bin>> {
    if a == b || from_a.is_empty() || from_b.is_empty() {
        return None;
    }

    let group_a = collect_at(bins.get(a)?, from_a)?;
    let group_b = collect_at(bins.get(b)?, from_b)?;
    let size_a = total_size(&group_a);
    let size_b = total_size(&group_b);

    if bins[a].remaining() + size_a - size_b < 0 || bins[b].remaining() + size_b - size_a < 0 {
        return None;
    }

    let mut next = bins.to_vec();
    for item in &group_a {
        next[a].remove_by_id(item.id);
    }
    for item in &group_b {
        next[b].remove_by_id(item.id);
    }
    for &item in &group_a {
        next[b].add(item);
    }
    for &item in &group_b {
        next[a].add(item);
    }

    Some(next)
}

/// Exchange two groups of items given by id. Both groups must each sit in a
/// single bin, and the two bins must differ.
pub fn swap_items_by_id(bins: &[Bin], ids_a: &[usize], ids_b: &[usize]) -> Option<Vec<Bin>> {
    let (first_a, first_b) = (*ids_a.first()?, *ids_b.first()?);
    let a = bins.iter().position(|bin| bin.has(first_a))?;
    let b = bins.iter().position(|bin| bin.has(first_b))?;

    let from_a: Vec<usize> = ids_a
        .iter()
        .map(|&id| bins[a].position(id))
        .collect::<Option<_>>()?;
    let from_b: Vec<usize> = ids_b
        .iter()
        .map(|&id| bins[b].position(id))
        .collect::<Option<_>>()?;

    swap_groups(bins, a, &from_a, b, &from_b)
}

/// Three-bin rotation. Bin `t[0]` is expected to be the emptiest of the three.
///
/// For every combination of one item per bin, two rotations are tested:
/// - item1 larger than item2: item0 and item2 go to bin1, item1 goes to bin2
/// - otherwise: item0 and item1 go to bin2, item2 goes to bin1
///
/// The first feasible one is applied; bin `t[0]` is dropped if it ends up empty.
pub fn cycle_three(bins: &[Bin], t: [usize; 3]) -> Option<Vec<Bin>> {
    let (bin0, bin1, bin2) = (bins.get(t[0])?, bins.get(t[1])?, bins.get(t[2])?);
    let (rem1, rem2) = (bin1.remaining(), bin2.remaining());

    for &item0 in bin0.items() {
        if item0.size > rem1 + rem2 {
            continue;
        }
        for &item1 in bin1.items() {
            for &item2 in bin2.items() {
                let (s0, s1, s2) = (item0.size, item1.size, item2.size);

                let targets = if s1 > s2 {
                    if s1 <= rem2 + s2 && s0 + s2 <= rem1 + s1 {
                        Some((t[1], t[1], t[2]))
                    } else {
                        None
                    }
                } else if s2 <= rem1 + s1 && s0 + s1 <= rem2 + s2 {
                    Some((t[2], t[1], t[2]))
                } else {
                    None
                };

                // (destination of item0, destination of item2, destination of item1)
                if let Some((to0, to2, to1)) = targets {
                    let mut next = bins.to_vec();
                    next[t[0]].remove_by_id(item0.id);
                    next[t[1]].remove_by_id(item1.id);
                    next[t[2]].remove_by_id(item2.id);

                    next[to0].add(item0);
                    next[to2].add(item2);
                    next[to1].add(item1);

                    if next[t[0]].is_empty() {
                        next.remove(t[0]);
                    }
                    return Some(next);
                }
            }
        }
    }

    None
}

/// Move every item of bin `from` that fits somewhere else into the first bin
/// with enough room, restarting the scan after each move. The bin is removed
/// if it ends up empty.
pub fn evacuate(bins: &[Bin], from: usize) -> Vec<Bin> {
    let mut next = bins.to_vec();
    let mut position = 0;

    while position < next[from].count() {
        let item = next[from].items()[position];

        let target = next
            .iter()
            .enumerate()
            .position(|(index, bin)| index != from && bin.remaining() >= item.size);

        match target {
            Some(index) => {
                next[from].remove_at(position);
                next[index].add(item);
                position = 0;
            }
            None => position += 1,
        }
    }

    if next[from].is_empty() {
        next.remove(from);
    }
    next
}

/// Swap one item of `donor` for a group of items from `receiver`.
///
/// Donor items are tried largest first. The group is accumulated from the
/// receiver's items in stored order until the group plus the receiver's slack
/// can hold the donor item. The group must hold at least two items and must
/// not be larger than the donor item.
pub fn exchange_one_for_group(bins: &[Bin], donor: usize, receiver: usize) -> Option<Vec<Bin>> {
    if donor == receiver {
        return None;
    }
    let (donor_bin, receiver_bin) = (bins.get(donor)?, bins.get(receiver)?);

    for &item in donor_bin.items().iter().rev() {
        let mut group: Vec<Item> = Vec::new();
        let mut group_size = 0;

        for &candidate in receiver_bin.items() {
            group_size += candidate.size;
            group.push(candidate);
            if group_size + receiver_bin.remaining() >= item.size {
                break;
            }
        }

        if group_size > item.size || group.len() <= 1 {
            continue;
        }

        if donor_bin.remaining() - group_size + item.size < 0
            || receiver_bin.remaining() + group_size - item.size < 0
        {
            continue;
        }

        let mut next = bins.to_vec();
        next[donor].remove_by_id(item.id);
        for member in &group {
            next[receiver].remove_by_id(member.id);
        }
        next[receiver].add(item);
        for &member in &group {
            next[donor].add(member);
        }
        return Some(next);
    }

    None
}
