//! Permutation-preserving operators.
//!
//! Crossovers work on index vectors (`&[usize]` holding a permutation of
//! `0..n`); the positional mutations are generic over the element type, so
//! the same code also reorders genes of other types.
//!
//! # Crossover Operators
//!
//! - [`order_crossover`] (OX): Davis (1985), preserves relative order
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), preserves absolute position
//! - [`edge_recombination`] (ERX): Whitley et al. (1989), preserves adjacency
//!
//! # Mutation Operators
//!
//! - [`swap_mutation`]: Exchange two random positions, O(1)
//! - [`insert_mutation`]: Remove and reinsert at random position, O(n)
//! - [`invert_mutation`]: Reverse a random segment (2-opt), O(n)
//! - [`scramble_mutation`]: Shuffle a random segment, O(n)
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Whitley, Starkweather & Fuquay (1989), "Scheduling Problems and Traveling
//!   Salesmen: The Genetic Edge Recombination Operator"

use crate::random::{random_segment, shuffle};
use rand::Rng;

// ============================================================================
// Crossover operators
// ============================================================================

/// Order Crossover (OX).
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from one parent to the child at the same positions
/// 3. Fill the remaining positions with the other parent's elements, in
///    their order starting after the segment, skipping those already present
///
/// Parents must be permutations of `0..n` of equal length.
pub fn order_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        ox_build_child(parent1, parent2, start, end),
        ox_build_child(parent2, parent1, start, end),
    )
}

fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut in_segment = vec![false; n];

    for i in start..=end {
        child[i] = template[i];
        in_segment[template[i]] = true;
    }

    // fill after the segment, wrapping around
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !in_segment[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Partially Mapped Crossover (PMX).
///
/// 1. Select a random segment and copy it from one parent
/// 2. Each element of the other parent's segment that is still missing is
///    placed by following the segment mapping until a free position is found
/// 3. Remaining positions are filled from the other parent
pub fn pmx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        pmx_build_child(parent1, parent2, start, end),
        pmx_build_child(parent2, parent1, start, end),
    )
}

fn pmx_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let sentinel = usize::MAX;
    let mut child = vec![sentinel; n];
    let mut placed = vec![false; n];

    // donor_pos[v] = position of value v in donor
    let mut donor_pos = vec![0; n];
    for (i, &v) in donor.iter().enumerate() {
        donor_pos[v] = i;
    }

    for i in start..=end {
        child[i] = template[i];
        placed[template[i]] = true;
    }

    for i in start..=end {
        let donor_val = donor[i];
        if placed[donor_val] {
            continue;
        }
        let mut pos = i;
        loop {
            let target = donor_pos[template[pos]];
            if target < start || target > end {
                child[target] = donor_val;
                placed[donor_val] = true;
                break;
            }
            pos = target;
        }
    }

    for (slot, &v) in child.iter_mut().zip(donor) {
        if *slot == sentinel {
            *slot = v;
        }
    }

    child
}

/// Edge Recombination Crossover (ERX).
///
/// Builds each child from the union of both parents' (cyclic) adjacency
/// lists, always moving to the unvisited neighbor with the fewest remaining
/// neighbors. The first child starts at `parent1[0]`, the second at
/// `parent2[0]`.
pub fn edge_recombination<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let adjacency = edge_map(parent1, parent2);
    (
        erx_build_child(adjacency.clone(), parent1[0], rng),
        erx_build_child(adjacency, parent2[0], rng),
    )
}

/// Neighbors of every value in either parent, without duplicates, in first
/// seen order.
fn edge_map(parent1: &[usize], parent2: &[usize]) -> Vec<Vec<usize>> {
    let n = parent1.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::with_capacity(4); n];
    for parent in [parent1, parent2] {
        for i in 0..n {
            let v = parent[i];
            for neighbor in [parent[(i + n - 1) % n], parent[(i + 1) % n]] {
                if !adjacency[v].contains(&neighbor) {
                    adjacency[v].push(neighbor);
                }
            }
        }
    }
    adjacency
}

fn erx_build_child<R: Rng>(mut adjacency: Vec<Vec<usize>>, start: usize, rng: &mut R) -> Vec<usize> {
    let n = adjacency.len();
    let mut child = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut current = start;

    loop {
        child.push(current);
        visited[current] = true;
        if child.len() == n {
            break;
        }
        for list in adjacency.iter_mut() {
            list.retain(|&v| v != current);
        }

        let candidates = &adjacency[current];
        current = if candidates.is_empty() {
            let unvisited: Vec<usize> = (0..n).filter(|&v| !visited[v]).collect();
            unvisited[rng.random_range(0..unvisited.len())]
        } else {
            let fewest = candidates
                .iter()
                .map(|&v| adjacency[v].len())
                .min()
                .unwrap_or(0);
            let ties: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&v| adjacency[v].len() == fewest)
                .collect();
            ties[rng.random_range(0..ties.len())]
        };
    }

    child
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Swap mutation: exchange two random positions.
pub fn swap_mutation<T, R: Rng>(items: &mut [T], rng: &mut R) {
    let n = items.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    items.swap(i, j);
}

/// Insert mutation: remove an element and reinsert it at a random position.
pub fn insert_mutation<T, R: Rng>(items: &mut Vec<T>, rng: &mut R) {
    let n = items.len();
    if n < 2 {
        return;
    }
    let from = rng.random_range(0..n);
    let item = items.remove(from);
    let to = rng.random_range(0..n); // n-1 elements, n insertion points
    items.insert(to, item);
}

/// Invert mutation: reverse a random segment (2-opt move).
pub fn invert_mutation<T, R: Rng>(items: &mut [T], rng: &mut R) {
    let n = items.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    items[start..=end].reverse();
}

/// Scramble mutation: shuffle a random segment.
pub fn scramble_mutation<T, R: Rng>(items: &mut [T], rng: &mut R) {
    let n = items.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    shuffle(&mut items[start..=end], rng);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    /// Check that a slice is a valid permutation of 0..n.
    fn is_valid_permutation(perm: &[usize], n: usize) -> bool {
        let mut seen = vec![false; n];
        perm.len() == n
            && perm.iter().all(|&v| {
                let fresh = v < n && !seen[v];
                if fresh {
                    seen[v] = true;
                }
                fresh
            })
    }

    #[test]
    fn test_ox_produces_valid_permutations() {
        let mut rng = create_rng(42);
        let p1: Vec<usize> = (0..8).collect();
        let p2: Vec<usize> = (0..8).rev().collect();
        for _ in 0..100 {
            let (c1, c2) = order_crossover(&p1, &p2, &mut rng);
            assert!(is_valid_permutation(&c1, 8), "OX child1 not valid: {c1:?}");
            assert!(is_valid_permutation(&c2, 8), "OX child2 not valid: {c2:?}");
        }
    }

    #[test]
    fn test_single_element_parents_pass_through() {
        let mut rng = create_rng(42);
        assert_eq!(order_crossover(&[0], &[0], &mut rng), (vec![0], vec![0]));
        assert_eq!(pmx_crossover(&[0], &[0], &mut rng), (vec![0], vec![0]));
        assert_eq!(edge_recombination(&[0], &[0], &mut rng), (vec![0], vec![0]));
    }

    #[test]
    fn test_pmx_identical_parents() {
        let mut rng = create_rng(42);
        let p = vec![0, 1, 2, 3, 4];
        let (c1, c2) = pmx_crossover(&p, &p, &mut rng);
        assert_eq!(c1, p);
        assert_eq!(c2, p);
    }

    #[test]
    fn test_erx_keeps_parent_edges_when_parents_agree() {
        let mut rng = create_rng(5);
        let p: Vec<usize> = vec![3, 0, 4, 1, 2];
        let (c1, _) = edge_recombination(&p, &p, &mut rng);
        // same cycle, possibly walked in either direction
        let pos = |v: usize| c1.iter().position(|&x| x == v).unwrap();
        for i in 0..5 {
            let (a, b) = (p[i], p[(i + 1) % 5]);
            let d = (pos(a) + 5 - pos(b)) % 5;
            assert!(d == 1 || d == 4, "edge {a}-{b} lost in {c1:?}");
        }
    }

    #[test]
    fn test_invert_changes_eventually() {
        let mut rng = create_rng(42);
        let original = vec![0, 1, 2, 3, 4];
        let changed = (0..100).any(|_| {
            let mut perm = original.clone();
            invert_mutation(&mut perm, &mut rng);
            perm != original
        });
        assert!(changed, "invert should change the permutation eventually");
    }

    #[test]
    fn test_mutations_on_single_element_are_noops() {
        let mut rng = create_rng(42);
        let mut perm = vec![0];
        swap_mutation(&mut perm, &mut rng);
        insert_mutation(&mut perm, &mut rng);
        invert_mutation(&mut perm, &mut rng);
        scramble_mutation(&mut perm, &mut rng);
        assert_eq!(perm, vec![0]);
    }

    fn permutation(n: usize) -> impl Strategy<Value = Vec<usize>> {
        Just((0..n).collect::<Vec<usize>>()).prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_crossovers_never_duplicate(
            (p1, p2) in (2usize..20).prop_flat_map(|n| (permutation(n), permutation(n))),
            seed in any::<u64>(),
        ) {
            let n = p1.len();
            let mut rng = create_rng(seed);
            let (a, b) = order_crossover(&p1, &p2, &mut rng);
            prop_assert!(is_valid_permutation(&a, n) && is_valid_permutation(&b, n));
            let (a, b) = pmx_crossover(&p1, &p2, &mut rng);
            prop_assert!(is_valid_permutation(&a, n) && is_valid_permutation(&b, n));
            let (a, b) = edge_recombination(&p1, &p2, &mut rng);
            prop_assert!(is_valid_permutation(&a, n) && is_valid_permutation(&b, n));
        }

        #[test]
        fn prop_mutations_preserve_permutation(perm in (1usize..30).prop_flat_map(permutation), seed in any::<u64>()) {
            let n = perm.len();
            let mut rng = create_rng(seed);
            let mut p = perm.clone();
            swap_mutation(&mut p, &mut rng);
            insert_mutation(&mut p, &mut rng);
            invert_mutation(&mut p, &mut rng);
            scramble_mutation(&mut p, &mut rng);
            prop_assert!(is_valid_permutation(&p, n));
        }
    }
}
