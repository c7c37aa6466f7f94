//! The DeRemer/Pennello `digraph` traversal (§4.5): a single Tarjan-style
//! strongly-connected-component walk, shared by both the `reads` and
//! `includes` relations that `lalr.rs` builds lookahead sets from.
//!
//! `N` here is always a `GotoIndex`-sized domain (one node per
//! shift-on-nonterminal transition), so the caller passes plain `usize`
//! node ids and an adjacency list; `digraph.rs` has no notion of grammars,
//! gotos, or items, only nodes and a bitset to accumulate into.

use lalr_core::bitset::Bitset2D;

/// Runs `digraph` (DeRemer & Pennello 1982, figure 3) over `edges`, folding
/// each node's own initial contribution plus everything reachable from it
/// into `follow`'s row for that node.
///
/// `follow` must already contain, before this call, each node's *direct*
/// contribution (its `Read`/`F(x)` initial set) — `visit` only propagates
/// that seed along edges, it never invents bits. Nodes within the same SCC
/// end up with identical rows (the whole point: one member settles, all
/// members inherit).
pub fn traverse(n_nodes: usize, edges: &[Vec<usize>], follow: &mut Bitset2D) {
    let mut depth = vec![0usize; n_nodes];
    let mut stack: Vec<usize> = Vec::new();
    for n in 0..n_nodes {
        if depth[n] == 0 {
            visit(n, edges, follow, &mut depth, &mut stack);
        }
    }
}

const INF: usize = usize::MAX;

fn visit(n: usize, edges: &[Vec<usize>], follow: &mut Bitset2D, depth: &mut [usize], stack: &mut Vec<usize>) {
    stack.push(n);
    let height = stack.len();
    depth[n] = height;

    for &m in &edges[n] {
        if depth[m] == 0 {
            visit(m, edges, follow, depth, stack);
        }
        depth[n] = depth[n].min(depth[m]);
        follow.or_row(n, m);
    }

    if depth[n] == height {
        loop {
            let m = stack.pop().expect("node pushed before recursing into its own SCC");
            depth[m] = INF;
            if m == n {
                break;
            }
            // `m` is in the same SCC as `n` and `n`'s row is now final
            // (every edge out of the SCC has been folded in above): give
            // every other member of the SCC an identical copy, not a union,
            // so a later `or_row` elsewhere can't reintroduce a bit this
            // SCC was never entitled to independently.
            follow.copy_row(m, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_node_keeps_only_its_own_seed() {
        let edges = vec![vec![], vec![]];
        let mut follow = Bitset2D::new(2, 4);
        follow.set(0, 1);
        traverse(2, &edges, &mut follow);
        assert!(follow.test(0, 1));
        assert!(follow.row_is_empty(1));
    }

    #[test]
    fn propagates_along_a_dag_edge() {
        // 0 -> 1, seed only on 1.
        let edges = vec![vec![1], vec![]];
        let mut follow = Bitset2D::new(2, 4);
        follow.set(1, 2);
        traverse(2, &edges, &mut follow);
        assert!(follow.test(0, 2), "0 must inherit 1's settled row");
        assert!(follow.test(1, 2));
    }

    #[test]
    fn cycle_members_end_up_identical() {
        // 0 <-> 1, seed split across both.
        let edges = vec![vec![1], vec![0]];
        let mut follow = Bitset2D::new(2, 4);
        follow.set(0, 2);
        follow.set(1, 3);
        traverse(2, &edges, &mut follow);
        assert!(follow.test(0, 2));
        assert!(follow.test(0, 3));
        assert!(follow.test(1, 2));
        assert!(follow.test(1, 3));
    }

    #[test]
    fn three_node_chain_transfers_transitively() {
        // 0 -> 1 -> 2, seed only on 2.
        let edges = vec![vec![1], vec![2], vec![]];
        let mut follow = Bitset2D::new(3, 2);
        follow.set(2, 0);
        traverse(3, &edges, &mut follow);
        assert!(follow.test(0, 0));
        assert!(follow.test(1, 0));
    }
}
