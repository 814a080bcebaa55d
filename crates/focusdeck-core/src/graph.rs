//! Dependency graph over task relations.
//!
//! Raw relations are normalized into canonical predecessor -> successor
//! edges (a `blocks` edge from A to B and a `blocked_by` edge from B to A
//! describe the same thing). The builder derives one
//! [`DependencyAnnotation`] per task: blocking state, direct neighbors,
//! and completion progress over the task's connected component.
//!
//! The graph is rebuilt from scratch for every invocation; nothing is
//! cached across calls. Traversal is iterative throughout, so cyclic
//! relation data from the store cannot overflow the stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{RelationKind, Task};

/// Completion progress over the connected dependency component a task
/// belongs to. Absent for tasks with no dependency edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainContext {
    /// Fraction of component tasks that are done, in [0, 1].
    pub progress: f64,
    /// Same value scaled to a percentage, rounded to one decimal.
    pub progress_percent: f64,
    /// Direct successors that are workable right now: not done, not on a
    /// cycle, and with every predecessor done.
    pub next_actionable_ids: Vec<i64>,
}

/// Derived dependency facts for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnnotation {
    /// True when any direct predecessor is incomplete, or the task sits on
    /// a dependency cycle.
    pub is_blocked: bool,
    /// Incomplete direct predecessors, ascending id.
    pub blocked_by_ids: Vec<i64>,
    /// Direct successors, ascending id.
    pub blocking_ids: Vec<i64>,
    /// True when finishing this task would unblock at least one other.
    pub unlocks_tasks: bool,
    /// True when the task is part of a dependency cycle.
    pub on_cycle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainContext>,
}

struct Node {
    id: i64,
    done: bool,
    preds: Vec<usize>,
    succs: Vec<usize>,
    on_cycle: bool,
}

/// Directed blocking graph over one task snapshot.
pub struct DependencyGraph {
    index: HashMap<i64, usize>,
    annotations: Vec<DependencyAnnotation>,
}

impl DependencyGraph {
    /// Build the graph and all annotations for a task snapshot.
    ///
    /// Self-edges and edges to ids outside the snapshot are dropped;
    /// duplicate edges collapse to one. Runs in O(tasks + edges).
    pub fn build(tasks: &[Task]) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            index.entry(task.id).or_insert(i);
        }

        let mut nodes: Vec<Node> = tasks
            .iter()
            .map(|t| Node {
                id: t.id,
                done: t.done,
                preds: Vec::new(),
                succs: Vec::new(),
                on_cycle: false,
            })
            .collect();

        // Normalize every relation into predecessor -> successor.
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for task in tasks {
            let this = index[&task.id];
            for rel in &task.relations {
                let Some(&other) = index.get(&rel.task_id) else {
                    continue;
                };
                if other == this {
                    continue;
                }
                match rel.kind {
                    RelationKind::Blocks => edges.push((this, other)),
                    RelationKind::BlockedBy => edges.push((other, this)),
                    RelationKind::Other => {}
                }
            }
        }
        edges.sort_unstable();
        edges.dedup();
        for &(pred, succ) in &edges {
            nodes[pred].succs.push(succ);
            nodes[succ].preds.push(pred);
        }

        mark_cycles(&mut nodes);
        let cycle_ids: Vec<i64> = nodes.iter().filter(|n| n.on_cycle).map(|n| n.id).collect();
        if !cycle_ids.is_empty() {
            warn!(
                tasks = ?cycle_ids,
                "dependency cycle detected; marking all members blocked"
            );
        }

        let components = component_stats(&nodes);

        let annotations = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| annotate(i, node, &nodes, &components))
            .collect();

        Self { index, annotations }
    }

    /// Annotation for a task id, if the id was part of the snapshot.
    pub fn annotation(&self, task_id: i64) -> Option<&DependencyAnnotation> {
        self.index.get(&task_id).map(|&i| &self.annotations[i])
    }

    /// Ids of every task sitting on a dependency cycle, ascending.
    pub fn cycle_members(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .index
            .iter()
            .filter(|(_, &i)| self.annotations[i].on_cycle)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn annotate(
    node_idx: usize,
    node: &Node,
    nodes: &[Node],
    components: &ComponentStats,
) -> DependencyAnnotation {
    let mut blocked_by_ids: Vec<i64> = node
        .preds
        .iter()
        .filter(|&&p| !nodes[p].done)
        .map(|&p| nodes[p].id)
        .collect();
    blocked_by_ids.sort_unstable();

    let mut blocking_ids: Vec<i64> = node.succs.iter().map(|&s| nodes[s].id).collect();
    blocking_ids.sort_unstable();

    let chain = if node.preds.is_empty() && node.succs.is_empty() {
        None
    } else {
        let (total, done) = components.stats_for(node_idx);
        let progress = done as f64 / total as f64;
        let mut next_actionable_ids: Vec<i64> = node
            .succs
            .iter()
            .map(|&s| &nodes[s])
            .filter(|succ| {
                !succ.done && !succ.on_cycle && succ.preds.iter().all(|&p| nodes[p].done)
            })
            .map(|succ| succ.id)
            .collect();
        next_actionable_ids.sort_unstable();
        Some(ChainContext {
            progress,
            progress_percent: (progress * 1000.0).round() / 10.0,
            next_actionable_ids,
        })
    };

    DependencyAnnotation {
        is_blocked: node.on_cycle || !blocked_by_ids.is_empty(),
        unlocks_tasks: !node.done && !blocking_ids.is_empty(),
        blocked_by_ids,
        blocking_ids,
        on_cycle: node.on_cycle,
        chain,
    }
}

struct ComponentStats {
    component: Vec<usize>,
    totals: Vec<(usize, usize)>,
}

impl ComponentStats {
    fn stats_for(&self, node_idx: usize) -> (usize, usize) {
        self.totals[self.component[node_idx]]
    }
}

fn component_stats(nodes: &[Node]) -> ComponentStats {
    let mut component = vec![usize::MAX; nodes.len()];
    let mut totals: Vec<(usize, usize)> = Vec::new();

    for start in 0..nodes.len() {
        if component[start] != usize::MAX {
            continue;
        }
        let idx = totals.len();
        let mut total = 0usize;
        let mut done = 0usize;
        let mut stack = vec![start];
        component[start] = idx;
        while let Some(v) = stack.pop() {
            total += 1;
            if nodes[v].done {
                done += 1;
            }
            for &n in nodes[v].preds.iter().chain(nodes[v].succs.iter()) {
                if component[n] == usize::MAX {
                    component[n] = idx;
                    stack.push(n);
                }
            }
        }
        totals.push((total, done));
    }

    ComponentStats { component, totals }
}

/// Mark every node that sits on a directed cycle, using an iterative
/// Tarjan SCC pass over the successor edges. A strongly connected
/// component of two or more nodes is a cycle (self-edges were dropped
/// during normalization).
fn mark_cycles(nodes: &mut [Node]) {
    let n = nodes.len();
    let mut indices = vec![usize::MAX; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut counter = 0usize;

    // Explicit DFS frames: (node, next successor position).
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for start in 0..n {
        if indices[start] != usize::MAX {
            continue;
        }
        open_frame(start, &mut frames, &mut indices, &mut lowlink, &mut on_stack, &mut stack, &mut counter);

        while let Some(&mut (v, ref mut next)) = frames.last_mut() {
            if *next < nodes[v].succs.len() {
                let w = nodes[v].succs[*next];
                *next += 1;
                if indices[w] == usize::MAX {
                    open_frame(w, &mut frames, &mut indices, &mut lowlink, &mut on_stack, &mut stack, &mut counter);
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(indices[w]);
                }
            } else {
                if lowlink[v] == indices[v] {
                    let mut scc = Vec::new();
                    loop {
                        let w = stack.pop().expect("tarjan stack underflow");
                        on_stack[w] = false;
                        scc.push(w);
                        if w == v {
                            break;
                        }
                    }
                    if scc.len() > 1 {
                        for w in scc {
                            nodes[w].on_cycle = true;
                        }
                    }
                }
                frames.pop();
                if let Some(&mut (parent, _)) = frames.last_mut() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn open_frame(
    v: usize,
    frames: &mut Vec<(usize, usize)>,
    indices: &mut [usize],
    lowlink: &mut [usize],
    on_stack: &mut [bool],
    stack: &mut Vec<usize>,
    counter: &mut usize,
) {
    indices[v] = *counter;
    lowlink[v] = *counter;
    *counter += 1;
    stack.push(v);
    on_stack[v] = true;
    frames.push((v, 0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnergyLevel, Relation, RelationKind, Task};

    fn make_task(id: i64, done: bool, relations: Vec<Relation>) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            done,
            priority: 0,
            due_date: None,
            project_id: 1,
            energy: EnergyLevel::Medium,
            estimated_minutes: 25,
            relations,
        }
    }

    fn blocked_by(task_id: i64) -> Relation {
        Relation {
            task_id,
            kind: RelationKind::BlockedBy,
        }
    }

    fn blocks(task_id: i64) -> Relation {
        Relation {
            task_id,
            kind: RelationKind::Blocks,
        }
    }

    #[test]
    fn incomplete_predecessor_blocks_successor() {
        let tasks = vec![
            make_task(1, false, vec![]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let graph = DependencyGraph::build(&tasks);

        let one = graph.annotation(1).unwrap();
        assert!(!one.is_blocked);
        assert_eq!(one.blocking_ids, vec![2]);
        assert!(one.unlocks_tasks);

        let two = graph.annotation(2).unwrap();
        assert!(two.is_blocked);
        assert_eq!(two.blocked_by_ids, vec![1]);
        assert!(!two.unlocks_tasks);
    }

    #[test]
    fn done_predecessor_does_not_block() {
        let tasks = vec![
            make_task(1, true, vec![]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let two = graph.annotation(2).unwrap();
        assert!(!two.is_blocked);
        assert!(two.blocked_by_ids.is_empty());
    }

    #[test]
    fn blocks_edge_normalizes_to_blocked_by() {
        // 1 blocks 2 must mean the same as 2 blocked_by 1.
        let via_blocks = vec![
            make_task(1, false, vec![blocks(2)]),
            make_task(2, false, vec![]),
        ];
        let via_blocked_by = vec![
            make_task(1, false, vec![]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let a = DependencyGraph::build(&via_blocks);
        let b = DependencyGraph::build(&via_blocked_by);
        assert_eq!(a.annotation(2), b.annotation(2));
        assert_eq!(a.annotation(1), b.annotation(1));
    }

    #[test]
    fn duplicate_edges_collapse() {
        // Both sides report the same edge, plus a repeat.
        let tasks = vec![
            make_task(1, false, vec![blocks(2), blocks(2)]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        assert_eq!(graph.annotation(1).unwrap().blocking_ids, vec![2]);
        assert_eq!(graph.annotation(2).unwrap().blocked_by_ids, vec![1]);
    }

    #[test]
    fn self_and_dangling_edges_are_dropped() {
        let tasks = vec![make_task(1, false, vec![blocked_by(1), blocked_by(99)])];
        let graph = DependencyGraph::build(&tasks);
        let one = graph.annotation(1).unwrap();
        assert!(!one.is_blocked);
        assert!(one.chain.is_none());
    }

    #[test]
    fn chain_progress_two_of_five() {
        // 1 -> 2 -> 3 -> 4 -> 5, first two done.
        let tasks = vec![
            make_task(1, true, vec![]),
            make_task(2, true, vec![blocked_by(1)]),
            make_task(3, false, vec![blocked_by(2)]),
            make_task(4, false, vec![blocked_by(3)]),
            make_task(5, false, vec![blocked_by(4)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let chain = graph.annotation(3).unwrap().chain.clone().unwrap();
        assert!((chain.progress - 0.4).abs() < f64::EPSILON);
        assert!((chain.progress_percent - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn next_actionable_requires_all_predecessors_done() {
        // 3 needs both 1 (done) and 2 (not done).
        let tasks = vec![
            make_task(1, true, vec![]),
            make_task(2, false, vec![]),
            make_task(3, false, vec![blocked_by(1), blocked_by(2)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let one = graph.annotation(1).unwrap().chain.clone().unwrap();
        assert!(one.next_actionable_ids.is_empty());

        let two = graph.annotation(2).unwrap().chain.clone().unwrap();
        assert!(two.next_actionable_ids.is_empty());

        // Once 2 is done, 3 becomes actionable from both sides.
        let tasks = vec![
            make_task(1, true, vec![]),
            make_task(2, true, vec![]),
            make_task(3, false, vec![blocked_by(1), blocked_by(2)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let one = graph.annotation(1).unwrap().chain.clone().unwrap();
        assert_eq!(one.next_actionable_ids, vec![3]);
    }

    #[test]
    fn no_edges_means_no_chain() {
        let tasks = vec![make_task(1, false, vec![])];
        let graph = DependencyGraph::build(&tasks);
        assert!(graph.annotation(1).unwrap().chain.is_none());
    }

    #[test]
    fn two_task_cycle_blocks_both() {
        let tasks = vec![
            make_task(1, false, vec![blocked_by(2)]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let graph = DependencyGraph::build(&tasks);

        for id in [1, 2] {
            let ann = graph.annotation(id).unwrap();
            assert!(ann.is_blocked, "cycle member {id} must be blocked");
            assert!(ann.on_cycle);
            let chain = ann.chain.as_ref().unwrap();
            assert!(chain.next_actionable_ids.is_empty());
        }
        assert_eq!(graph.cycle_members(), vec![1, 2]);
    }

    #[test]
    fn cycle_members_never_appear_as_next_actionable() {
        // 0 (done) precedes 1; 1 and 2 form a cycle.
        let tasks = vec![
            make_task(10, true, vec![blocks(1)]),
            make_task(1, false, vec![blocked_by(2)]),
            make_task(2, false, vec![blocked_by(1)]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let root = graph.annotation(10).unwrap().chain.clone().unwrap();
        assert!(root.next_actionable_ids.is_empty());
    }

    #[test]
    fn cycle_marking_spares_the_rest_of_the_component() {
        // 1 <-> 2 cycle, 3 depends on a done task 4 in the same component.
        let tasks = vec![
            make_task(1, false, vec![blocked_by(2)]),
            make_task(2, false, vec![blocked_by(1), blocked_by(4)]),
            make_task(3, false, vec![blocked_by(4)]),
            make_task(4, true, vec![]),
        ];
        let graph = DependencyGraph::build(&tasks);
        assert!(graph.annotation(1).unwrap().on_cycle);
        assert!(graph.annotation(2).unwrap().on_cycle);
        let three = graph.annotation(3).unwrap();
        assert!(!three.on_cycle);
        assert!(!three.is_blocked);
    }

    #[test]
    fn components_are_isolated() {
        // Two separate chains; progress must not leak across.
        let tasks = vec![
            make_task(1, true, vec![blocks(2)]),
            make_task(2, false, vec![]),
            make_task(3, false, vec![blocks(4)]),
            make_task(4, false, vec![]),
        ];
        let graph = DependencyGraph::build(&tasks);
        let left = graph.annotation(1).unwrap().chain.clone().unwrap();
        assert!((left.progress - 0.5).abs() < f64::EPSILON);
        let right = graph.annotation(3).unwrap().chain.clone().unwrap();
        assert!((right.progress - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_cycle_is_detected_iteratively() {
        // A 200-task ring; recursion would be risky, iteration must not be.
        let n = 200;
        let tasks: Vec<Task> = (0..n)
            .map(|i| make_task(i, false, vec![blocked_by((i + 1) % n)]))
            .collect();
        let graph = DependencyGraph::build(&tasks);
        assert_eq!(graph.cycle_members().len(), n as usize);
    }
}
