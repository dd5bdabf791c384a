//! Class depth
//!
//! The depth of a class is its hop count from the nearest root class, with
//! relations treated as undirected edges. Used to prune the class diagram to
//! the neighbourhood of the input schemas.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::domain::{Class, ClassId, Relation};

const UNVISITED: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct GraphNode {
    class: ClassId,
    distance: usize,
}

/// Undirected class graph with per-node distance scratch space
struct ClassGraph {
    graph: UnGraph<GraphNode, ()>,
    index: HashMap<ClassId, NodeIndex>,
}

impl ClassGraph {
    fn new(classes: &[Class], relations: &[Relation]) -> Self {
        let mut graph = UnGraph::with_capacity(classes.len(), relations.len());
        let mut index = HashMap::with_capacity(classes.len());

        for class in classes {
            let node = graph.add_node(GraphNode {
                class: class.id,
                distance: UNVISITED,
            });
            index.insert(class.id, node);
        }

        for relation in relations {
            if let (Some(&from), Some(&to)) = (index.get(&relation.from), index.get(&relation.to)) {
                graph.add_edge(from, to, ());
            }
        }

        Self { graph, index }
    }

    /// Relax distances outward from `root`
    fn relax_from(&mut self, root: NodeIndex) {
        self.graph[root].distance = 0;
        let mut worklist = vec![root];

        while let Some(current) = worklist.pop() {
            let next = self.graph[current].distance + 1;
            let neighbors: Vec<NodeIndex> = self.graph.neighbors(current).collect();

            for neighbor in neighbors {
                if next < self.graph[neighbor].distance {
                    self.graph[neighbor].distance = next;
                    worklist.push(neighbor);
                }
            }
        }
    }

    fn reset(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.distance = UNVISITED;
        }
    }

    fn visited(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights().filter(|n| n.distance != UNVISITED)
    }
}

/// Minimum distance from any root, for every reachable class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthMap {
    depths: HashMap<ClassId, usize>,
}

impl DepthMap {
    /// Compute depths for `classes` connected by `relations`, starting at `roots`.
    ///
    /// Roots without a class are ignored. Classes not reachable from any root
    /// are absent from the map.
    pub fn compute(roots: &[ClassId], classes: &[Class], relations: &[Relation]) -> Self {
        let mut graph = ClassGraph::new(classes, relations);
        let mut depths: HashMap<ClassId, usize> = HashMap::new();

        for root in roots {
            let Some(&start) = graph.index.get(root) else {
                continue;
            };

            graph.relax_from(start);
            for node in graph.visited() {
                depths
                    .entry(node.class)
                    .and_modify(|d| *d = (*d).min(node.distance))
                    .or_insert(node.distance);
            }
            graph.reset();
        }

        Self { depths }
    }

    pub fn get(&self, class: ClassId) -> Option<usize> {
        self.depths.get(&class).copied()
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.depths.contains_key(&class)
    }

    /// True when `class` was reached within `limit` hops
    pub fn within(&self, class: ClassId, limit: usize) -> bool {
        self.get(class).is_some_and(|d| d <= limit)
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, usize)> + '_ {
        self.depths.iter().map(|(&class, &depth)| (class, depth))
    }
}
