use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{LatticeError, REGISTRY_STATE};

// -----------------------------------------------------------------------------
// ClassNode / ClassId

/// One registered class: its name and the names of its direct parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassNode {
    pub name: &'static str,
    pub parents: &'static [&'static str],
}

/// Wire identifier of a `(base, derived)` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The object is exactly the static base class.
    pub const NOT_FOUND: ClassId = ClassId(u32::MAX);
}

/// A retained edge, as indices into the registration list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub base: usize,
    pub derived: usize,
}

// -----------------------------------------------------------------------------
// Lattice

/// Minimal inheritance edges of a closed class list, with their class-ids.
///
/// Built from the registration list alone: the first class is the static
/// base, the ancestor relation is closed transitively, then every edge implied
/// by a path through another registered class is dropped. The remaining edges
/// are ordered by `(base, derived)` registration index and numbered from `0`.
/// The same list always yields the same ids.
///
/// # Examples
///
/// ```
/// use vc_archive::poly::{ClassId, ClassNode, Lattice};
///
/// let lattice = Lattice::build(&[
///     ClassNode { name: "Base", parents: &[] },
///     ClassNode { name: "A", parents: &["Base"] },
///     ClassNode { name: "B", parents: &["Base"] },
///     // `Base` is implied through `A` and gets pruned.
///     ClassNode { name: "C", parents: &["A", "Base"] },
/// ])
/// .unwrap();
///
/// assert_eq!(lattice.edges().len(), 3);
/// assert_eq!(lattice.resolve(3), ClassId(2));
/// assert_eq!(lattice.id_resolve(ClassId(2)), 3);
/// assert_eq!(lattice.resolve(0), ClassId::NOT_FOUND);
/// ```
#[derive(Debug, Clone)]
pub struct Lattice {
    names: Vec<&'static str>,
    /// `ancestors[d][b]`: `b` is a proper ancestor of `d`.
    ancestors: Vec<Vec<bool>>,
    edges: Vec<Edge>,
    /// Outgoing edge indices per base, in id order.
    children: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Fresh,
    Active,
    Done,
}

impl Lattice {
    pub fn build(nodes: &[ClassNode]) -> Result<Self, LatticeError> {
        if nodes.is_empty() {
            return Err(LatticeError::Empty);
        }

        let mut index = HashMap::with_capacity_and_hasher(nodes.len(), REGISTRY_STATE);
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name, i).is_some() {
                return Err(LatticeError::DuplicateClass(node.name));
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut direct = Vec::with_capacity(node.parents.len());
            for &parent in node.parents {
                match index.get(parent) {
                    Some(&p) => direct.push(p),
                    None => {
                        return Err(LatticeError::UnknownParent {
                            class: node.name,
                            parent,
                        });
                    }
                }
            }
            parents.push(direct);
        }

        let n = nodes.len();
        let mut ancestors = vec![vec![false; n]; n];
        let mut state = vec![Visit::Fresh; n];
        for class in 0..n {
            close(class, &parents, &mut ancestors, &mut state, nodes)?;
        }

        for (class, node) in nodes.iter().enumerate().skip(1) {
            if !ancestors[class][0] {
                return Err(LatticeError::Unreachable {
                    class: node.name,
                    base: nodes[0].name,
                });
            }
        }

        let mut edges = Vec::new();
        let mut children = vec![Vec::new(); n];
        for base in 0..n {
            for derived in 0..n {
                let direct = ancestors[derived][base]
                    && !(0..n).any(|mid| ancestors[derived][mid] && ancestors[mid][base]);
                if direct {
                    children[base].push(edges.len());
                    edges.push(Edge { base, derived });
                }
            }
        }

        log::trace!("class lattice over {n} classes keeps {} edges", edges.len());

        Ok(Self {
            names: nodes.iter().map(|node| node.name).collect(),
            ancestors,
            edges,
            children,
        })
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn name(&self, class: usize) -> &'static str {
        self.names[class]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether an object of class `runtime` can be viewed as `class`.
    #[inline]
    pub fn is_a(&self, runtime: usize, class: usize) -> bool {
        runtime == class || self.ancestors[runtime][class]
    }

    /// Class-id for an object whose runtime class is `runtime`.
    ///
    /// Walks down from the static base, taking the first child the object
    /// can be viewed as and descending into it before trying siblings, so
    /// the deepest match wins. The final edge always ends at `runtime`.
    pub fn resolve(&self, runtime: usize) -> ClassId {
        match self.descend(0, runtime) {
            Some(edge) => ClassId(edge as u32),
            None => ClassId::NOT_FOUND,
        }
    }

    fn descend(&self, from: usize, runtime: usize) -> Option<usize> {
        let edge = self.children[from]
            .iter()
            .copied()
            .find(|&edge| self.is_a(runtime, self.edges[edge].derived))?;
        Some(self.descend(self.edges[edge].derived, runtime).unwrap_or(edge))
    }

    /// Class index to rebuild for a received class-id.
    ///
    /// # Panics
    /// If `id` names no edge: the decoder's class list differs from the
    /// encoder's.
    pub fn id_resolve(&self, id: ClassId) -> usize {
        if id == ClassId::NOT_FOUND {
            return 0;
        }
        match self.edges.get(id.0 as usize) {
            Some(edge) => edge.derived,
            None => panic!(
                "class-id {} has no registration below `{}` ({} edges)",
                id.0,
                self.names[0],
                self.edges.len(),
            ),
        }
    }
}

/// Depth-first closure of the ancestor relation, rejecting cycles.
fn close(
    class: usize,
    parents: &[Vec<usize>],
    ancestors: &mut [Vec<bool>],
    state: &mut [Visit],
    nodes: &[ClassNode],
) -> Result<(), LatticeError> {
    match state[class] {
        Visit::Done => return Ok(()),
        Visit::Active => return Err(LatticeError::Cycle(nodes[class].name)),
        Visit::Fresh => state[class] = Visit::Active,
    }

    for &parent in &parents[class] {
        close(parent, parents, ancestors, state, nodes)?;
        ancestors[class][parent] = true;
        for grand in 0..ancestors.len() {
            if ancestors[parent][grand] {
                ancestors[class][grand] = true;
            }
        }
    }

    state[class] = Visit::Done;
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
