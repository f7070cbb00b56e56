//! Node and element registries
//!
//! The registry owns every node; elements refer to nodes by the contiguous
//! index (`hid`) handed out at registration. Global DOF `6 * hid + d` belongs
//! to DOF `d` of that node.

use std::collections::HashMap;

use log::debug;

use crate::elements::{Element, Node};
use crate::error::{FEAError, FEAResult};

/// Default Manhattan-distance tolerance for merging coincident nodes
pub const DEFAULT_NODE_TOL: f64 = 1e-6;

/// Owner of all model nodes, merging nodes that fall within a tolerance
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` and return its index
    ///
    /// If an existing node lies within Manhattan distance `tol`, that node's
    /// index is returned and `node` is dropped; the existing representative
    /// keeps its own supports and loads.
    pub fn register(&mut self, mut node: Node, tol: f64) -> usize {
        if let Some(existing) = self.nodes.iter().position(|n| n.manhattan_distance(&node) < tol) {
            debug!(
                "Node at ({}, {}, {}) merged into node {}",
                node.x, node.y, node.z, existing
            );
            return existing;
        }
        let hid = self.nodes.len();
        node.hid = Some(hid);
        self.nodes.push(node);
        hid
    }

    /// Index of the first node within `tol` of `point`, without registering
    pub fn find(&self, point: [f64; 3], tol: f64) -> Option<usize> {
        let probe = Node::new(point[0], point[1], point[2]);
        self.nodes.iter().position(|n| n.manhattan_distance(&probe) < tol)
    }

    pub fn get(&self, hid: usize) -> FEAResult<&Node> {
        self.nodes.get(hid).ok_or(FEAError::NodeNotFound(hid))
    }

    pub fn get_mut(&mut self, hid: usize) -> FEAResult<&mut Node> {
        self.nodes.get_mut(hid).ok_or(FEAError::NodeNotFound(hid))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

/// Sequential generator of element names scoped to one model
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: &'static str,
    next: usize,
}

impl IdGenerator {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }

    pub fn next_name(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

/// Elements of one variant, indexed sequentially and by name
#[derive(Debug, Clone)]
pub struct ElementRegistry<T> {
    elements: Vec<T>,
    names: HashMap<String, usize>,
    ids: IdGenerator,
}

impl<T: Element> ElementRegistry<T> {
    /// Empty registry whose unnamed elements are called `{prefix}0`, `{prefix}1`, ...
    pub fn new(prefix: &'static str) -> Self {
        Self {
            elements: Vec::new(),
            names: HashMap::new(),
            ids: IdGenerator::new(prefix),
        }
    }

    /// Store `element` and return its index
    ///
    /// Unnamed elements get the next free generated name. A name already in
    /// use is rejected.
    pub fn add(&mut self, mut element: T) -> FEAResult<usize> {
        let name = match element.name() {
            Some(name) => {
                if self.names.contains_key(name) {
                    return Err(FEAError::InvalidInput(format!(
                        "element name '{}' is already in use",
                        name
                    )));
                }
                name.to_string()
            }
            None => {
                let mut generated = self.ids.next_name();
                while self.names.contains_key(&generated) {
                    generated = self.ids.next_name();
                }
                element.assign_name(generated.clone());
                generated
            }
        };

        let index = self.elements.len();
        self.names.insert(name, index);
        self.elements.push(element);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> FEAResult<&T> {
        self.elements
            .get(index)
            .ok_or_else(|| FEAError::ElementNotFound(format!("#{}", index)))
    }

    pub fn get_mut(&mut self, index: usize) -> FEAResult<&mut T> {
        self.elements
            .get_mut(index)
            .ok_or_else(|| FEAError::ElementNotFound(format!("#{}", index)))
    }

    pub fn by_name(&self, name: &str) -> FEAResult<&T> {
        let index = self.index_of(name)?;
        self.get(index)
    }

    pub fn index_of(&self, name: &str) -> FEAResult<usize> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| FEAError::ElementNotFound(name.to_string()))
    }

    /// Index of the first element matching `pred`
    pub fn position(&self, pred: impl Fn(&T) -> bool) -> Option<usize> {
        self.elements.iter().position(pred)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{FrameElement, Material, Section};

    #[test]
    fn test_register_assigns_sequential_indices() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.register(Node::new(0.0, 0.0, 0.0), DEFAULT_NODE_TOL), 0);
        assert_eq!(registry.register(Node::new(1.0, 0.0, 0.0), DEFAULT_NODE_TOL), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().hid(), Some(1));
    }

    #[test]
    fn test_duplicate_node_merged() {
        let mut registry = NodeRegistry::new();
        let first = registry.register(Node::new(1.0, 2.0, 3.0).fixed(), DEFAULT_NODE_TOL);
        let second = registry.register(Node::new(1.0 + 2e-7, 2.0, 3.0 - 2e-7), DEFAULT_NODE_TOL);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        // representative keeps its own supports
        assert_eq!(registry.get(first).unwrap().constrained_count(), 6);
    }

    #[test]
    fn test_manhattan_tolerance_boundary() {
        let mut registry = NodeRegistry::new();
        registry.register(Node::new(0.0, 0.0, 0.0), 1e-3);
        // each axis within tolerance but the sum is not
        let idx = registry.register(Node::new(6e-4, 6e-4, 0.0), 1e-3);
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_find_and_missing_lookup() {
        let mut registry = NodeRegistry::new();
        registry.register(Node::new(0.0, 0.0, 0.0), DEFAULT_NODE_TOL);
        registry.register(Node::new(5.0, 0.0, 0.0), DEFAULT_NODE_TOL);
        assert_eq!(registry.find([5.0, 0.0, 0.0], DEFAULT_NODE_TOL), Some(1));
        assert_eq!(registry.find([2.0, 0.0, 0.0], DEFAULT_NODE_TOL), None);
        assert!(matches!(registry.get(7), Err(FEAError::NodeNotFound(7))));
    }

    #[test]
    fn test_element_names_generated_and_unique() {
        let mut nodes = NodeRegistry::new();
        for x in [0.0, 1.0, 2.0] {
            nodes.register(Node::new(x, 0.0, 0.0), DEFAULT_NODE_TOL);
        }
        let mat = Material::steel();
        let sec = Section::rectangular(0.1, 0.2);

        let mut frames = ElementRegistry::new("F");
        let named = FrameElement::new(&nodes, 0, 1, &mat, &sec).unwrap().with_name("F0");
        assert_eq!(frames.add(named).unwrap(), 0);
        // generator skips the name the caller already took
        let unnamed = FrameElement::new(&nodes, 1, 2, &mat, &sec).unwrap();
        assert_eq!(frames.add(unnamed).unwrap(), 1);
        assert_eq!(frames.get(1).unwrap().name(), Some("F1"));
        assert_eq!(frames.index_of("F1").unwrap(), 1);

        let clash = FrameElement::new(&nodes, 0, 2, &mat, &sec).unwrap().with_name("F1");
        assert!(matches!(frames.add(clash), Err(FEAError::InvalidInput(_))));
        assert!(matches!(frames.by_name("X9"), Err(FEAError::ElementNotFound(_))));
    }
}
