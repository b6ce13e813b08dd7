//! Tetrahedral meshes with per-element area tags and material coefficients.
use crate::nalgebra::Point3;
use crate::Error;
use serde::{Deserialize, Serialize};

mod convert;
pub mod procedural;

/// An element of a tetrahedral mesh.
///
/// The first four nodes are the geometric vertices. Quadratic elements additionally carry the six
/// edge nodes, in the edge order given by [`TET_EDGES`](crate::basis::TET_EDGES).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiniteElement {
    pub nodes: Vec<usize>,
    /// Region the element belongs to.
    pub area: usize,
    /// Diffusion coefficient of the element.
    pub lambda: f64,
}

impl FiniteElement {
    pub fn new(nodes: Vec<usize>, area: usize, lambda: f64) -> Self {
        Self { nodes, area, lambda }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Global indices of the four geometric vertices.
    ///
    /// # Panics
    ///
    /// Panics if the element has fewer than four nodes.
    pub fn vertex_indices(&self) -> [usize; 4] {
        [self.nodes[0], self.nodes[1], self.nodes[2], self.nodes[3]]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    points: Vec<Point3<f64>>,
    elements: Vec<FiniteElement>,
}

impl Mesh {
    /// Creates a mesh, checking that all elements have the same number of nodes (4 or 10), that
    /// node indices are in bounds and distinct within each element, and that all coordinates and
    /// coefficients are finite.
    pub fn new(points: Vec<Point3<f64>>, elements: Vec<FiniteElement>) -> Result<Self, Error> {
        if let Some(index) = points.iter().position(|p| !p.coords.iter().all(|x| x.is_finite())) {
            return Err(Error::InvalidMesh(format!("point {index} has non-finite coordinates")));
        }

        let nodes_per_element = elements.first().map(FiniteElement::num_nodes);
        if let Some(n) = nodes_per_element {
            if n != 4 && n != 10 {
                return Err(Error::InvalidMesh(format!(
                    "elements must have 4 or 10 nodes, but element 0 has {n}"
                )));
            }
        }

        for (index, element) in elements.iter().enumerate() {
            if Some(element.num_nodes()) != nodes_per_element {
                return Err(Error::InvalidMesh(format!(
                    "element {index} has {} nodes, expected {}",
                    element.num_nodes(),
                    nodes_per_element.unwrap_or_default()
                )));
            }
            if let Some(&node) = element.nodes.iter().find(|&&node| node >= points.len()) {
                return Err(Error::InvalidMesh(format!(
                    "element {index} references node {node}, but the mesh has {} nodes",
                    points.len()
                )));
            }
            let mut sorted = element.nodes.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(Error::InvalidMesh(format!("element {index} has repeated nodes")));
            }
            if !element.lambda.is_finite() {
                return Err(Error::InvalidMesh(format!("element {index} has a non-finite coefficient")));
            }
        }

        Ok(Self { points, elements })
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn elements(&self) -> &[FiniteElement] {
        &self.elements
    }

    pub fn num_nodes(&self) -> usize {
        self.points.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Number of nodes of each element, or `None` for a mesh without elements.
    pub fn nodes_per_element(&self) -> Option<usize> {
        self.elements.first().map(FiniteElement::num_nodes)
    }

    /// Coordinates of the four geometric vertices of the given element.
    pub fn element_vertices(&self, element_index: usize) -> [Point3<f64>; 4] {
        self.elements[element_index]
            .vertex_indices()
            .map(|node| self.points[node])
    }

    /// The area number of the first element that references each node.
    ///
    /// Nodes that are not referenced by any element get `None`.
    pub fn node_areas(&self) -> Vec<Option<usize>> {
        let mut areas = vec![None; self.num_nodes()];
        for element in &self.elements {
            for &node in &element.nodes {
                areas[node].get_or_insert(element.area);
            }
        }
        areas
    }
}
