use crate::basis::TET_EDGES;
use crate::mesh::{FiniteElement, Mesh};
use crate::Error;
use log::debug;
use nalgebra::center;
use rustc_hash::FxHashMap;

impl Mesh {
    /// Converts a mesh of linear tetrahedra into a mesh of quadratic tetrahedra.
    ///
    /// One midpoint node is created for every unique edge and appended after the existing nodes,
    /// in the order the edges are first encountered. Elements keep their area and coefficient.
    pub fn to_quadratic(&self) -> Result<Mesh, Error> {
        if let Some(n) = self.nodes_per_element().filter(|&n| n != 4) {
            return Err(Error::InvalidMesh(format!(
                "conversion to quadratic elements requires 4-node elements, found {n}"
            )));
        }

        let mut points = self.points().to_vec();
        let mut edge_nodes: FxHashMap<[usize; 2], usize> = FxHashMap::default();
        let mut elements = Vec::with_capacity(self.num_elements());

        for element in self.elements() {
            let mut nodes = element.nodes.clone();
            for [a, b] in TET_EDGES {
                let (na, nb) = (element.nodes[a], element.nodes[b]);
                let key = [na.min(nb), na.max(nb)];
                let node = *edge_nodes.entry(key).or_insert_with(|| {
                    let midpoint = center(&points[na], &points[nb]);
                    points.push(midpoint);
                    points.len() - 1
                });
                nodes.push(node);
            }
            elements.push(FiniteElement::new(nodes, element.area, element.lambda));
        }

        debug!(
            "Converted {} linear elements to quadratic elements, adding {} edge nodes",
            elements.len(),
            edge_nodes.len()
        );
        Mesh::new(points, elements)
    }
}
