use crate::assembly::local::ElementConnectivityAssembler;
use crate::sparse::LowerTriangularPattern;
use crate::Error;
use log::debug;
use std::collections::BTreeSet;

/// Builds the strictly lower triangular portrait of the global matrix.
///
/// Row `i` of the portrait contains column `j < i` if and only if some element contains both
/// global nodes `i` and `j`. Columns of each row are sorted.
pub fn build_portrait(element_assembler: &dyn ElementConnectivityAssembler) -> Result<LowerTriangularPattern, Error> {
    // A set per row stores each coupling exactly once, regardless of how many elements share it
    let mut connectivity = vec![BTreeSet::new(); element_assembler.num_nodes()];
    let mut element_global_nodes = Vec::new();
    for element_index in 0..element_assembler.num_elements() {
        element_global_nodes.resize(element_assembler.element_node_count(element_index), usize::MAX);
        element_assembler.populate_element_nodes(&mut element_global_nodes, element_index);

        for &pos_to_insert in &element_global_nodes {
            for &node_to_insert in &element_global_nodes {
                if pos_to_insert > node_to_insert {
                    connectivity[pos_to_insert].insert(node_to_insert);
                }
            }
        }
    }

    let pattern = LowerTriangularPattern::try_from_rows(connectivity)
        .map_err(|err| Error::InvalidMesh(format!("invalid element connectivity: {err}")))?;
    debug!(
        "Built portrait with {} rows and {} off-diagonal entries",
        pattern.dim(),
        pattern.nnz()
    );
    Ok(pattern)
}
