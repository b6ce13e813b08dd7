//! Setup and solution of a complete Poisson problem.
use crate::assembly::global::SystemAssembler;
use crate::basis::Basis;
use crate::boundary::{apply_dirichlet, BoundaryValues, DirichletBoundary};
use crate::integrate::Integrator;
use crate::mesh::Mesh;
use crate::nalgebra::{DVector, Point3};
use crate::sparse::{CgOutput, IterativeSolver, Preconditioner};
use crate::Error;
use eyre::{eyre, WrapErr};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of the iterative solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub max_iterations: usize,
    /// Relative residual tolerance `||r|| / ||b||`.
    pub tolerance: f64,
    pub preconditioner: Preconditioner,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-12,
            preconditioner: Preconditioner::IncompleteCholesky,
        }
    }
}

/// Everything needed to set up and solve a Poisson problem `-∇·(λ∇u) = f`.
///
/// `exact_solution` is evaluated at a point and an area number. It provides the values of
/// [`NeedExact`](crate::boundary::DirichletKind::NeedExact) boundary entries.
#[derive(Debug, Clone)]
pub struct ProblemDefinition<U, F> {
    pub mesh: Mesh,
    pub basis: Basis,
    pub settings: SolverSettings,
    pub boundaries: Vec<DirichletBoundary>,
    pub boundary_values: BoundaryValues,
    pub exact_solution: U,
    pub source: F,
}

/// Nodal solution of a Poisson problem.
#[derive(Debug, Clone, PartialEq)]
pub struct FemSolution {
    pub values: DVector<f64>,
    pub output: CgOutput,
    pub running_time: Duration,
}

#[derive(Debug, Clone)]
pub struct FemSolver<U, F> {
    definition: ProblemDefinition<U, F>,
    integrator: Integrator,
}

impl<U, F> FemSolver<U, F>
where
    U: Fn(&Point3<f64>, usize) -> f64,
    F: Fn(&Point3<f64>) -> f64,
{
    /// Validates the problem definition.
    pub fn new(definition: ProblemDefinition<U, F>) -> eyre::Result<Self> {
        validate(&definition).wrap_err("invalid problem definition")?;
        Ok(Self {
            definition,
            integrator: Integrator::default(),
        })
    }

    /// Replaces the integrator used for element assembly.
    pub fn with_integrator(self, integrator: Integrator) -> Self {
        Self { integrator, ..self }
    }

    pub fn definition(&self) -> &ProblemDefinition<U, F> {
        &self.definition
    }

    /// Boundary entries, with their values filled in after a call to [`solve`](Self::solve).
    pub fn boundaries(&self) -> &[DirichletBoundary] {
        &self.definition.boundaries
    }

    pub fn solve(&mut self) -> eyre::Result<FemSolution> {
        let ProblemDefinition {
            mesh,
            basis,
            settings,
            boundaries,
            boundary_values,
            exact_solution,
            source,
        } = &mut self.definition;
        let (mesh, exact_solution, source) = (&*mesh, &*exact_solution, &*source);

        let mut assembler = SystemAssembler::new(mesh, *basis, self.integrator.clone())?;
        assembler
            .assemble_system(|x| source(x))
            .wrap_err("failed to assemble global system")?;
        let (mut matrix, mut rhs) = assembler.into_system()?;

        apply_dirichlet(
            &mut matrix,
            &mut rhs,
            mesh.points(),
            boundaries,
            boundary_values,
            |x, area| exact_solution(x, area),
        )
        .wrap_err("failed to apply Dirichlet boundary conditions")?;
        debug!("Applied {} Dirichlet boundary entries", boundaries.len());

        let mut solver = IterativeSolver::new(settings.max_iterations, settings.tolerance, settings.preconditioner);
        solver.set_matrix(matrix);
        solver.set_vector(rhs);
        let output = solver.compute().wrap_err("failed to solve linear system")?;
        let running_time = solver
            .running_time()
            .ok_or_else(|| eyre!("solver did not record a running time"))?;
        let values = solver
            .into_solution()
            .ok_or_else(|| eyre!("solver did not produce a solution"))?;

        info!(
            "Solved system with {} unknowns in {:?} ({} iterations)",
            values.len(),
            running_time,
            output.num_iterations
        );
        Ok(FemSolution {
            values,
            output,
            running_time,
        })
    }
}

fn validate<U, F>(definition: &ProblemDefinition<U, F>) -> Result<(), Error> {
    let ProblemDefinition {
        mesh, basis, settings, ..
    } = definition;

    if let Some(n) = mesh.nodes_per_element().filter(|&n| n != basis.size()) {
        return Err(Error::InvalidConfiguration(format!(
            "{basis:?} basis requires elements with {} nodes, but the mesh has elements with {n} nodes",
            basis.size()
        )));
    }
    if let Some(boundary) = definition
        .boundaries
        .iter()
        .find(|boundary| boundary.node >= mesh.num_nodes())
    {
        return Err(Error::BoundaryNodeOutOfBounds {
            node: boundary.node,
            num_nodes: mesh.num_nodes(),
        });
    }
    if !(settings.tolerance > 0.0 && settings.tolerance.is_finite()) {
        return Err(Error::InvalidConfiguration(format!(
            "solver tolerance must be positive and finite, got {}",
            settings.tolerance
        )));
    }
    if settings.max_iterations == 0 {
        return Err(Error::InvalidConfiguration(
            "maximum number of iterations must be positive".to_string(),
        ));
    }
    Ok(())
}
