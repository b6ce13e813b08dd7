use matrixcompare::assert_scalar_eq;
use nalgebra::Point3;
use shellfem::basis::Basis;
use shellfem::boundary::{BoundaryValues, DirichletBoundary, DirichletKind};
use shellfem::mesh::procedural::{box_boundary_nodes, create_unit_box_uniform_tet_mesh};
use shellfem::mesh::{FiniteElement, Mesh};
use shellfem::problem::{FemSolver, ProblemDefinition, SolverSettings};
use shellfem::sparse::Preconditioner;
use shellfem::Error;

fn linear_exact(p: &Point3<f64>, _area: usize) -> f64 {
    p.x - 2.0 * p.y + 0.5 * p.z + 1.0
}

fn zero_source(_: &Point3<f64>) -> f64 {
    0.0
}

fn cube_problem(
    cells: usize,
) -> ProblemDefinition<fn(&Point3<f64>, usize) -> f64, fn(&Point3<f64>) -> f64> {
    let mesh = create_unit_box_uniform_tet_mesh(cells).unwrap();
    let boundaries = box_boundary_nodes(&mesh, &Point3::origin(), &Point3::new(1.0, 1.0, 1.0), 1e-12)
        .into_iter()
        .map(|node| DirichletBoundary::new(node, DirichletKind::NeedExact, 1))
        .collect();
    ProblemDefinition {
        mesh,
        basis: Basis::Linear,
        settings: SolverSettings::default(),
        boundaries,
        boundary_values: BoundaryValues::default(),
        exact_solution: linear_exact,
        source: zero_source,
    }
}

fn definition_error<U, F>(definition: ProblemDefinition<U, F>) -> Error
where
    U: Fn(&Point3<f64>, usize) -> f64,
    F: Fn(&Point3<f64>) -> f64,
{
    let err = FemSolver::new(definition).err().expect("definition should be rejected");
    err.root_cause()
        .downcast_ref::<Error>()
        .cloned()
        .expect("root cause should be a shellfem error")
}

#[test]
fn default_settings() {
    let settings = SolverSettings::default();
    assert_eq!(settings.max_iterations, 10_000);
    assert_eq!(settings.tolerance, 1e-12);
    assert_eq!(settings.preconditioner, Preconditioner::IncompleteCholesky);
}

#[test]
fn invalid_definitions_are_rejected() {
    let mut definition = cube_problem(1);
    definition.basis = Basis::Quadratic;
    assert!(matches!(definition_error(definition), Error::InvalidConfiguration(_)));

    let mut definition = cube_problem(1);
    definition
        .boundaries
        .push(DirichletBoundary::new(8, DirichletKind::External, 1));
    assert_eq!(
        definition_error(definition),
        Error::BoundaryNodeOutOfBounds { node: 8, num_nodes: 8 }
    );

    let mut definition = cube_problem(1);
    definition.settings.tolerance = 0.0;
    assert!(matches!(definition_error(definition), Error::InvalidConfiguration(_)));

    let mut definition = cube_problem(1);
    definition.settings.tolerance = f64::NAN;
    assert!(matches!(definition_error(definition), Error::InvalidConfiguration(_)));

    let mut definition = cube_problem(1);
    definition.settings.max_iterations = 0;
    assert!(matches!(definition_error(definition), Error::InvalidConfiguration(_)));
}

#[test]
fn solve_fills_in_boundary_values() {
    let mut solver = FemSolver::new(cube_problem(2)).unwrap();
    assert!(solver.boundaries().iter().all(|b| b.value == 0.0));

    let solution = solver.solve().unwrap();
    assert!(solution.output.converged);
    assert_eq!(solution.values.len(), 27);
    for boundary in solver.boundaries() {
        let point = solver.definition().mesh.points()[boundary.node];
        assert_eq!(boundary.value, linear_exact(&point, 1));
        assert_scalar_eq!(solution.values[boundary.node], boundary.value, comp = abs, tol = 1e-9);
    }
}

#[test]
fn iteration_limit_is_not_an_error() {
    let mesh = create_unit_box_uniform_tet_mesh(3).unwrap();
    let boundaries = vec![DirichletBoundary::new(0, DirichletKind::External, 1)];
    let definition = ProblemDefinition {
        mesh,
        basis: Basis::Linear,
        settings: SolverSettings {
            max_iterations: 1,
            tolerance: 1e-14,
            preconditioner: Preconditioner::None,
        },
        boundaries,
        boundary_values: BoundaryValues::default(),
        exact_solution: |_: &Point3<f64>, _: usize| 0.0,
        source: |p: &Point3<f64>| p.x * p.y + 1.0,
    };
    let solution = FemSolver::new(definition).unwrap().solve().unwrap();
    assert!(!solution.output.converged);
    assert_eq!(solution.output.num_iterations, 1);
}

#[test]
fn degenerate_element_fails_solve() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    let mesh = Mesh::new(points, vec![FiniteElement::new(vec![0, 1, 2, 3], 1, 1.0)]).unwrap();
    let definition = ProblemDefinition {
        mesh,
        basis: Basis::Linear,
        settings: SolverSettings::default(),
        boundaries: Vec::new(),
        boundary_values: BoundaryValues::default(),
        exact_solution: |_: &Point3<f64>, _: usize| 0.0,
        source: |_: &Point3<f64>| 1.0,
    };
    let err = FemSolver::new(definition).unwrap().solve().unwrap_err();
    assert!(matches!(
        err.root_cause().downcast_ref::<Error>(),
        Some(Error::DegenerateElement { element: 0, .. })
    ));
}
