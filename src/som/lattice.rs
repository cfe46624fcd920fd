//! The trainable lattice: node table, BMU search and the online update rule.

use crate::config::LatticeConfig;
use crate::error::{Result, SomError};
use crate::som::grid;
use crate::som::schedule::{gaussian, Schedule};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, Zip};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A Self-Organizing Map over a square lattice.
///
/// The lattice owns an ordered teacher set and an `N² x D` node table whose
/// rows are the prototypes of the grid positions in raster order. Each call to
/// [`Lattice::train`] sweeps the teachers once, pulling every prototype toward
/// the current teacher with a strength that falls off with grid distance from
/// the best matching unit.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// Grid dimension (grid is dimension x dimension).
    dimension: usize,
    /// Training inputs, one per row.
    teachers: Array2<f64>,
    /// Grid coordinates of every node, `(row, col)` per row.
    coords: Array2<usize>,
    /// Node prototypes, one per row.
    nodes: Array2<f64>,
    schedule: Schedule,
    passes: usize,
}

impl Lattice {
    /// Creates a lattice for the given teacher vectors.
    ///
    /// Initial prototypes come from a ChaCha8 stream seeded from
    /// `config.seed`, or from entropy when no seed is set.
    pub fn new<T: AsRef<[f64]>>(teachers: &[T], config: &LatticeConfig) -> Result<Self> {
        let teachers = teacher_matrix(teachers)?;
        Self::from_array(teachers, config)
    }

    /// Creates a lattice from a teacher matrix with one teacher per row.
    pub fn from_array(teachers: Array2<f64>, config: &LatticeConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::build(teachers, config.dimension, &mut rng)
    }

    /// Creates a lattice drawing its initial prototypes from `rng`.
    pub fn with_rng<T: AsRef<[f64]>, R: Rng>(
        teachers: &[T],
        dimension: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let teachers = teacher_matrix(teachers)?;
        Self::build(teachers, dimension, rng)
    }

    fn build<R: Rng>(teachers: Array2<f64>, dimension: usize, rng: &mut R) -> Result<Self> {
        if dimension == 0 {
            return Err(SomError::InvalidDimension(dimension));
        }
        let total = dimension
            .checked_mul(dimension)
            .ok_or_else(|| SomError::InvalidInput(format!("lattice dimension {} overflows", dimension)))?;
        validate_teachers(&teachers)?;

        let weight_dim = teachers.ncols();
        let coords = grid::coordinate_table(dimension);

        let mut nodes = Array2::from_shape_simple_fn((total, weight_dim), || rng.gen::<f64>());

        // Match the overall mean of the teachers.
        let node_mean = nodes.mean().unwrap_or(0.0);
        if node_mean == 0.0 || !node_mean.is_finite() {
            return Err(SomError::DegenerateInitialization { mean: node_mean });
        }
        let teacher_mean = teachers.mean().unwrap_or(0.0);
        nodes *= teacher_mean / node_mean;

        let schedule = Schedule::new(teachers.nrows(), dimension);

        info!(
            "Initialized {}x{} lattice: {} nodes, {} dims, {} teachers",
            dimension,
            dimension,
            total,
            weight_dim,
            teachers.nrows()
        );

        Ok(Self {
            dimension,
            teachers,
            coords,
            nodes,
            schedule,
            passes: 0,
        })
    }

    /// Returns the grid dimension `N`.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the total number of nodes (`N²`).
    #[inline]
    pub fn total_nodes(&self) -> usize {
        self.nodes.nrows()
    }

    /// Returns the prototype dimensionality `D`.
    #[inline]
    pub fn weight_dim(&self) -> usize {
        self.nodes.ncols()
    }

    /// Returns the number of teachers.
    #[inline]
    pub fn n_teacher(&self) -> usize {
        self.teachers.nrows()
    }

    /// Returns the number of completed training passes.
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Returns the teacher matrix.
    pub fn teachers(&self) -> &Array2<f64> {
        &self.teachers
    }

    /// Returns the `N² x 2` coordinate table.
    pub fn coordinates(&self) -> &Array2<usize> {
        &self.coords
    }

    /// Returns the `N² x D` node table.
    pub fn nodes(&self) -> &Array2<f64> {
        &self.nodes
    }

    /// Consumes the lattice and returns its node table.
    pub fn into_nodes(self) -> Array2<f64> {
        self.nodes
    }

    /// Returns the decay schedules used by this lattice.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Gets the prototype at a grid position.
    pub fn node_at(&self, row: usize, col: usize) -> Option<ArrayView1<'_, f64>> {
        if row < self.dimension && col < self.dimension {
            Some(self.nodes.row(grid::coords_to_index(row, col, self.dimension)))
        } else {
            None
        }
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.weight_dim() {
            return Err(SomError::DimensionMismatch {
                expected: self.weight_dim(),
                found: input.len(),
            });
        }
        if input.iter().any(|x| !x.is_finite()) {
            return Err(SomError::InvalidInput(
                "input vector contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    /// Finds the flat index of the Best Matching Unit for an input vector.
    ///
    /// Ties resolve to the lowest index.
    pub fn best_matching_index(&self, input: &[f64]) -> Result<usize> {
        self.check_input(input)?;
        Ok(find_bmu(&self.nodes, ArrayView1::from(input)))
    }

    /// Finds the grid position of the Best Matching Unit for an input vector.
    pub fn best_matching_unit(&self, input: &[f64]) -> Result<(usize, usize)> {
        let index = self.best_matching_index(input)?;
        Ok(grid::index_to_coords(index, self.dimension))
    }

    /// Computes every prototype's dot product with an input vector.
    pub fn output_layer(&self, input: &[f64]) -> Result<Array1<f64>> {
        self.check_input(input)?;
        Ok(self.nodes.dot(&ArrayView1::from(input)))
    }

    /// Mean Euclidean distance between each teacher and its BMU prototype.
    pub fn quantization_error(&self) -> f64 {
        let total: f64 = self
            .teachers
            .outer_iter()
            .map(|teacher| {
                let bmu = find_bmu(&self.nodes, teacher);
                euclidean(self.nodes.row(bmu), teacher)
            })
            .sum();
        total / self.n_teacher() as f64
    }

    /// Applies one online update for `teacher` at step `t` around `bmu`.
    pub fn update(&mut self, teacher: &[f64], t: usize, bmu: (usize, usize)) -> Result<()> {
        self.check_input(teacher)?;
        if bmu.0 >= self.dimension || bmu.1 >= self.dimension {
            return Err(SomError::InvalidInput(format!(
                "BMU ({}, {}) outside {}x{} lattice",
                bmu.0, bmu.1, self.dimension, self.dimension
            )));
        }
        update_nodes(
            &mut self.nodes,
            &self.coords,
            ArrayView1::from(teacher),
            self.schedule.learning_rate(t),
            self.schedule.radius(t),
            bmu,
        );
        Ok(())
    }

    /// Runs one pass over the teachers in order and returns the node table.
    ///
    /// The step index restarts at 0 on every call.
    pub fn train(&mut self) -> &Array2<f64> {
        let Self {
            dimension,
            teachers,
            coords,
            nodes,
            schedule,
            passes,
        } = self;

        for (t, teacher) in teachers.outer_iter().enumerate() {
            let bmu = grid::index_to_coords(find_bmu(nodes, teacher), *dimension);
            update_nodes(
                nodes,
                coords,
                teacher,
                schedule.learning_rate(t),
                schedule.radius(t),
                bmu,
            );
        }
        *passes += 1;

        let last = teachers.nrows() - 1;
        debug!(
            "Pass {} complete: lr={:.6}, radius={:.4}",
            passes,
            schedule.learning_rate(last),
            schedule.radius(last)
        );

        &self.nodes
    }
}

/// Converts rows of teacher vectors into a dense matrix, rejecting ragged input.
fn teacher_matrix<T: AsRef<[f64]>>(teachers: &[T]) -> Result<Array2<f64>> {
    let first = teachers
        .first()
        .ok_or_else(|| SomError::EmptyInput("teacher set is empty".to_string()))?;
    let dim = first.as_ref().len();

    let mut flat = Vec::with_capacity(teachers.len() * dim);
    for (row, teacher) in teachers.iter().enumerate() {
        let teacher = teacher.as_ref();
        if teacher.len() != dim {
            return Err(SomError::RaggedTeachers {
                row,
                expected: dim,
                found: teacher.len(),
            });
        }
        flat.extend_from_slice(teacher);
    }

    Array2::from_shape_vec((teachers.len(), dim), flat)
        .map_err(|e| SomError::InvalidInput(e.to_string()))
}

fn validate_teachers(teachers: &Array2<f64>) -> Result<()> {
    if teachers.nrows() == 0 {
        return Err(SomError::EmptyInput("teacher set is empty".to_string()));
    }
    if teachers.ncols() == 0 {
        return Err(SomError::EmptyInput("teacher vectors have no components".to_string()));
    }
    if let Some(((row, col), _)) = teachers.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(SomError::NonFiniteTeacher { row, col });
    }
    Ok(())
}

#[inline]
fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Arg-min of the Euclidean distance over the node table, first index on ties.
fn find_bmu(nodes: &Array2<f64>, input: ArrayView1<f64>) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;

    for (i, node) in nodes.outer_iter().enumerate() {
        let dist = euclidean(node, input);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

/// `node += rate * S(d) * (teacher - node)` for every row of the table.
fn update_nodes(
    nodes: &mut Array2<f64>,
    coords: &Array2<usize>,
    teacher: ArrayView1<f64>,
    rate: f64,
    radius: f64,
    bmu: (usize, usize),
) {
    let influence: Array1<f64> = coords
        .outer_iter()
        .map(|c| rate * gaussian(grid::grid_distance((c[0], c[1]), bmu), radius))
        .collect();

    Zip::from(nodes.rows_mut())
        .and(&influence)
        .for_each(|mut node, &h| {
            node.zip_mut_with(&teacher, |w, &x| *w += h * (x - *w));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn colors() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![0.00001, 0.00001, 0.00001],
        ]
    }

    fn seeded(dimension: usize) -> LatticeConfig {
        LatticeConfig::new(dimension, Some(42))
    }

    #[test]
    fn test_lattice_creation() {
        let lattice = Lattice::new(&colors(), &seeded(8)).unwrap();

        assert_eq!(lattice.dimension(), 8);
        assert_eq!(lattice.total_nodes(), 64);
        assert_eq!(lattice.weight_dim(), 3);
        assert_eq!(lattice.n_teacher(), 5);
        assert_eq!(lattice.nodes().dim(), (64, 3));
        assert_eq!(lattice.coordinates().dim(), (64, 2));
        assert_eq!(lattice.passes(), 0);
    }

    #[test]
    fn test_node_positions() {
        let lattice = Lattice::new(&colors(), &seeded(6)).unwrap();

        for i in 0..lattice.total_nodes() {
            let c = lattice.coordinates().row(i);
            assert_eq!(c[0], i / 6);
            assert_eq!(c[1], i % 6);
        }
    }

    #[test]
    fn test_mean_rescale() {
        let teachers = vec![vec![0.2, 0.4], vec![0.6, 0.8], vec![0.1, 0.3]];
        let lattice = Lattice::new(&teachers, &seeded(5)).unwrap();

        let teacher_mean = lattice.teachers().mean().unwrap();
        let node_mean = lattice.nodes().mean().unwrap();
        assert!((teacher_mean - node_mean).abs() < 1e-10);
    }

    #[test]
    fn test_injected_rng_initialization() {
        let teachers = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        // Draws 0.25 then 0.5; rescaled from mean 0.375 to the teacher mean 0.5.
        let mut rng = StepRng::new(1 << 62, 1 << 62);
        let lattice = Lattice::with_rng(&teachers, 1, &mut rng).unwrap();

        assert!((lattice.nodes()[[0, 0]] - 1.0 / 3.0).abs() < 1e-10);
        assert!((lattice.nodes()[[0, 1]] - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_initialization() {
        let mut rng = StepRng::new(0, 0);
        let result = Lattice::with_rng(&colors(), 4, &mut rng);
        assert!(matches!(
            result,
            Err(SomError::DegenerateInitialization { mean }) if mean == 0.0
        ));
    }

    #[test]
    fn test_invalid_teachers() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(
            Lattice::new(&empty, &seeded(4)),
            Err(SomError::EmptyInput(_))
        ));

        let ragged = vec![vec![1.0, 0.0], vec![0.0, 1.0, 0.5]];
        assert!(matches!(
            Lattice::new(&ragged, &seeded(4)),
            Err(SomError::RaggedTeachers { row: 1, expected: 2, found: 3 })
        ));

        let hollow = vec![Vec::<f64>::new(), Vec::new()];
        assert!(matches!(
            Lattice::new(&hollow, &seeded(4)),
            Err(SomError::EmptyInput(_))
        ));

        let nan = vec![vec![1.0, 0.0], vec![0.0, f64::NAN]];
        assert!(matches!(
            Lattice::new(&nan, &seeded(4)),
            Err(SomError::NonFiniteTeacher { row: 1, col: 1 })
        ));
    }

    #[test]
    fn test_zero_dimension() {
        let result = Lattice::new(&colors(), &seeded(0));
        assert!(matches!(result, Err(SomError::InvalidDimension(0))));
    }

    #[test]
    fn test_find_bmu() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        lattice.nodes.fill(0.0);
        lattice.nodes.row_mut(5).assign(&ndarray::arr1(&[1.0, 0.0, 0.0]));

        assert_eq!(lattice.best_matching_index(&[1.0, 0.0, 0.0]).unwrap(), 5);
        assert_eq!(lattice.best_matching_unit(&[1.0, 0.0, 0.0]).unwrap(), (1, 1));
    }

    #[test]
    fn test_bmu_ties_resolve_to_lowest_index() {
        let mut lattice = Lattice::new(&colors(), &seeded(3)).unwrap();
        lattice.nodes.fill(0.5);

        assert_eq!(lattice.best_matching_index(&[0.1, 0.2, 0.3]).unwrap(), 0);

        lattice.nodes.row_mut(4).fill(0.2);
        lattice.nodes.row_mut(7).fill(0.2);
        assert_eq!(lattice.best_matching_unit(&[0.2, 0.2, 0.2]).unwrap(), (1, 1));
    }

    #[test]
    fn test_bmu_of_existing_prototype() {
        let lattice = Lattice::new(&colors(), &seeded(5)).unwrap();

        for i in [0, 7, 24] {
            let input = lattice.nodes().row(i).to_vec();
            let bmu = lattice.best_matching_index(&input).unwrap();
            let best = euclidean(lattice.nodes().row(bmu), ArrayView1::from(&input[..]));
            assert_eq!(best, 0.0);
            assert!(bmu <= i);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        let before = lattice.nodes().clone();

        assert!(matches!(
            lattice.best_matching_unit(&[1.0, 0.0]),
            Err(SomError::DimensionMismatch { expected: 3, found: 2 })
        ));
        assert!(lattice.output_layer(&[1.0]).is_err());
        assert!(lattice.best_matching_unit(&[f64::NAN, 0.0, 0.0]).is_err());
        assert_eq!(lattice.nodes(), &before);
    }

    #[test]
    fn test_update_rejects_bad_input_without_mutation() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        let before = lattice.nodes().clone();

        assert!(lattice.update(&[1.0, 0.0], 0, (0, 0)).is_err());
        assert!(lattice.update(&[1.0, 0.0, 0.0], 0, (4, 0)).is_err());
        assert_eq!(lattice.nodes(), &before);
    }

    #[test]
    fn test_update_moves_toward_teacher() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        let before = lattice.nodes().clone();
        let teacher = [0.9, 0.1, 0.4];

        lattice.update(&teacher, 0, (1, 2)).unwrap();

        for (old, new) in before.outer_iter().zip(lattice.nodes().outer_iter()) {
            // new = old + k (teacher - old) with one shared k in (0, 0.1]
            let k = (new[0] - old[0]) / (teacher[0] - old[0]);
            assert!(k > 0.0 && k <= 0.1 + 1e-12);
            for j in 0..3 {
                let expected = old[j] + k * (teacher[j] - old[j]);
                assert!((new[j] - expected).abs() < 1e-10);
                assert!((teacher[j] - new[j]).abs() <= (teacher[j] - old[j]).abs());
            }
        }
    }

    #[test]
    fn test_update_bmu_gets_full_rate() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        lattice.nodes.fill(0.0);

        lattice.update(&[1.0, 1.0, 1.0], 0, (0, 0)).unwrap();

        assert!((lattice.nodes()[[0, 0]] - 0.1).abs() < 1e-10);
        // Neighbour at grid distance 1 with sigma 2.
        let expected = 0.1 * (-1.0f64 / 8.0).exp();
        assert!((lattice.nodes()[[1, 0]] - expected).abs() < 1e-10);
        assert!(lattice.nodes()[[15, 0]] < lattice.nodes()[[1, 0]]);
    }

    #[test]
    fn test_update_far_step_stays_finite() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        lattice.update(&[1.0, 1.0, 1.0], 1_000_000, (0, 0)).unwrap();
        assert!(lattice.nodes().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_train_returns_nodes() {
        let mut lattice = Lattice::new(&colors(), &seeded(4)).unwrap();
        let before = lattice.nodes().clone();

        let trained = lattice.train().clone();
        assert_eq!(trained.dim(), (16, 3));
        assert_ne!(trained, before);
        assert_eq!(lattice.passes(), 1);
    }

    #[test]
    fn test_train_matches_manual_steps() {
        let teachers = colors();
        let mut trained = Lattice::new(&teachers, &seeded(4)).unwrap();
        let mut manual = trained.clone();

        trained.train();
        for (t, teacher) in teachers.iter().enumerate() {
            let bmu = manual.best_matching_unit(teacher).unwrap();
            manual.update(teacher, t, bmu).unwrap();
        }

        assert_eq!(trained.nodes(), manual.nodes());
    }

    #[test]
    fn test_output_layer() {
        let mut lattice = Lattice::new(&colors(), &seeded(2)).unwrap();
        lattice.nodes.fill(1.0);
        lattice.nodes.row_mut(3).assign(&ndarray::arr1(&[1.0, 2.0, 3.0]));

        let out = lattice.output_layer(&[1.0, 0.0, 1.0]).unwrap();
        assert_eq!(out.len(), 4);
        assert!((out[0] - 2.0).abs() < 1e-10);
        assert!((out[3] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_quantization_error_decreases() {
        let cycle = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
        let teachers: Vec<Vec<f64>> = (0..100).map(|i| cycle[i % 4].to_vec()).collect();
        let mut lattice = Lattice::new(&teachers, &seeded(4)).unwrap();

        let before = lattice.quantization_error();
        for _ in 0..5 {
            lattice.train();
        }
        assert!(lattice.quantization_error() < 0.75 * before);
    }

    #[test]
    fn test_node_at() {
        let lattice = Lattice::new(&colors(), &seeded(3)).unwrap();
        assert_eq!(lattice.node_at(2, 1).unwrap(), lattice.nodes().row(7));
        assert!(lattice.node_at(3, 0).is_none());
    }
}
