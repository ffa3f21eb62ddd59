use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of weights.
///
/// In a layer's weight matrix, row `i` holds the outgoing weights of input `i`
/// and column `j` the incoming weights of node `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Creates a matrix with every element drawn from `U[-1, 1]`.
    pub fn random<R>(rows: usize, cols: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            rows,
            cols,
            data: (0..rows * cols)
                .map(|_| rng.random_range(-1.0..=1.0))
                .collect(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// All elements in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Computes `inputs · self`.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len()` differs from the number of rows.
    #[must_use]
    pub fn left_mul(&self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(inputs.len(), self.rows, "input length mismatch");
        let mut out = vec![0.0; self.cols];
        for (x, row) in inputs.iter().zip(self.data.chunks_exact(self.cols)) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_left_mul() {
        let mut m = Matrix::zeros(2, 3);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        m.row_mut(1).copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(m.left_mul(&[1.0, 10.0]), vec![41.0, 52.0, 63.0]);
    }

    #[test]
    fn test_random_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(0);
        let m = Matrix::random(7, 8, &mut rng);
        assert_eq!(m.shape(), (7, 8));
        assert!(m.as_slice().iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn test_get_set_addresses_row_major() {
        let mut m = Matrix::zeros(3, 2);
        m.set(2, 1, 9.0);
        assert!((m.get(2, 1) - 9.0).abs() < f32::EPSILON);
        assert!((m.as_slice()[5] - 9.0).abs() < f32::EPSILON);
        assert_eq!(m.row(2), &[0.0, 9.0]);
    }
}
