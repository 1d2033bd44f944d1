use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// Dense row-major matrix of `f64`.
///
/// Batched activations are stored one sample per row, so a hidden state for a
/// batch of `B` sequences is a `B x H` matrix and weights are `in x out`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Uniform samples in (0, 1] keep ln() finite.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / rows)).
    ///
    /// Shape: (rows, cols). `rows` is the fan-in because weights multiply
    /// row-vector activations from the right.
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (1.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    /// Single-column matrix, one value per row.
    pub fn column(values: &[f64]) -> Matrix {
        Matrix::from_data(values.iter().map(|&v| vec![v]).collect())
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        )
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        self.assert_same_shape(rhs);
        let data = self.data.iter().zip(rhs.data.iter())
            .map(|(row_a, row_b)| {
                row_a.iter().zip(row_b.iter()).map(|(x, y)| x * y).collect()
            })
            .collect();
        Matrix::from_data(data)
    }

    /// Adds a `1 x cols` row to every row (bias broadcast).
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        if row.rows != 1 || row.cols != self.cols {
            panic!("Row vector of size {}x{} cannot broadcast over {}x{}",
                   row.rows, row.cols, self.rows, self.cols)
        }
        Matrix::from_data(
            self.data
                .iter()
                .map(|r| r.iter().zip(row.data[0].iter()).map(|(x, b)| x + b).collect())
                .collect()
        )
    }

    /// Column-wise sum, collapsing the batch dimension into a `1 x cols` row.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in &self.data {
            for (acc, x) in res.data[0].iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        res
    }

    /// In-place `self += rhs`.
    pub fn add_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs);
        for (row_a, row_b) in self.data.iter_mut().zip(rhs.data.iter()) {
            for (a, b) in row_a.iter_mut().zip(row_b.iter()) {
                *a += b;
            }
        }
    }

    /// Clamps every element into `[-limit, limit]`.
    pub fn clip(&mut self, limit: f64) {
        for row in self.data.iter_mut() {
            for x in row.iter_mut() {
                *x = x.clamp(-limit, limit);
            }
        }
    }

    /// Iterates over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.data.iter().flat_map(|row| row.iter())
    }

    /// Mutable row-major iteration over all elements.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        self.data.iter_mut().flat_map(|row| row.iter_mut())
    }

    fn assert_same_shape(&self, rhs: &Matrix) {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes: {}x{} vs {}x{}",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        let mut res = self.clone();
        res.add_assign(rhs);
        res
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes: {}x{} * {}x{}",
                   self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn matmul_matches_hand_computation() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![5.0], vec![6.0]]);
        let c = &a * &b;
        assert_eq!(c, Matrix::from_data(vec![vec![17.0], vec![39.0]]));
    }

    #[test]
    fn bias_broadcast_and_row_sum() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let bias = Matrix::from_data(vec![vec![10.0, 20.0]]);
        let shifted = a.add_row(&bias);
        assert_eq!(shifted.data, vec![vec![11.0, 22.0], vec![13.0, 24.0]]);
        assert_eq!(shifted.sum_rows().data, vec![vec![24.0, 46.0]]);
    }

    #[test]
    fn clip_bounds_every_element() {
        let mut m = Matrix::from_data(vec![vec![-9.0, 0.5, 7.0]]);
        m.clip(1.0);
        assert_eq!(m.data, vec![vec![-1.0, 0.5, 1.0]]);
    }

    #[test]
    fn xavier_is_reproducible_for_a_seed() {
        let a = Matrix::xavier(4, 3, &mut StdRng::seed_from_u64(7));
        let b = Matrix::xavier(4, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!((a.rows, a.cols), (4, 3));
        assert!(a.iter().any(|&x| x != 0.0));
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn mismatched_product_panics() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        let _ = &a * &b;
    }
}
