use rand::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data[0].len(),
            data,
        }
    }

    /// Uniform initialization on `(-r, r)` with `r = 4·sqrt(6 / (fan_in + fan_out))`.
    ///
    /// The variance-scaling range recommended for sigmoid-activated layers.
    /// Shape: (rows, cols). `cols` is the fan-in, `rows` the fan-out.
    pub fn glorot_uniform(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let r = 4.0 * (6.0 / (rows + cols) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = (rng.gen::<f64>() * 2.0 - 1.0) * r;
            }
        }

        res
    }

    /// Extracts column `c` as an owned vector.
    pub fn column(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.data[r][c]).collect()
    }

    /// Matrix–vector product `self · x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        if self.cols != x.len() {
            panic!("Matrix is of incorrect size for product")
        }

        self.data
            .iter()
            .map(|row| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum())
            .collect()
    }

    /// Transposed product `selfᵗ · x`, without materializing the transpose.
    pub fn tr_mul_vec(&self, x: &[f64]) -> Vec<f64> {
        if self.rows != x.len() {
            panic!("Matrix is of incorrect size for transposed product")
        }

        let mut res = vec![0.0; self.cols];
        for (row, xi) in self.data.iter().zip(x.iter()) {
            for (r, w) in res.iter_mut().zip(row.iter()) {
                *r += w * xi;
            }
        }

        res
    }

    /// Sets every element to zero, keeping the allocation.
    pub fn fill_zero(&mut self) {
        for row in &mut self.data {
            for v in row.iter_mut() {
                *v = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glorot_uniform_stays_in_range() {
        let m = Matrix::glorot_uniform(30, 20);
        let r = 4.0 * (6.0_f64 / 50.0).sqrt();
        for row in &m.data {
            for &v in row {
                assert!(v.abs() <= r, "initial weight {v} outside (-{r}, {r})");
            }
        }
    }

    #[test]
    fn mul_vec_matches_hand_result() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(m.mul_vec(&[1.0, 0.5, -1.0]), vec![-1.0, 0.5]);
    }

    #[test]
    fn tr_mul_vec_matches_explicit_transpose() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        // mᵗ is 2×3; mᵗ · [1, 1, 1] = [9, 12]
        assert_eq!(m.tr_mul_vec(&[1.0, 1.0, 1.0]), vec![9.0, 12.0]);
    }

    #[test]
    fn column_walks_rows() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(m.column(0), vec![1.0, 3.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0]);
    }

    #[test]
    fn fill_zero_clears_everything() {
        let mut m = Matrix::from_data(vec![vec![1.0, -2.0], vec![0.5, 9.0]]);
        m.fill_zero();
        assert_eq!(m, Matrix::zeros(2, 2));
    }
}
