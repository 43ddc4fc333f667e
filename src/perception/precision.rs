//! Precision (attention weight) matrices

use serde::Serialize;

/// Per-bin attention weights, shape (n_r, n_theta), row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionMatrix {
    n_r: usize,
    n_theta: usize,
    data: Vec<f32>,
}

impl PrecisionMatrix {
    /// Matrix filled with a constant value
    pub fn filled(n_r: usize, n_theta: usize, value: f32) -> Self {
        Self {
            n_r,
            n_theta,
            data: vec![value; n_r * n_theta],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_r, self.n_theta)
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    pub fn n_theta(&self) -> usize {
        self.n_theta
    }

    #[inline]
    pub fn get(&self, r: usize, t: usize) -> f32 {
        self.data[r * self.n_theta + t]
    }

    #[inline]
    pub fn set(&mut self, r: usize, t: usize, value: f32) {
        self.data[r * self.n_theta + t] = value;
    }

    /// Fill every angular bin of radial row `r`
    pub fn fill_row(&mut self, r: usize, value: f32) {
        let start = r * self.n_theta;
        self.data[start..start + self.n_theta].fill(value);
    }

    /// Multiply every radial bin of angular column `t`
    pub fn scale_column(&mut self, t: usize, factor: f32) {
        for r in 0..self.n_r {
            self.data[r * self.n_theta + t] *= factor;
        }
    }

    /// Multiply the whole matrix
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Logistic function
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
