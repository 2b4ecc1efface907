// src/dtw/aligner.rs

//! Shape-aware dynamic time warping.
//!
//! The local cost of aligning `a[i]` with `b[j]` is the point metric between
//! the shape descriptors of their neighbourhoods, not between the raw values.
//! The accumulated cost follows the standard three-neighbour recurrence:
//!
//! ```text
//! D[0][0] = C[0][0]
//! D[i][0] = D[i-1][0] + C[i][0]
//! D[0][j] = D[0][j-1] + C[0][j]
//! D[i][j] = C[i][j] + min(D[i-1][j], D[i][j-1], D[i-1][j-1])
//! ```

use crate::dtw::descriptor::{describe, DescriptorSequence, ShapeDescriptor, ShapeDescriptorKind};
use crate::dtw::metric::PointMetric;
use crate::error::{Result, SignatureError};
use log::debug;
use std::sync::Arc;

pub const DEFAULT_SUBSEQUENCE_HALF_WIDTH: usize = 15;
/// Upper bound on either input length; keeps the DP table bounded.
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 16_384;

/// Monotone, continuous alignment from `(0, 0)` to `(n - 1, m - 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarpingPath {
    steps: Vec<(usize, usize)>,
}

impl WarpingPath {
    pub fn steps(&self) -> &[(usize, usize)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of aligning two sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceResult {
    /// Accumulated cost `D[n-1][m-1]`.
    pub distance: f64,
    /// `distance / (n + m)`.
    pub normalized_distance: f64,
    pub path: Option<WarpingPath>,
}

#[derive(Debug, Clone)]
pub struct ShapeDtw {
    descriptor: Arc<dyn ShapeDescriptor>,
    metric: PointMetric,
    half_width: usize,
    band: Option<usize>,
    max_sequence_len: usize,
}

impl ShapeDtw {
    pub fn new(kind: ShapeDescriptorKind, metric: PointMetric, half_width: usize) -> Result<Self> {
        Ok(Self::with_descriptor(kind.build()?, metric, half_width))
    }

    /// Use a custom descriptor implementation.
    pub fn with_descriptor(descriptor: Arc<dyn ShapeDescriptor>, metric: PointMetric, half_width: usize) -> Self {
        Self {
            descriptor,
            metric,
            half_width,
            band: None,
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
        }
    }

    /// Restrict alignment to a Sakoe-Chiba band of the given radius.
    ///
    /// The effective radius is never smaller than the length difference of the
    /// two inputs, so the end cell is always reachable.
    pub fn with_band(mut self, band: Option<usize>) -> Self {
        self.band = band;
        self
    }

    pub fn with_max_sequence_len(mut self, max_sequence_len: usize) -> Self {
        self.max_sequence_len = max_sequence_len;
        self
    }

    pub fn descriptor_kind(&self) -> &str {
        self.descriptor.kind()
    }

    pub fn metric(&self) -> PointMetric {
        self.metric
    }

    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Shape-DTW distance between `a` and `b`.
    ///
    /// Runs in O(n·m) time with two rolling rows sized to the shorter input.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        let (da, db) = self.prepare(a, b)?;
        // the recurrence is symmetric under transposition, keep the short side in the row
        let (rows, cols) = if db.len() <= da.len() { (&da, &db) } else { (&db, &da) };
        let (n, m) = (rows.len(), cols.len());
        let radius = self.radius(n, m);

        let mut prev = vec![f64::INFINITY; m];
        let mut cur = vec![f64::INFINITY; m];

        for i in 0..n {
            let (lo, hi) = column_range(i, m, radius);
            cur.fill(f64::INFINITY);
            let row = rows.get(i);
            for j in lo..=hi {
                let cost = self.metric.distance(row, cols.get(j));
                let best = if i == 0 && j == 0 {
                    0.0
                } else {
                    let up = if i > 0 { prev[j] } else { f64::INFINITY };
                    let left = if j > 0 { cur[j - 1] } else { f64::INFINITY };
                    let diag = if i > 0 && j > 0 { prev[j - 1] } else { f64::INFINITY };
                    up.min(left).min(diag)
                };
                cur[j] = cost + best;
            }
            std::mem::swap(&mut prev, &mut cur);
        }

        finite_distance(prev[m - 1])
    }

    /// Align `a` and `b`, keeping the full table to recover the warping path.
    pub fn align(&self, a: &[f64], b: &[f64]) -> Result<DistanceResult> {
        let (da, db) = self.prepare(a, b)?;
        let (n, m) = (da.len(), db.len());
        let radius = self.radius(n, m);
        let mut table = vec![f64::INFINITY; n * m];

        for i in 0..n {
            let (lo, hi) = column_range(i, m, radius);
            let row = da.get(i);
            for j in lo..=hi {
                let cost = self.metric.distance(row, db.get(j));
                let best = if i == 0 && j == 0 {
                    0.0
                } else {
                    let up = if i > 0 { table[(i - 1) * m + j] } else { f64::INFINITY };
                    let left = if j > 0 { table[i * m + j - 1] } else { f64::INFINITY };
                    let diag = if i > 0 && j > 0 { table[(i - 1) * m + j - 1] } else { f64::INFINITY };
                    up.min(left).min(diag)
                };
                table[i * m + j] = cost + best;
            }
        }

        let distance = finite_distance(table[n * m - 1])?;
        let path = backtrack(&table, n, m);
        debug!("shape-dtw aligned {}x{} with path length {}", n, m, path.len());

        Ok(DistanceResult {
            distance,
            normalized_distance: distance / (n + m) as f64,
            path: Some(path),
        })
    }

    fn prepare(&self, a: &[f64], b: &[f64]) -> Result<(DescriptorSequence, DescriptorSequence)> {
        for (name, seq) in [("first", a), ("second", b)] {
            if seq.is_empty() {
                return Err(SignatureError::InvalidInput(format!("{name} sequence is empty")));
            }
            if seq.len() > self.max_sequence_len {
                return Err(SignatureError::InvalidInput(format!(
                    "{name} sequence has {} samples, limit is {}",
                    seq.len(),
                    self.max_sequence_len
                )));
            }
            if let Some(pos) = seq.iter().position(|v| !v.is_finite()) {
                return Err(SignatureError::InvalidInput(format!(
                    "{name} sequence has a non-finite value at index {pos}"
                )));
            }
        }

        let da = describe(self.descriptor.as_ref(), a, self.half_width)?;
        let db = describe(self.descriptor.as_ref(), b, self.half_width)?;
        Ok((da, db))
    }

    fn radius(&self, n: usize, m: usize) -> Option<usize> {
        self.band.map(|band| band.max(n.abs_diff(m)))
    }
}

fn column_range(i: usize, m: usize, radius: Option<usize>) -> (usize, usize) {
    match radius {
        Some(r) => (i.saturating_sub(r), (i + r).min(m - 1)),
        None => (0, m - 1),
    }
}

fn finite_distance(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SignatureError::InvalidInput(format!("alignment cost is not finite: {value}")))
    }
}

/// Walk back from the end cell; ties prefer diagonal, then vertical, then horizontal.
fn backtrack(table: &[f64], n: usize, m: usize) -> WarpingPath {
    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n - 1, m - 1);
    steps.push((i, j));

    while i > 0 || j > 0 {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = table[(i - 1) * m + j - 1];
            let up = table[(i - 1) * m + j];
            let left = table[i * m + j - 1];
            if diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        steps.push((i, j));
    }

    steps.reverse();
    WarpingPath { steps }
}
