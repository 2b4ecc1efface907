//! Local shape descriptors for shape-aware DTW.
//!
//! Every index `i` of a sequence is described by the window `[i - w, i + w]`
//! (length `2w + 1`). Indices that fall outside the sequence are clamped to
//! the nearest valid index, so the first and last samples are replicated at
//! the edges. The window is then mapped through a [`ShapeDescriptor`].

use crate::error::{Result, SignatureError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_PAA_PIECE_WIDTH: usize = 2;
pub const DEFAULT_DWT_LEVELS: usize = 3;
pub const DEFAULT_SLOPE_PIECE_WIDTH: usize = 5;
/// Longest descriptor window (`2w + 1`) accepted by [`describe`].
pub const MAX_WINDOW_LEN: usize = 1 << 16;

/// Maps a fixed-length subsequence window to a descriptor vector.
///
/// `transform` must return exactly `dimension(window.len())` values, otherwise
/// descriptors of different indices are not comparable.
pub trait ShapeDescriptor: Send + Sync + fmt::Debug {
    fn kind(&self) -> &str;

    /// Length of the descriptor of a window of `window_len` samples.
    fn dimension(&self, window_len: usize) -> usize;

    fn transform(&self, window: &[f64]) -> Vec<f64>;

    /// Append the descriptor of `window` to `out`.
    fn transform_into(&self, window: &[f64], out: &mut Vec<f64>) {
        out.extend(self.transform(window));
    }
}

/// The closed set of built-in descriptor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeDescriptorKind {
    /// The window itself.
    #[default]
    Raw,
    /// Piecewise aggregate approximation: mean of consecutive chunks.
    Paa { piece_width: usize },
    /// Multi-level Haar wavelet coefficients.
    Dwt { levels: usize },
    /// Least-squares slope of consecutive chunks.
    Slope { piece_width: usize },
    /// Keogh-style first derivative.
    Derivative,
}

impl ShapeDescriptorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Paa { .. } => "paa",
            Self::Dwt { .. } => "dwt",
            Self::Slope { .. } => "slope",
            Self::Derivative => "derivative",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Paa { piece_width } | Self::Slope { piece_width } if piece_width == 0 => Err(
                SignatureError::Configuration(format!("{} descriptor needs a piece width of at least 1", self.name())),
            ),
            Self::Dwt { levels } if levels == 0 => Err(SignatureError::Configuration(
                "dwt descriptor needs at least one decomposition level".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Build the descriptor implementation for this kind.
    pub fn build(&self) -> Result<Arc<dyn ShapeDescriptor>> {
        self.validate()?;
        let descriptor: Arc<dyn ShapeDescriptor> = match *self {
            Self::Raw => Arc::new(RawSubsequence),
            Self::Paa { piece_width } => Arc::new(PiecewiseAggregate { piece_width }),
            Self::Dwt { levels } => Arc::new(HaarWavelet { levels }),
            Self::Slope { piece_width } => Arc::new(PiecewiseSlope { piece_width }),
            Self::Derivative => Arc::new(Derivative),
        };
        Ok(descriptor)
    }
}

impl fmt::Display for ShapeDescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeDescriptorKind {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "paa" => Ok(Self::Paa { piece_width: DEFAULT_PAA_PIECE_WIDTH }),
            "dwt" => Ok(Self::Dwt { levels: DEFAULT_DWT_LEVELS }),
            "slope" => Ok(Self::Slope { piece_width: DEFAULT_SLOPE_PIECE_WIDTH }),
            "derivative" => Ok(Self::Derivative),
            other => Err(SignatureError::Configuration(format!(
                "unsupported shape descriptor kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawSubsequence;

impl ShapeDescriptor for RawSubsequence {
    fn kind(&self) -> &str {
        "raw"
    }

    fn dimension(&self, window_len: usize) -> usize {
        window_len
    }

    fn transform(&self, window: &[f64]) -> Vec<f64> {
        window.to_vec()
    }

    fn transform_into(&self, window: &[f64], out: &mut Vec<f64>) {
        out.extend_from_slice(window);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PiecewiseAggregate {
    pub piece_width: usize,
}

impl ShapeDescriptor for PiecewiseAggregate {
    fn kind(&self) -> &str {
        "paa"
    }

    fn dimension(&self, window_len: usize) -> usize {
        window_len.div_ceil(self.piece_width.max(1))
    }

    fn transform(&self, window: &[f64]) -> Vec<f64> {
        window
            .chunks(self.piece_width.max(1))
            .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HaarWavelet {
    pub levels: usize,
}

impl ShapeDescriptor for HaarWavelet {
    fn kind(&self) -> &str {
        "dwt"
    }

    fn dimension(&self, window_len: usize) -> usize {
        let mut approx = window_len;
        let mut details = 0;
        for _ in 0..self.levels {
            if approx < 2 {
                break;
            }
            approx = approx.div_ceil(2);
            details += approx;
        }
        approx + details
    }

    /// Output layout is `[cA_L, cD_L, ..., cD_1]`.
    fn transform(&self, window: &[f64]) -> Vec<f64> {
        let mut approx = window.to_vec();
        let mut details: Vec<Vec<f64>> = Vec::with_capacity(self.levels);

        for _ in 0..self.levels {
            if approx.len() < 2 {
                break;
            }
            if approx.len() % 2 == 1 {
                // odd length: replicate the last sample
                let last = approx[approx.len() - 1];
                approx.push(last);
            }
            let (next, detail): (Vec<f64>, Vec<f64>) = approx
                .chunks_exact(2)
                .map(|pair| {
                    (
                        (pair[0] + pair[1]) * std::f64::consts::FRAC_1_SQRT_2,
                        (pair[0] - pair[1]) * std::f64::consts::FRAC_1_SQRT_2,
                    )
                })
                .unzip();
            details.push(detail);
            approx = next;
        }

        let mut out = approx;
        for detail in details.into_iter().rev() {
            out.extend(detail);
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PiecewiseSlope {
    pub piece_width: usize,
}

impl ShapeDescriptor for PiecewiseSlope {
    fn kind(&self) -> &str {
        "slope"
    }

    fn dimension(&self, window_len: usize) -> usize {
        window_len.div_ceil(self.piece_width.max(1))
    }

    fn transform(&self, window: &[f64]) -> Vec<f64> {
        window
            .chunks(self.piece_width.max(1))
            .map(least_squares_slope)
            .collect()
    }
}

fn least_squares_slope(ys: &[f64]) -> f64 {
    if ys.len() < 2 {
        return 0.0;
    }
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;
    let (num, den) = ys.iter().enumerate().fold((0.0, 0.0), |(num, den), (x, &y)| {
        let dx = x as f64 - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    num / den
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Derivative;

impl ShapeDescriptor for Derivative {
    fn kind(&self) -> &str {
        "derivative"
    }

    fn dimension(&self, window_len: usize) -> usize {
        window_len
    }

    fn transform(&self, window: &[f64]) -> Vec<f64> {
        let len = window.len();
        if len < 3 {
            return vec![0.0; len];
        }
        let mut out = vec![0.0; len];
        for i in 1..len - 1 {
            out[i] = ((window[i] - window[i - 1]) + (window[i + 1] - window[i - 1]) / 2.0) / 2.0;
        }
        out[0] = out[1];
        out[len - 1] = out[len - 2];
        out
    }
}

/// Descriptors of every index of a sequence, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSequence {
    data: Vec<f64>,
    dimension: usize,
    len: usize,
}

impl DescriptorSequence {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn get(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dimension.max(1)).take(self.len)
    }
}

/// Describe every index of `sequence` with edge-replicated windows of half-width `half_width`.
pub fn describe(
    descriptor: &dyn ShapeDescriptor,
    sequence: &[f64],
    half_width: usize,
) -> Result<DescriptorSequence> {
    if sequence.is_empty() {
        return Err(SignatureError::InvalidInput(
            "cannot describe an empty sequence".to_string(),
        ));
    }

    let len = sequence.len();
    let last = len - 1;
    let window_len = half_width
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(1))
        .filter(|&window_len| window_len <= MAX_WINDOW_LEN)
        .ok_or_else(|| {
            SignatureError::InvalidInput(format!(
                "half-width {half_width} exceeds the {MAX_WINDOW_LEN} sample window limit"
            ))
        })?;

    let dimension = descriptor.dimension(window_len);
    if dimension == 0 {
        return Err(SignatureError::Configuration(format!(
            "{} descriptor produces an empty vector for {window_len} samples",
            descriptor.kind()
        )));
    }
    let capacity = dimension.checked_mul(len).ok_or_else(|| {
        SignatureError::InvalidInput(format!(
            "{len} descriptors of dimension {dimension} do not fit in memory"
        ))
    })?;

    let mut window = vec![0.0; window_len];
    let mut data = Vec::new();
    data.try_reserve_exact(capacity).map_err(|_| {
        SignatureError::InvalidInput(format!(
            "cannot allocate {len} descriptors of dimension {dimension}"
        ))
    })?;

    for i in 0..len {
        for (k, slot) in window.iter_mut().enumerate() {
            let idx = (i + k).saturating_sub(half_width).min(last);
            *slot = sequence[idx];
        }

        let before = data.len();
        descriptor.transform_into(&window, &mut data);
        let produced = data.len() - before;

        if produced != dimension {
            return Err(SignatureError::Configuration(format!(
                "{} descriptor produced {} values at index {}, expected {}",
                descriptor.kind(),
                produced,
                i,
                dimension
            )));
        }
    }

    Ok(DescriptorSequence { data, dimension, len })
}
