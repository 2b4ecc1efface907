pub mod aligner;
pub mod descriptor;
pub mod metric;

pub use aligner::{DistanceResult, ShapeDtw, WarpingPath};
pub use descriptor::{describe, DescriptorSequence, ShapeDescriptor, ShapeDescriptorKind};
pub use metric::PointMetric;
