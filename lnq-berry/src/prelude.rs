//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::{BerryError, CtLabel, CtScan, NiftiHeaderAttr};

pub use crate::consts::gray::{BACKGROUND, LYMPH_NODE};

pub use crate::dataset::{self, Case, CaseSet, Manifest};

pub use crate::metrics::{Aggregate, CaseMetrics, LabelOverlap, SurfaceDistance};

pub use crate::threshold::BinaryThreshold;
