//! 分割结果评估指标.
//!
//! 单个病例的重叠度量 ([`LabelOverlap`]) 和对称表面距离 ([`SurfaceDistance`])
//! 汇总为 [`CaseMetrics`]; 多个病例的同名指标再汇总为 [`Aggregate`].

use crate::consts::metric::*;
use crate::{CtLabel, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod aggregate;
pub mod edt;
mod overlap;
mod surface;

pub use aggregate::Aggregate;
pub use overlap::{LabelCounts, LabelOverlap};
pub use surface::{label_contour, SurfaceDistance};

/// 单个病例的全部指标.
///
/// 序列化后的键名与 `crate::consts::metric` 中的常量一致.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseMetrics {
    /// Dice 系数.
    #[serde(rename = "DiceCoefficient")]
    pub dice: f64,

    /// Jaccard 系数.
    #[serde(rename = "JaccardCoefficient")]
    pub jaccard: f64,

    /// 体积相似度.
    #[serde(rename = "VolumeSimilarity")]
    pub volume_similarity: f64,

    /// 假阴性误差.
    #[serde(rename = "FalseNegativeError")]
    pub false_negative_error: f64,

    /// 假阳性误差.
    #[serde(rename = "FalsePositiveError")]
    pub false_positive_error: f64,

    /// 平均对称表面距离 (毫米).
    #[serde(rename = "MeanSurfaceDistance")]
    pub mean_surface_distance: Option<f64>,

    /// 对称表面距离中位数 (毫米).
    #[serde(rename = "MedianSurfaceDistance")]
    pub median_surface_distance: Option<f64>,

    /// 对称表面距离标准差 (毫米).
    #[serde(rename = "StdSurfaceDistance")]
    pub std_surface_distance: Option<f64>,

    /// Hausdorff 距离 (毫米).
    #[serde(rename = "HausdorffDistance")]
    pub hausdorff: Option<f64>,

    /// 95% Hausdorff 距离 (毫米).
    #[serde(rename = "HausdorffDistance95")]
    pub hausdorff_95: Option<f64>,

    /// 预测文件名.
    pub pred_fname: String,

    /// 真值文件名.
    pub gt_fname: String,
}

impl CaseMetrics {
    /// 比较真值 `reference` 与预测 `prediction`. 文件名留空.
    ///
    /// 两者形状和体素分辨率必须一致, 否则返回 `Err`.
    pub fn score(reference: &CtLabel, prediction: &CtLabel) -> Result<Self> {
        let overlap = LabelOverlap::compute(reference, prediction)?;
        let surface = SurfaceDistance::compute(reference, prediction)?;
        let total = overlap.total();

        Ok(Self {
            dice: total.dice(),
            jaccard: total.jaccard(),
            volume_similarity: total.volume_similarity(),
            false_negative_error: total.false_negative_error(),
            false_positive_error: total.false_positive_error(),
            mean_surface_distance: surface.mean(),
            median_surface_distance: surface.median(),
            std_surface_distance: surface.std(),
            hausdorff: surface.hausdorff(),
            hausdorff_95: surface.hausdorff_95(),
            pred_fname: String::new(),
            gt_fname: String::new(),
        })
    }

    /// 设置文件名.
    #[inline]
    pub fn with_names(mut self, gt_fname: &str, pred_fname: &str) -> Self {
        self.gt_fname = gt_fname.to_owned();
        self.pred_fname = pred_fname.to_owned();
        self
    }

    /// 所有数值指标名, 顺序与 [`Self::values`] 一致.
    pub const NAMES: [&'static str; 10] = [
        DICE,
        JACCARD,
        VOLUME_SIMILARITY,
        FALSE_NEGATIVE_ERROR,
        FALSE_POSITIVE_ERROR,
        MEAN_SURFACE_DISTANCE,
        MEDIAN_SURFACE_DISTANCE,
        STD_SURFACE_DISTANCE,
        HAUSDORFF,
        HAUSDORFF_95,
    ];

    /// 按 [`Self::NAMES`] 的顺序列出所有数值指标.
    pub fn values(&self) -> [(&'static str, Option<f64>); 10] {
        let values = [
            Some(self.dice),
            Some(self.jaccard),
            Some(self.volume_similarity),
            Some(self.false_negative_error),
            Some(self.false_positive_error),
            self.mean_surface_distance,
            self.median_surface_distance,
            self.std_surface_distance,
            self.hausdorff,
            self.hausdorff_95,
        ];
        std::array::from_fn(|i| (Self::NAMES[i], values[i]))
    }
}

/// 对所有病例的每个数值指标做汇总.
///
/// 结果总是包含全部指标. 没有病例时, 每个指标的汇总都是 `count = 0`.
pub fn aggregate<'a, I>(cases: I) -> BTreeMap<String, Aggregate>
where
    I: IntoIterator<Item = &'a CaseMetrics>,
{
    let mut columns: BTreeMap<&'static str, Vec<Option<f64>>> =
        CaseMetrics::NAMES.iter().map(|n| (*n, Vec::new())).collect();
    for case in cases {
        for (name, value) in case.values() {
            columns.entry(name).or_default().push(value);
        }
    }
    columns
        .into_iter()
        .map(|(name, values)| (name.to_owned(), Aggregate::from_values(values)))
        .collect()
}
