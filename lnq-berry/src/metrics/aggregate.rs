//! 跨病例的指标汇总.

use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// 单个指标在所有病例上的汇总统计.
///
/// 无定义 (`None`) 的病例值不参与汇总. 若没有任何有定义的值, `count` 为 0,
/// 其余统计量均为 `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// 算术平均值.
    pub mean: Option<f64>,

    /// 样本标准差 (n - 1). 少于两个值时为 `None`.
    pub std: Option<f64>,

    /// 最小值.
    pub min: Option<f64>,

    /// 最大值.
    pub max: Option<f64>,

    /// 中位数.
    pub median: Option<f64>,

    /// 参与汇总的病例数.
    pub count: usize,
}

impl Aggregate {
    /// 从各病例的指标值汇总.
    pub fn from_values<I: IntoIterator<Item = Option<f64>>>(values: I) -> Self {
        let mut values: Vec<f64> = values.into_iter().flatten().collect();
        let count = values.len();
        if count == 0 {
            return Self::default();
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let std = (count >= 2).then(|| {
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
            (var / (count - 1) as f64).sqrt()
        });

        let (min, max) = match values.iter().copied().minmax_by_key(|v| OrderedFloat(*v)) {
            MinMaxResult::NoElements => unreachable!(),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        values.sort_unstable_by_key(|v| OrderedFloat(*v));
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Self {
            mean: Some(mean),
            std,
            min: Some(min),
            max: Some(max),
            median: Some(median),
            count,
        }
    }
}
