//! 二值阈值分割.

use crate::consts::gray::{BACKGROUND, LYMPH_NODE};
use crate::consts::threshold::{LOWER, UPPER};
use crate::{BerryError, CtLabel, CtScan, Result};
use num::ToPrimitive;

/// 二值阈值滤波器.
///
/// 体素值 `v` 满足 `lower <= v <= upper` 时映射为 `inside`, 否则映射为 `outside`.
/// NaN 总是映射为 `outside`.
///
/// 该结构是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinaryThreshold {
    lower: f64,
    upper: f64,
    inside: u8,
    outside: u8,
}

impl Default for BinaryThreshold {
    /// 阈值下限为 2, 无上限. 前景为 1, 背景为 0.
    #[inline]
    fn default() -> Self {
        Self::lymph_node()
    }
}

impl BinaryThreshold {
    /// 构建阈值滤波器.
    ///
    /// `lower`, `upper` 不能为 NaN, 且 `lower <= upper`, 否则返回 `Err`.
    /// 两端都允许取无穷值.
    pub fn new(lower: f64, upper: f64, inside: u8, outside: u8) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(BerryError::InvalidThreshold(lower, upper));
        }
        Ok(Self {
            lower,
            upper,
            inside,
            outside,
        })
    }

    /// 基准算法使用的阈值: 所有不小于 2 的值都是淋巴结.
    #[inline]
    pub const fn lymph_node() -> Self {
        Self {
            lower: LOWER,
            upper: UPPER,
            inside: LYMPH_NODE,
            outside: BACKGROUND,
        }
    }

    /// 阈值下限.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// 阈值上限.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// 求单个体素值对应的标签值.
    ///
    /// 无法转换为 `f64` 的值视为 NaN.
    #[inline]
    pub fn eval<T: ToPrimitive>(&self, v: T) -> u8 {
        match v.to_f64() {
            Some(v) if self.lower <= v && v <= self.upper => self.inside,
            _ => self.outside,
        }
    }

    /// 对整个扫描做阈值分割. 结果保留扫描的几何信息.
    pub fn apply(&self, scan: &CtScan) -> Result<CtLabel> {
        let data = scan.data();

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                let data = ndarray::Zip::from(&data).par_map_collect(|v| self.eval(*v));
            } else {
                let data = data.map(|v| self.eval(*v));
            }
        }

        CtLabel::from_scan(scan, data)
    }
}
