//! 标签重叠度量.

use crate::consts::gray::is_foreground;
use crate::{BerryError, CtLabel, NiftiHeaderAttr, Result};
use std::collections::BTreeMap;

/// 单个标签 (或全部标签之和) 的体素计数.
///
/// `reference` 为真值中该标签的体素数, `prediction` 为预测中该标签的体素数,
/// `intersection` 为两者在同一位置都取该标签的体素数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelCounts {
    /// 真值体素数.
    pub reference: usize,

    /// 预测体素数.
    pub prediction: usize,

    /// 交集体素数.
    pub intersection: usize,
}

impl LabelCounts {
    /// 两者是否都为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reference == 0 && self.prediction == 0
    }

    /// Dice 系数 `2|G∩P| / (|G| + |P|)`. 两者都为空时为 1.
    pub fn dice(&self) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        2.0 * self.intersection as f64 / (self.reference + self.prediction) as f64
    }

    /// Jaccard 系数 `|G∩P| / |G∪P|`. 两者都为空时为 1.
    pub fn jaccard(&self) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        let union = self.reference + self.prediction - self.intersection;
        self.intersection as f64 / union as f64
    }

    /// 体积相似度 `2(|P| - |G|) / (|G| + |P|)`. 两者都为空时为 0.
    pub fn volume_similarity(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let diff = self.prediction as f64 - self.reference as f64;
        2.0 * diff / (self.reference + self.prediction) as f64
    }

    /// 假阴性误差 `|G \ P| / |G|`. 真值为空时为 0.
    pub fn false_negative_error(&self) -> f64 {
        ratio(self.reference - self.intersection, self.reference)
    }

    /// 假阳性误差 `|P \ G| / |P|`. 预测为空时为 0.
    pub fn false_positive_error(&self) -> f64 {
        ratio(self.prediction - self.intersection, self.prediction)
    }
}

impl std::ops::AddAssign for LabelCounts {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.reference += rhs.reference;
        self.prediction += rhs.prediction;
        self.intersection += rhs.intersection;
    }
}

/// 分母为 0 时结果为 0.
#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// 真值与预测之间按标签统计的重叠信息. 背景 (0) 不参与统计.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelOverlap {
    per_label: BTreeMap<u8, LabelCounts>,
}

impl LabelOverlap {
    /// 统计 `reference` 与 `prediction` 的重叠. 两者形状必须相同, 否则返回 `Err`.
    pub fn compute(reference: &CtLabel, prediction: &CtLabel) -> Result<Self> {
        if reference.shape() != prediction.shape() {
            return Err(BerryError::ShapeMismatch(
                reference.shape(),
                prediction.shape(),
            ));
        }

        let mut book = [LabelCounts::default(); 256];
        for (&g, &p) in reference.data().iter().zip(prediction.data().iter()) {
            if is_foreground(g) {
                book[g as usize].reference += 1;
                if g == p {
                    book[g as usize].intersection += 1;
                }
            }
            if is_foreground(p) {
                book[p as usize].prediction += 1;
            }
        }

        let per_label = book
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(label, c)| (label as u8, c))
            .collect();
        Ok(Self { per_label })
    }

    /// 获取单个标签的计数. 若两者都不含该标签, 返回 `None`.
    #[inline]
    pub fn label(&self, label: u8) -> Option<&LabelCounts> {
        self.per_label.get(&label)
    }

    /// 按升序迭代所有出现过的标签及其计数.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u8, &LabelCounts)> {
        self.per_label.iter().map(|(l, c)| (*l, c))
    }

    /// 所有标签计数之和.
    pub fn total(&self) -> LabelCounts {
        let mut ans = LabelCounts::default();
        self.per_label.values().for_each(|c| ans += *c);
        ans
    }

    /// 全部标签的 Dice 系数.
    #[inline]
    pub fn dice(&self) -> f64 {
        self.total().dice()
    }

    /// 全部标签的 Jaccard 系数.
    #[inline]
    pub fn jaccard(&self) -> f64 {
        self.total().jaccard()
    }

    /// 全部标签的体积相似度.
    #[inline]
    pub fn volume_similarity(&self) -> f64 {
        self.total().volume_similarity()
    }

    /// 全部标签的假阴性误差.
    #[inline]
    pub fn false_negative_error(&self) -> f64 {
        self.total().false_negative_error()
    }

    /// 全部标签的假阳性误差.
    #[inline]
    pub fn false_positive_error(&self) -> f64 {
        self.total().false_positive_error()
    }
}
