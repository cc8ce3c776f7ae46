//! 病例发现与配对.
//!
//! 从预测清单出发, 把每个作业的结果文件与同名真值文件配对, 并在评估之前完成全部校验.

use super::manifest::{describe, locate_prediction, Manifest};
use super::{case_id, file_name, list_volumes, validate};
use crate::consts::{path, slug};
use crate::metrics::CaseMetrics;
use crate::{BerryError, CtLabel, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// 评估容器的目录约定.
#[derive(Clone, Debug)]
pub struct Layout {
    /// 预测根目录.
    pub predictions_root: PathBuf,

    /// 真值目录.
    pub ground_truth_dir: PathBuf,

    /// 作业输入 (即真值) 的接口名.
    pub input_slug: String,

    /// 作业输出 (即预测) 的接口名.
    pub output_slug: String,
}

impl Default for Layout {
    /// 容器内的默认约定.
    fn default() -> Self {
        Self {
            predictions_root: PathBuf::from(path::PREDICTIONS_ROOT),
            ground_truth_dir: PathBuf::from(path::GROUND_TRUTH_DIR),
            input_slug: slug::MEDIASTINAL_CT.to_owned(),
            output_slug: slug::LYMPH_NODE_SEGMENTATION.to_owned(),
        }
    }
}

/// 一个待评估的病例: 真值与预测文件, 以及发现时记录的内容摘要.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Case {
    /// 病例标识 (真值文件名去掉后缀).
    pub id: String,

    /// 真值文件路径.
    pub ground_truth: PathBuf,

    /// 预测文件路径.
    pub prediction: PathBuf,

    /// 真值内容摘要.
    pub gt_digest: String,

    /// 预测内容摘要.
    pub pred_digest: String,
}

/// `name` 是否只是一个文件名, 不会把路径引向目录之外?
#[inline]
fn is_plain_file_name(name: &str) -> bool {
    Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// 打开 `path` 处的标签, 并确认其摘要仍为 `digest`.
fn open_verified(path: &Path, digest: &str) -> Result<CtLabel> {
    let label = CtLabel::open(path)?;
    if label.digest() != digest {
        return Err(BerryError::HashMismatch(path.to_owned()));
    }
    Ok(label)
}

impl Case {
    /// 加载 (真值, 预测), 两者都转换为 `u8`. 若文件内容与发现时不同, 返回 `Err`.
    pub fn load(&self) -> Result<(CtLabel, CtLabel)> {
        let gt = open_verified(&self.ground_truth, &self.gt_digest)?;
        let pred = open_verified(&self.prediction, &self.pred_digest)?;
        Ok((gt, pred))
    }

    /// 加载并评估该病例.
    pub fn score(&self) -> Result<CaseMetrics> {
        let (gt, pred) = self.load()?;
        let metrics = CaseMetrics::score(&gt, &pred)?;
        Ok(metrics.with_names(describe(&self.ground_truth), describe(&self.prediction)))
    }
}

/// 已校验的病例集合, 按病例标识升序排列.
#[derive(Clone, Debug, Default)]
pub struct CaseSet {
    cases: Vec<Case>,
}

impl CaseSet {
    /// 根据清单 `manifest` 和目录约定 `layout` 发现所有病例.
    ///
    /// 以下情况会返回 `Err`:
    ///
    /// 1. 作业未成功完成或缺少接口条目;
    /// 2. 作业输出目录中没有或有多个结果文件;
    /// 3. 作业输入对应的真值文件不存在;
    /// 4. 多个作业对应同一个真值;
    /// 5. 真值目录中存在没有作业对应的真值文件;
    /// 6. 两个预测 (或两个真值) 内容完全相同;
    /// 7. 给定 `expected` 时, 病例个数不符.
    pub fn discover(manifest: &Manifest, layout: &Layout, expected: Option<usize>) -> Result<Self> {
        let mapping = manifest.mapping(&layout.input_slug, &layout.output_slug)?;

        let mut pairs = Vec::with_capacity(mapping.len());
        for job in mapping.iter() {
            let prediction =
                locate_prediction(&layout.predictions_root, &job.pk, &layout.output_slug)?;
            if file_name(&prediction) != Some(job.output_name.as_str()) {
                log::warn!(
                    "job {}: expected `{}`, found `{}`",
                    job.pk,
                    job.output_name,
                    describe(&prediction)
                );
            }

            if !is_plain_file_name(&job.input_name) {
                return Err(BerryError::InvalidImageName(
                    job.pk.clone(),
                    job.input_name.clone(),
                ));
            }
            let ground_truth = layout.ground_truth_dir.join(&job.input_name);
            if !ground_truth.is_file() {
                return Err(BerryError::MissingGroundTruth(ground_truth));
            }
            let id = case_id(&ground_truth).unwrap_or_else(|| job.input_name.clone());
            pairs.push((id, ground_truth, prediction));
        }
        pairs.sort();
        validate::unique_ids(pairs.iter().map(|(id, ..)| id.as_str()))?;

        let paired: BTreeSet<&Path> = pairs.iter().map(|(_, gt, _)| gt.as_path()).collect();
        if let Some(orphan) = list_volumes(&layout.ground_truth_dir)?
            .iter()
            .find(|p| !paired.contains(p.as_path()))
        {
            return Err(BerryError::MissingPrediction(describe(orphan).to_owned()));
        }
        validate::case_count(expected, pairs.len())?;

        let mut cases = Vec::with_capacity(pairs.len());
        for (id, ground_truth, prediction) in pairs {
            log::debug!("hashing case {id}");
            let gt_digest = CtLabel::open(&ground_truth)?.digest();
            let pred_digest = CtLabel::open(&prediction)?.digest();
            cases.push(Case {
                id,
                ground_truth,
                prediction,
                gt_digest,
                pred_digest,
            });
        }
        validate::unique_images(cases.iter().map(|c| (c.id.as_str(), c.gt_digest.as_str())))?;
        validate::unique_images(cases.iter().map(|c| (c.id.as_str(), c.pred_digest.as_str())))?;

        log::info!("discovered {} cases", cases.len());
        Ok(Self { cases })
    }

    /// 所有病例.
    #[inline]
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// 病例个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// 是否没有病例?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// 迭代所有病例.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Case> {
        self.cases.iter()
    }
}
