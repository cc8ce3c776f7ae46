//! 预测清单 (`predictions.json`).
//!
//! 清单是作业数组. 每个作业有唯一的 `pk`, 以及按接口名 (slug) 区分的输入/输出:
//!
//! ```json
//! [{"pk": "7a1b...", "status": "Succeeded",
//!   "inputs":  [{"interface": {"slug": "mediastinal-ct"}, "image": {"name": "case_001.nii.gz"}}],
//!   "outputs": [{"interface": {"slug": "mediastinal-lymph-node-segmentation"}, "image": {"name": "seg.nii.gz"}}]}]
//! ```
//!
//! 作业 `pk` 的输出文件位于 `{root}/{pk}/output/images/{slug}/`.

use super::{file_name, is_volume_file};
use crate::consts::JOB_SUCCEEDED;
use crate::{BerryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 接口描述. 只关心 `slug`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    /// 接口名.
    pub slug: String,
}

/// 图像引用. 只关心文件名.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// 图像文件名.
    pub name: String,
}

/// 作业的一个输入或输出.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// 所属接口.
    pub interface: Interface,

    /// 图像. 非图像类接口没有该字段.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// 单个算法作业.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// 作业标识. 同时是输出子目录名.
    pub pk: String,

    /// 作业状态. 缺省视为成功.
    #[serde(default)]
    pub status: Option<String>,

    /// 输入.
    #[serde(default)]
    pub inputs: Vec<Socket>,

    /// 输出.
    #[serde(default)]
    pub outputs: Vec<Socket>,
}

/// 在 `sockets` 中查找接口 `slug` 对应的图像文件名.
fn image_name<'a>(sockets: &'a [Socket], slug: &str) -> Option<&'a str> {
    sockets
        .iter()
        .filter(|s| s.interface.slug == slug)
        .find_map(|s| s.image.as_ref())
        .map(|i| i.name.as_str())
}

impl Job {
    /// 作业是否成功完成?
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == JOB_SUCCEEDED)
    }

    /// 接口 `slug` 的输入图像文件名.
    #[inline]
    pub fn input_image(&self, slug: &str) -> Option<&str> {
        image_name(&self.inputs, slug)
    }

    /// 接口 `slug` 的输出图像文件名.
    #[inline]
    pub fn output_image(&self, slug: &str) -> Option<&str> {
        image_name(&self.outputs, slug)
    }
}

/// 单个作业的输入与输出对应关系.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobMapping {
    /// 作业标识.
    pub pk: String,

    /// 输入图像文件名, 同时也是真值文件名.
    pub input_name: String,

    /// 输出图像文件名.
    pub output_name: String,
}

/// 预测清单.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    jobs: Vec<Job>,
}

impl FromStr for Manifest {
    type Err = BerryError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Manifest {
    /// 读取 `path` 处的清单文件.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        text.parse()
    }

    /// 所有作业.
    #[inline]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// 作业个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// 清单是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 列出每个作业的输入 (接口 `input_slug`) 和输出 (接口 `output_slug`) 文件名.
    ///
    /// 任一作业未成功完成, 或缺少指定接口的图像, 都会返回 `Err`.
    pub fn mapping(&self, input_slug: &str, output_slug: &str) -> Result<Vec<JobMapping>> {
        self.jobs
            .iter()
            .map(|job| {
                if !job.succeeded() {
                    let status = job.status.clone().unwrap_or_default();
                    return Err(BerryError::JobFailed(job.pk.clone(), status));
                }
                let missing =
                    |slug: &str| BerryError::MissingManifestEntry(job.pk.clone(), slug.to_owned());
                let input_name = job.input_image(input_slug).ok_or_else(|| missing(input_slug))?;
                let output_name = job
                    .output_image(output_slug)
                    .ok_or_else(|| missing(output_slug))?;
                Ok(JobMapping {
                    pk: job.pk.clone(),
                    input_name: input_name.to_owned(),
                    output_name: output_name.to_owned(),
                })
            })
            .collect()
    }
}

/// 作业 `pk` 的接口 `slug` 输出目录: `{root}/{pk}/output/images/{slug}`.
pub fn output_dir<P: AsRef<Path>>(root: P, pk: &str, slug: &str) -> PathBuf {
    let mut ans = root.as_ref().to_owned();
    ans.extend([pk, "output", "images", slug]);
    ans
}

/// 定位作业 `pk` 在接口 `slug` 下唯一的结果文件.
///
/// 目录不存在或目录中没有 nifti 文件时返回 [`BerryError::MissingResultFile`],
/// 有多个时返回 [`BerryError::DuplicateResultFile`].
pub fn locate_prediction<P: AsRef<Path>>(root: P, pk: &str, slug: &str) -> Result<PathBuf> {
    let dir = output_dir(root, pk, slug);
    if !dir.is_dir() {
        return Err(BerryError::MissingResultFile(dir));
    }
    let mut found = super::list_volumes(&dir)?;
    match found.len() {
        0 => Err(BerryError::MissingResultFile(dir)),
        1 => Ok(found.remove(0)),
        _ => Err(BerryError::DuplicateResultFile(found)),
    }
}

/// 用于日志的简短描述.
#[inline]
pub(crate) fn describe(path: &Path) -> &str {
    file_name(path).unwrap_or("<non-utf8>")
}
