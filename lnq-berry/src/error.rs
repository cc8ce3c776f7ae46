//! 运行时错误.

use crate::Idx3d;
use std::path::PathBuf;
use thiserror::Error;

/// 读写体数据、解析清单、配对病例和计算指标时的错误.
///
/// 所有错误都是致命的: 调用方不做重试, 直接终止整个运行.
#[derive(Error, Debug)]
pub enum BerryError {
    /// nifti 读写错误.
    #[error("nifti 读写失败: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 其他底层 I/O 错误.
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析错误.
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 体数据维度不受支持. 参数为 header 声明的体素个数和实际读到的体素个数.
    #[error("体数据维度不受支持: header 声明 {0} 个体素, 实际 {1} 个")]
    UnsupportedVolume(usize, usize),

    /// 两个体数据形状不一致.
    #[error("体数据形状不一致: {0:?} != {1:?}")]
    ShapeMismatch(Idx3d, Idx3d),

    /// 两个体数据的体素分辨率不一致.
    #[error("体素分辨率不一致: {0:?} != {1:?}")]
    SpacingMismatch([f64; 3], [f64; 3]),

    /// 阈值参数非法.
    #[error("阈值参数非法: [{0}, {1}]")]
    InvalidThreshold(f64, f64),

    /// 作业输出目录下没有结果文件.
    #[error("未找到结果文件: {0}")]
    MissingResultFile(PathBuf),

    /// 作业输出目录下有多个结果文件.
    #[error("结果文件不唯一: {0:?}")]
    DuplicateResultFile(Vec<PathBuf>),

    /// 清单中的作业缺少指定接口的条目. 参数为作业 pk 和接口名.
    #[error("作业 `{0}` 缺少接口 `{1}` 的条目")]
    MissingManifestEntry(String, String),

    /// 作业未成功完成. 参数为作业 pk 和状态.
    #[error("作业 `{0}` 未成功完成 (状态: {1})")]
    JobFailed(String, String),

    /// 清单中的图像名不是单纯的文件名 (含路径分隔符, `..` 或为绝对路径).
    /// 参数为作业 pk 和图像名.
    #[error("作业 `{0}` 的图像名 `{1}` 不是合法的文件名")]
    InvalidImageName(String, String),

    /// 作业对应的真值文件不存在.
    #[error("未找到真值文件: {0}")]
    MissingGroundTruth(PathBuf),

    /// 真值文件没有对应的预测.
    #[error("真值 `{0}` 没有对应的预测")]
    MissingPrediction(String),

    /// 病例标识重复.
    #[error("病例 `{0}` 重复出现")]
    DuplicateCase(String),

    /// 两个不同文件的图像内容完全相同.
    #[error("图像内容重复: `{0}` 与 `{1}`")]
    DuplicateImage(String, String),

    /// 图像内容在发现之后被改动.
    #[error("图像 `{0}` 的摘要不匹配")]
    HashMismatch(PathBuf),

    /// 病例个数与期望不符. 参数为期望个数和实际个数.
    #[error("期望 {0} 个病例, 实际 {1} 个")]
    WrongCaseCount(usize, usize),
}

/// 该 crate 通用的 `Result`.
pub type Result<T> = std::result::Result<T, BerryError>;
