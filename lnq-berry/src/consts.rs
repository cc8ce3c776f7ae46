//! 通用常量.

/// 单通道标签值.
pub mod gray {
    /// 分割标签中背景的像素值.
    pub const BACKGROUND: u8 = 0;

    /// 分割标签中淋巴结 (前景) 的像素值.
    pub const LYMPH_NODE: u8 = 1;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 像素是否是前景 (任意非背景标签)?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }
}

/// 阈值分割默认参数.
pub mod threshold {
    /// 默认阈值下限. 不小于该值的 CT 值都被视为前景.
    pub const LOWER: f64 = 2.0;

    /// 默认阈值上限 (无上限).
    pub const UPPER: f64 = f64::INFINITY;
}

/// 基准平台的接口名 (interface slug). 同时也是图像子目录名.
pub mod slug {
    /// 算法输入: 纵隔 CT 扫描.
    pub const MEDIASTINAL_CT: &str = "mediastinal-ct";

    /// 算法输出: 纵隔淋巴结分割.
    pub const LYMPH_NODE_SEGMENTATION: &str = "mediastinal-lymph-node-segmentation";
}

/// 容器内的默认路径.
pub mod path {
    /// 算法容器输入目录.
    pub const ALGORITHM_INPUT_DIR: &str = "/input/images/mediastinal-ct";

    /// 算法容器分割结果输出目录.
    pub const ALGORITHM_OUTPUT_DIR: &str = "/output/images/mediastinal-lymph-node-segmentation";

    /// 算法容器运行记录文件.
    pub const ALGORITHM_RESULTS_FILE: &str = "/output/results.json";

    /// 评估容器的预测清单.
    pub const PREDICTIONS_FILE: &str = "/input/predictions.json";

    /// 评估容器的预测根目录. 每个作业的输出位于 `{root}/{pk}/output/images/{slug}/`.
    pub const PREDICTIONS_ROOT: &str = "/input";

    /// 评估容器的真值目录.
    pub const GROUND_TRUTH_DIR: &str = "/opt/evaluation/ground-truth";

    /// 评估容器的指标输出文件.
    pub const METRICS_FILE: &str = "/output/metrics.json";
}

/// 指标名. 即 `metrics.json` 中使用的键.
pub mod metric {
    /// Dice 系数.
    pub const DICE: &str = "DiceCoefficient";

    /// Jaccard 系数.
    pub const JACCARD: &str = "JaccardCoefficient";

    /// 体积相似度.
    pub const VOLUME_SIMILARITY: &str = "VolumeSimilarity";

    /// 假阴性误差.
    pub const FALSE_NEGATIVE_ERROR: &str = "FalseNegativeError";

    /// 假阳性误差.
    pub const FALSE_POSITIVE_ERROR: &str = "FalsePositiveError";

    /// 平均对称表面距离.
    pub const MEAN_SURFACE_DISTANCE: &str = "MeanSurfaceDistance";

    /// 对称表面距离中位数.
    pub const MEDIAN_SURFACE_DISTANCE: &str = "MedianSurfaceDistance";

    /// 对称表面距离标准差.
    pub const STD_SURFACE_DISTANCE: &str = "StdSurfaceDistance";

    /// Hausdorff 距离.
    pub const HAUSDORFF: &str = "HausdorffDistance";

    /// Hausdorff 距离 95 分位数.
    pub const HAUSDORFF_95: &str = "HausdorffDistance95";
}

/// nifti 体数据文件后缀. 较长的后缀在前.
pub const VOLUME_SUFFIXES: [&str; 2] = [".nii.gz", ".nii"];

/// 作业成功完成时 `predictions.json` 中的状态值.
pub const JOB_SUCCEEDED: &str = "Succeeded";
