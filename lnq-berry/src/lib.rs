#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供纵隔淋巴结分割基准 (LNQ) 所需的 3D CT 体数据读写、
//! 阈值分割算法和分割结果评估指标.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 只处理 nifti 格式 (`.nii`, `.nii.gz`) 的体数据.
//! 2. 除非特别说明, 所有 3D 索引均按 `(z, h, w)` 组织, 与 nifti 文件中的
//!   `[W, H, z]` 顺序相反.
//!
//! # 功能
//!
//! ### 体数据读写 ✅
//!
//! [`CtScan`] 以 `f32` 保存 CT 扫描, [`CtLabel`] 以 `u8` 保存分割标签.
//! 标签可以按原扫描的几何信息 (体素分辨率、方向) 写回 nifti 文件.
//!
//! 实现位于 `lnq-berry/src/data`.
//!
//! ### 二值阈值分割 ✅
//!
//! 实现位于 `lnq-berry/src/threshold.rs`.
//!
//! ### 重叠度量与表面距离度量 ✅
//!
//! Dice, Jaccard, 体积相似度, 假阴/假阳误差; 基于精确欧氏距离变换的对称表面距离
//! (平均值、中位数、标准差、Hausdorff 距离及其 95 分位数).
//!
//! 实现位于 `lnq-berry/src/metrics`.
//!
//! ### 数据集约定与预测清单 ✅
//!
//! `predictions.json` 解析、预测文件定位、病例配对与校验.
//!
//! 实现位于 `lnq-berry/src/dataset`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
mod data;

mod error;

pub use data::{CtLabel, CtScan, NiftiHeaderAttr};

pub use error::{BerryError, Result};

pub mod consts;

pub mod dataset;

pub mod metrics;

pub mod prelude;

pub mod threshold;
