use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView, ArrayViewMut, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::gray::*;
use crate::{BerryError, Idx3d, Result};

mod digest;

use digest::digest_voxels;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// nifti `datatype` 字段中 `u8` 对应的值.
const DT_UINT8: i16 = 2;

/// nifti `datatype` 字段中 `f32` 对应的值.
const DT_FLOAT32: i16 = 16;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
///
/// 维度不足三维时, 缺失的维度按 1 处理.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [ndim, W, H, z, ..]. 体素个数数组.
    let [ndim, w, h, z, ..] = h.dim;
    let h = if ndim >= 2 { h.max(1) } else { 1 };
    let z = if ndim >= 3 { z.max(1) } else { 1 };
    (z as usize, h as usize, w as usize)
}

/// 将 `into_ndarray` 得到的 `[W, H, z, ..]` 数组转换为 `[z, H, W]` 的标准布局数组.
///
/// 第四维及以后的维度必须为 1, 否则返回 `Err`.
fn into_zhw<T: Clone>(data: ArrayD<T>, shape: Idx3d) -> Result<Array3<T>> {
    let (z, h, w) = shape;
    let expected = z * h * w;
    if data.len() != expected {
        return Err(BerryError::UnsupportedVolume(expected, data.len()));
    }

    // hint: 原第一维向下增长, 原第二维向右增长.
    let reversed: Vec<usize> = (0..data.ndim()).rev().collect();
    let data = data.permuted_axes(reversed);

    // The nature of nifti data field layout.
    let raw = if data.is_standard_layout() {
        data.into_raw_vec()
    } else {
        data.iter().cloned().collect()
    };
    Array3::from_shape_vec(shape, raw).map_err(|_| BerryError::UnsupportedVolume(expected, 0))
}

/// 以 `header` 的几何信息为基准, 为 `datatype` 类型、`shape` 形状的体数据构造新 header.
///
/// 强度缩放 (`scl_*`) 和显示范围 (`cal_*`) 会被重置.
fn derive_header(header: &NiftiHeader, shape: Idx3d, datatype: i16, bitpix: i16) -> BoxedHeader {
    let (z, h, w) = shape;
    let mut header = Box::new(header.clone());
    header.dim = [3, w as _, h as _, z as _, 1, 1, 1, 1];
    header.datatype = datatype;
    header.bitpix = bitpix;
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header.cal_min = 0.0;
    header.cal_max = 0.0;
    header
}

/// 以给定体素分辨率 (\[z, h, w\], 毫米) 构造最简 header.
fn synthetic_header(shape: Idx3d, spacing: [f32; 3], datatype: i16, bitpix: i16) -> BoxedHeader {
    let mut header = derive_header(&NiftiHeader::default(), shape, datatype, bitpix);
    let [z, h, w] = spacing;
    let [_, pw, ph, pz, ..] = &mut header.pixdim;
    (*pw, *ph, *pz) = (w, h, z);
    header
}

/// 3D CT nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    ///
    /// 该值按 header 原样返回, 可能为 0 或负数. 用于计算时请使用 [`Self::spacing`].
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 与 [`Self::pix_dim`] 相同, 但取绝对值, 并将 0 或非有限值替换为 1 毫米.
    #[inline]
    fn spacing(&self) -> [f64; 3] {
        self.pix_dim().map(|d| {
            let d = d.abs();
            if d.is_finite() && d > 0.0 {
                d
            } else {
                1.0
            }
        })
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [z, h, w] = self.spacing();
        z == h && z == w
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.spacing().iter().product()
    }
}

/// nii 格式 3D CT 扫描, 包括 header 和 CT 扫描 (HU). HU 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtScan {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// 体素值会按 header 中的 `scl_slope`, `scl_inter` 换算.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let shape = get_shape_from_header(obj.header());
        let header = derive_header(obj.header(), shape, DT_FLOAT32, 32);
        let data = into_zhw(obj.into_volume().into_ndarray::<f32>()?, shape)?;
        Ok(Self { header, data })
    }

    /// 根据 \[z, h, w\] 格式组织的数据和体素分辨率直接创建扫描.
    pub fn new(data: Array3<f32>, spacing: [f32; 3]) -> Self {
        let header = synthetic_header(data.dim(), spacing, DT_FLOAT32, 32);
        Self { header, data }
    }

    /// 以 `f32` 格式将扫描保存到 `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // [z, H, W] -> [W, H, z]. 若 `path` 以 `.gz` 结尾, 则写入压缩文件.
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&self.data.view().reversed_axes())?;
        Ok(())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 体数据内容摘要 (十六进制 SHA-256).
    #[inline]
    pub fn digest(&self) -> String {
        digest_voxels(self.data.view())
    }
}

/// nii 格式 3D CT 标注, 包括 header 和分割标签. 标签值以 `u8` 保存.
#[derive(Debug, Clone)]
pub struct CtLabel {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for CtLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtLabel {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtLabel {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtLabel {
    /// 打开 nii 文件格式的 3D CT 标注. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    ///
    /// 无论文件中的体素类型是什么, 都会转换为 `u8`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let shape = get_shape_from_header(obj.header());
        let header = derive_header(obj.header(), shape, DT_UINT8, 8);
        let data = into_zhw(obj.into_volume().into_ndarray::<u8>()?, shape)?;
        Ok(Self { header, data })
    }

    /// 根据 \[z, h, w\] 格式组织的数据和体素分辨率直接创建标签.
    pub fn new(data: Array3<u8>, spacing: [f32; 3]) -> Self {
        let header = synthetic_header(data.dim(), spacing, DT_UINT8, 8);
        Self { header, data }
    }

    /// 创建与 `scan` 几何信息一致的标签. `data` 必须与 `scan` 形状相同, 否则返回 `Err`.
    pub fn from_scan(scan: &CtScan, data: Array3<u8>) -> Result<Self> {
        if scan.shape() != data.dim() {
            return Err(BerryError::ShapeMismatch(scan.shape(), data.dim()));
        }
        let header = derive_header(scan.header(), data.dim(), DT_UINT8, 8);
        Ok(Self { header, data })
    }

    /// 以 `u8` 格式将标签保存到 `path`. 几何信息与来源一致.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // [z, H, W] -> [W, H, z]. 若 `path` 以 `.gz` 结尾, 则写入压缩文件.
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&self.data.view().reversed_axes())?;
        Ok(())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 体数据内容摘要 (十六进制 SHA-256).
    ///
    /// 与数值相同的 [`CtScan`] 摘要一致.
    #[inline]
    pub fn digest(&self) -> String {
        digest_voxels(self.data.view())
    }

    /// 获取 3D 标注中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取前景 (非背景) 体素个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 标签中是否不存在前景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 收集所有出现过的前景标签值.
    pub fn labels(&self) -> BTreeSet<u8> {
        self.data
            .iter()
            .copied()
            .filter(|p| is_foreground(*p))
            .collect()
    }

    /// 收集所有前景像素对应的下标. 结果按行优先存储.
    pub fn foreground_pos(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, pixel)| is_foreground(*pixel).then_some(pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn cube_label() -> CtLabel {
        let mut data = Array3::<u8>::zeros((4, 5, 6));
        data[(1, 2, 3)] = LYMPH_NODE;
        data[(2, 2, 3)] = LYMPH_NODE;
        data[(3, 4, 5)] = 2;
        CtLabel::new(data, [2.5, 0.75, 0.75])
    }

    #[test]
    fn test_synthetic_header_geometry() {
        let label = cube_label();
        assert_eq!(label.shape(), (4, 5, 6));
        assert_eq!(label.size(), 120);
        assert_eq!(label.pix_dim(), [2.5, 0.75, 0.75]);
        assert!(!label.is_isotropic());
        assert!(label.check(&(3, 4, 5)));
        assert!(!label.check(&(4, 0, 0)));
    }

    #[test]
    fn test_label_statistics() {
        let label = cube_label();
        assert_eq!(label.count(LYMPH_NODE), 2);
        assert_eq!(label.foreground_count(), 3);
        assert_eq!(label.labels().into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(label.foreground_pos(), vec![(1, 2, 3), (2, 2, 3), (3, 4, 5)]);
        assert!(!label.is_background());
    }

    #[test]
    fn test_spacing_sanitized() {
        let label = CtLabel::new(Array3::zeros((1, 1, 1)), [0.0, -2.0, f32::NAN]);
        assert_eq!(label.spacing(), [1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_label_save_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.nii.gz");
        let label = cube_label();
        label.save(&path).unwrap();

        let back = CtLabel::open(&path).unwrap();
        assert_eq!(back.shape(), label.shape());
        assert_eq!(back.pix_dim(), label.pix_dim());
        assert_eq!(back.data(), label.data());
        assert_eq!(back.digest(), label.digest());
    }

    #[test]
    fn test_scan_round_trip_and_label_from_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.nii");
        let data = Array3::from_shape_fn((3, 4, 5), |(z, h, w)| (z * 100 + h * 10 + w) as f32);
        let scan = CtScan::new(data, [3.0, 0.5, 0.5]);
        scan.save(&path).unwrap();

        let back = CtScan::open(&path).unwrap();
        assert_eq!(back.data(), scan.data());
        assert_eq!(back[(2, 3, 4)], 234.0);

        let label = CtLabel::from_scan(&back, Array3::zeros((3, 4, 5))).unwrap();
        assert_eq!(label.pix_dim(), [3.0, 0.5, 0.5]);
        assert!(label.is_background());

        let err = CtLabel::from_scan(&back, Array3::zeros((3, 4, 4))).unwrap_err();
        assert!(matches!(err, BerryError::ShapeMismatch((3, 4, 5), (3, 4, 4))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CtLabel::open(dir.path().join("nothing.nii")).is_err());
    }
}
