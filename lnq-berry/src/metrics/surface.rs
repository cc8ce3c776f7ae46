//! 表面 (轮廓) 提取与对称表面距离.

use super::edt::distance_map;
use crate::consts::gray::{is_background, is_foreground};
use crate::{BerryError, CtLabel, Idx3d, NiftiHeaderAttr, Result};
use ndarray::{Array3, ArrayView3};
use ordered_float::OrderedFloat;

/// 判定两个体素分辨率一致时使用的相对误差.
const SPACING_TOLERANCE: f64 = 1e-3;

/// 获取 `pos` 前后上下左右六个点的坐标. 越界的坐标为 `None`.
#[inline]
fn diamond_neighbours((z, h, w): Idx3d, (sz, sh, sw): Idx3d) -> [Option<Idx3d>; 6] {
    [
        z.checked_sub(1).map(|z| (z, h, w)),
        (z + 1 < sz).then_some((z + 1, h, w)),
        h.checked_sub(1).map(|h| (z, h, w)),
        (h + 1 < sh).then_some((z, h + 1, w)),
        w.checked_sub(1).map(|w| (z, h, w)),
        (w + 1 < sw).then_some((z, h, w + 1)),
    ]
}

/// 提取标签轮廓.
///
/// 前景体素的六邻域 (钻石型) 中只要有一个是背景, 它就是轮廓体素.
/// 体数据范围之外视为背景, 因此贴着体数据边界的前景体素也是轮廓体素.
pub fn label_contour(label: ArrayView3<'_, u8>) -> Array3<bool> {
    let shape = label.dim();
    Array3::from_shape_fn(shape, |pos| {
        is_foreground(label[pos])
            && diamond_neighbours(pos, shape)
                .into_iter()
                .any(|n| n.map_or(true, |n| is_background(label[n])))
    })
}

/// 两个分割轮廓之间的对称表面距离集合 (毫米).
///
/// 包含真值轮廓每个体素到预测轮廓的最近距离, 以及预测轮廓每个体素到真值轮廓的最近距离.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceDistance {
    /// 升序排列.
    distances: Vec<f64>,
    reference_surface: usize,
    prediction_surface: usize,
}

impl SurfaceDistance {
    /// 计算 `reference` 与 `prediction` 的对称表面距离.
    ///
    /// 两者形状必须相同; 体素分辨率必须在相对误差 1e-3 内一致. 距离按 `reference`
    /// 的体素分辨率计算.
    pub fn compute(reference: &CtLabel, prediction: &CtLabel) -> Result<Self> {
        if reference.shape() != prediction.shape() {
            return Err(BerryError::ShapeMismatch(
                reference.shape(),
                prediction.shape(),
            ));
        }
        let spacing = reference.spacing();
        if !spacing_matches(spacing, prediction.spacing()) {
            return Err(BerryError::SpacingMismatch(spacing, prediction.spacing()));
        }

        let g_contour = label_contour(reference.data());
        let p_contour = label_contour(prediction.data());
        let reference_surface = g_contour.iter().filter(|c| **c).count();
        let prediction_surface = p_contour.iter().filter(|c| **c).count();

        let mut distances = Vec::with_capacity(reference_surface + prediction_surface);
        if reference_surface != 0 && prediction_surface != 0 {
            let to_p = distance_map(p_contour.view(), spacing);
            let to_g = distance_map(g_contour.view(), spacing);
            distances.extend(sample(&g_contour, &to_p));
            distances.extend(sample(&p_contour, &to_g));
            distances.sort_unstable_by_key(|d| OrderedFloat(*d));
        }
        log::trace!(
            "surface voxels: reference {reference_surface}, prediction {prediction_surface}"
        );

        Ok(Self {
            distances,
            reference_surface,
            prediction_surface,
        })
    }

    /// 真值轮廓体素数.
    #[inline]
    pub fn reference_surface(&self) -> usize {
        self.reference_surface
    }

    /// 预测轮廓体素数.
    #[inline]
    pub fn prediction_surface(&self) -> usize {
        self.prediction_surface
    }

    /// 所有距离, 升序.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// 统计量是否有定义? 仅当恰好一方轮廓为空时无定义.
    #[inline]
    pub fn is_defined(&self) -> bool {
        (self.reference_surface == 0) == (self.prediction_surface == 0)
    }

    /// 对距离集合求统计量. 两方轮廓都为空时为 0, 恰好一方为空时为 `None`.
    fn stat<F: FnOnce(&[f64]) -> f64>(&self, f: F) -> Option<f64> {
        if !self.is_defined() {
            None
        } else if self.distances.is_empty() {
            Some(0.0)
        } else {
            Some(f(&self.distances))
        }
    }

    /// 平均对称表面距离.
    pub fn mean(&self) -> Option<f64> {
        self.stat(|d| d.iter().sum::<f64>() / d.len() as f64)
    }

    /// 对称表面距离中位数.
    pub fn median(&self) -> Option<f64> {
        self.stat(|d| {
            let mid = d.len() / 2;
            if d.len() % 2 == 0 {
                (d[mid - 1] + d[mid]) / 2.0
            } else {
                d[mid]
            }
        })
    }

    /// 对称表面距离 (总体) 标准差.
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        self.stat(|d| {
            let var = d.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / d.len() as f64;
            var.sqrt()
        })
    }

    /// Hausdorff 距离, 即对称表面距离的最大值.
    pub fn hausdorff(&self) -> Option<f64> {
        self.stat(|d| d[d.len() - 1])
    }

    /// 对称表面距离的 `q` 分位数 (最近秩法). `q` 会被截断到 `[0, 1]`.
    pub fn percentile(&self, q: f64) -> Option<f64> {
        self.stat(|d| {
            let q = q.clamp(0.0, 1.0);
            let rank = (q * d.len() as f64).ceil() as usize;
            d[rank.clamp(1, d.len()) - 1]
        })
    }

    /// 95% Hausdorff 距离.
    #[inline]
    pub fn hausdorff_95(&self) -> Option<f64> {
        self.percentile(0.95)
    }
}

/// 取 `contour` 上每个体素在 `map` 中的值.
#[inline]
fn sample<'a>(contour: &'a Array3<bool>, map: &'a Array3<f64>) -> impl Iterator<Item = f64> + 'a {
    contour
        .iter()
        .zip(map.iter())
        .filter_map(|(c, d)| c.then_some(*d))
}

/// 两个体素分辨率是否在相对误差内一致?
fn spacing_matches(a: [f64; 3], b: [f64; 3]) -> bool {
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x - y).abs() <= SPACING_TOLERANCE * x.abs().max(y.abs()))
}

#[cfg(test)]
mod tests {
    use super::{label_contour, SurfaceDistance};
    use crate::{BerryError, CtLabel};
    use ndarray::{s, Array3};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 在 `(8, 8, 8)` 的体数据中放置一个边长为 `edge`, 起点为 `from` 的立方体.
    fn cube(from: (usize, usize, usize), edge: usize, spacing: [f32; 3]) -> CtLabel {
        let mut data = Array3::<u8>::zeros((8, 8, 8));
        let (z, h, w) = from;
        data.slice_mut(s![z..z + edge, h..h + edge, w..w + edge])
            .fill(1);
        CtLabel::new(data, spacing)
    }

    #[test]
    fn test_contour_of_cube() {
        let c = label_contour(cube((2, 2, 2), 3, [1.0; 3]).data());
        // 3x3x3 的立方体只有中心不是轮廓.
        assert_eq!(c.iter().filter(|v| **v).count(), 26);
        assert!(!c[(3, 3, 3)]);
        assert!(c[(2, 3, 3)]);
        assert!(!c[(0, 0, 0)]);
    }

    #[test]
    fn test_contour_touching_border() {
        let data = Array3::<u8>::ones((1, 3, 3));
        let c = label_contour(data.view());
        assert!(c.iter().all(|v| *v));
    }

    #[test]
    fn test_identical_labels() {
        let g = cube((2, 2, 2), 3, [1.0; 3]);
        let sd = SurfaceDistance::compute(&g, &g.clone()).unwrap();
        assert_eq!(sd.distances().len(), 52);
        assert_eq!(sd.mean(), Some(0.0));
        assert_eq!(sd.hausdorff(), Some(0.0));
        assert_eq!(sd.std(), Some(0.0));
    }

    /// 沿 z 方向平移一个体素, Hausdorff 距离即为 z 方向体素分辨率.
    #[test]
    fn test_shifted_cube() {
        let spacing = [2.0, 0.5, 0.5];
        let g = cube((2, 2, 2), 3, spacing);
        let p = cube((3, 2, 2), 3, spacing);
        let sd = SurfaceDistance::compute(&g, &p).unwrap();

        assert!(sd.is_defined());
        assert!(f64_eq(sd.hausdorff().unwrap(), 2.0));
        assert!(sd.mean().unwrap() > 0.0);
        assert!(sd.mean().unwrap() < 2.0);
        assert!(sd.median().unwrap() <= sd.hausdorff_95().unwrap());
        assert!(sd.hausdorff_95().unwrap() <= sd.hausdorff().unwrap());

        // 对称性.
        let rev = SurfaceDistance::compute(&p, &g).unwrap();
        assert!(f64_eq(rev.mean().unwrap(), sd.mean().unwrap()));
        assert!(f64_eq(rev.hausdorff().unwrap(), sd.hausdorff().unwrap()));
    }

    #[test]
    fn test_single_voxels() {
        let mut a = Array3::<u8>::zeros((1, 1, 5));
        let mut b = a.clone();
        a[(0, 0, 0)] = 1;
        b[(0, 0, 4)] = 1;
        let g = CtLabel::new(a, [1.0, 1.0, 1.5]);
        let p = CtLabel::new(b, [1.0, 1.0, 1.5]);
        let sd = SurfaceDistance::compute(&g, &p).unwrap();
        assert_eq!(sd.distances(), &[6.0, 6.0]);
        assert_eq!(sd.mean(), Some(6.0));
        assert_eq!(sd.median(), Some(6.0));
        assert_eq!(sd.percentile(0.0), Some(6.0));
    }

    #[test]
    fn test_empty_contours() {
        let empty = CtLabel::new(Array3::zeros((8, 8, 8)), [1.0; 3]);
        let sd = SurfaceDistance::compute(&empty, &empty).unwrap();
        assert!(sd.is_defined());
        assert_eq!(sd.mean(), Some(0.0));
        assert_eq!(sd.hausdorff(), Some(0.0));

        let g = cube((1, 1, 1), 2, [1.0; 3]);
        let sd = SurfaceDistance::compute(&g, &empty).unwrap();
        assert!(!sd.is_defined());
        assert_eq!(sd.reference_surface(), 8);
        assert_eq!(sd.prediction_surface(), 0);
        assert_eq!(sd.mean(), None);
        assert_eq!(sd.std(), None);
        assert_eq!(sd.hausdorff_95(), None);
    }

    #[test]
    fn test_spacing_mismatch() {
        let g = cube((1, 1, 1), 2, [1.0; 3]);
        let p = cube((1, 1, 1), 2, [1.0, 1.0, 1.2]);
        assert!(matches!(
            SurfaceDistance::compute(&g, &p),
            Err(BerryError::SpacingMismatch(..))
        ));

        // 微小的浮点误差可以接受.
        let p = cube((1, 1, 1), 2, [1.0, 1.0, 1.0000001]);
        assert!(SurfaceDistance::compute(&g, &p).is_ok());
    }
}
