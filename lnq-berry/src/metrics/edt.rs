//! 精确欧氏距离变换.
//!
//! 按 w, h, z 三个方向依次做一维平方距离变换 (抛物线下包络),
//! 每个方向上各条 lane 相互独立. 开启 `rayon` 时并行处理.

use ndarray::{Array3, ArrayView3, ArrayViewMut1, Axis, Zip};

/// 计算每个体素到最近 `site` 体素的欧氏距离 (毫米).
///
/// `spacing` 按 \[z, h, w\] 给出体素分辨率. 若不存在任何 `site`, 所有距离均为
/// `f64::INFINITY`.
pub fn distance_map(sites: ArrayView3<'_, bool>, spacing: [f64; 3]) -> Array3<f64> {
    let mut f = sites.map(|s| if *s { 0.0 } else { f64::INFINITY });

    // 先 w 后 h 再 z.
    for axis in (0..3).rev() {
        squared_edt_along(&mut f, axis, spacing[axis]);
    }
    f.mapv_inplace(f64::sqrt);
    f
}

/// 沿 `axis` 方向对每条 lane 做一维平方距离变换.
fn squared_edt_along(f: &mut Array3<f64>, axis: usize, spacing: f64) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            Zip::from(f.lanes_mut(Axis(axis)))
                .par_for_each(|lane| squared_edt_lane(lane, spacing));
        } else {
            Zip::from(f.lanes_mut(Axis(axis)))
                .for_each(|lane| squared_edt_lane(lane, spacing));
        }
    }
}

/// 一维平方距离变换: `d(p) = min_q ((p - q) * spacing)^2 + f(q)`.
///
/// 只有有限值参与下包络. 若整条 lane 都是无穷, 保持不变.
fn squared_edt_lane(mut lane: ArrayViewMut1<'_, f64>, spacing: f64) {
    let f: Vec<f64> = lane.iter().copied().collect();
    let n = f.len();

    // 下包络中的抛物线顶点 (索引) 和相邻抛物线的分界 (物理坐标).
    let mut v: Vec<usize> = Vec::with_capacity(n);
    let mut z: Vec<f64> = Vec::with_capacity(n + 1);

    let pos = |i: usize| i as f64 * spacing;
    let intersect = |p: usize, q: usize| {
        let (xp, xq) = (pos(p), pos(q));
        ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp))
    };

    for q in (0..n).filter(|q| f[*q].is_finite()) {
        loop {
            let Some(&top) = v.last() else {
                v.push(q);
                z.push(f64::NEG_INFINITY);
                break;
            };
            let s = intersect(top, q);
            if s <= *z.last().unwrap_or(&f64::NEG_INFINITY) {
                v.pop();
                z.pop();
                continue;
            }
            v.push(q);
            z.push(s);
            break;
        }
    }
    if v.is_empty() {
        return;
    }
    z.push(f64::INFINITY);

    let mut k = 0;
    for (i, out) in lane.iter_mut().enumerate() {
        let x = pos(i);
        while z[k + 1] < x {
            k += 1;
        }
        let d = x - pos(v[k]);
        *out = d * d + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::distance_map;
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 暴力计算到最近 site 的距离.
    fn brute_force(sites: &Array3<bool>, spacing: [f64; 3]) -> Array3<f64> {
        let points: Vec<_> = sites
            .indexed_iter()
            .filter_map(|(p, s)| s.then_some(p))
            .collect();
        Array3::from_shape_fn(sites.dim(), |(z, h, w)| {
            points
                .iter()
                .map(|&(pz, ph, pw)| {
                    let dz = (z as f64 - pz as f64) * spacing[0];
                    let dh = (h as f64 - ph as f64) * spacing[1];
                    let dw = (w as f64 - pw as f64) * spacing[2];
                    (dz * dz + dh * dh + dw * dw).sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
    }

    #[test]
    fn test_single_site() {
        let mut sites = Array3::from_elem((3, 4, 5), false);
        sites[(1, 2, 3)] = true;
        let d = distance_map(sites.view(), [1.0, 1.0, 1.0]);
        assert!(f64_eq(d[(1, 2, 3)], 0.0));
        assert!(f64_eq(d[(1, 2, 4)], 1.0));
        assert!(f64_eq(d[(0, 2, 3)], 1.0));
        assert!(f64_eq(d[(0, 0, 0)], (1.0f64 + 4.0 + 9.0).sqrt()));
    }

    #[test]
    fn test_no_site() {
        let sites = Array3::from_elem((2, 2, 2), false);
        let d = distance_map(sites.view(), [1.0, 1.0, 1.0]);
        assert!(d.iter().all(|v| v.is_infinite()));
    }

    /// 在各向异性体素上与暴力算法比对.
    #[test]
    fn test_matches_brute_force_anisotropic() {
        let spacing = [2.5, 0.8, 0.6];
        let sites =
            Array3::from_shape_fn((5, 7, 6), |(z, h, w)| (z * 31 + h * 17 + w * 7) % 23 == 0);
        assert!(sites.iter().any(|s| *s));

        let fast = distance_map(sites.view(), spacing);
        let slow = brute_force(&sites, spacing);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!(f64_eq(*a, *b), "{a} != {b}");
        }
    }

    #[test]
    fn test_all_sites() {
        let sites = Array3::from_elem((2, 3, 2), true);
        let d = distance_map(sites.view(), [3.0, 1.0, 1.0]);
        assert!(d.iter().all(|v| *v == 0.0));
    }
}
