// crates/vg_physics/src/numerics/samplers.rs

//! 数组插值采样器
//!
//! 将连续的世界坐标点映射为网格数据的插值结果。采样器是廉价的
//! 借用值对象，由网格视图按需构造：底层数组或几何一旦变化，
//! 旧采样器随借用一起失效，不存在陈旧采样器。
//!
//! # 采样器
//!
//! - [`NearestArraySampler3`]: 最近邻（归一化坐标四舍五入并钳制）
//! - [`LinearArraySampler3`]: 三线性（(1-f, f) 张量积权重），
//!   同时导出角点权重与权重梯度供模板构造使用
//! - [`CubicArraySampler3`]: 单调 Catmull-Rom，沿 x→y→z 逐维可分
//!
//! 所有采样器在边界外按钳制外推，不会失败；非正网格间距为
//! 前置条件违反（断言）。

use glam::DVec3;

use super::array3::Array3;
use super::value::GridValue;

/// 重心坐标分解
///
/// 将归一化坐标 `x` 分解为基准索引与小数权重，索引钳制到
/// `[i_low, i_high - 1]`，界外查询退化为边界值（f 钳为 0 或 1）。
#[inline]
pub fn get_barycentric(x: f64, i_low: usize, i_high: usize) -> (usize, f64) {
    if i_low >= i_high {
        return (i_low, 0.0);
    }
    let s = x.floor();
    let i = s as i64;
    let f = x - s;

    let low = i_low as i64;
    let high = i_high as i64;
    if i < low {
        (i_low, 0.0)
    } else if i >= high {
        (i_high - 1, 1.0)
    } else {
        (i as usize, f)
    }
}

fn assert_positive_spacing(grid_spacing: DVec3) {
    assert!(
        grid_spacing.x > 0.0 && grid_spacing.y > 0.0 && grid_spacing.z > 0.0,
        "网格间距必须严格为正: {:?}",
        grid_spacing
    );
}

// ============================================================
// 最近邻采样器
// ============================================================

/// 最近邻采样器
pub struct NearestArraySampler3<'a, T: GridValue> {
    grid: &'a Array3<T>,
    inv_grid_spacing: DVec3,
    origin: DVec3,
}

impl<'a, T: GridValue> NearestArraySampler3<'a, T> {
    /// 构造采样器
    ///
    /// # Panics
    /// 网格间距非正
    pub fn new(grid: &'a Array3<T>, grid_spacing: DVec3, origin: DVec3) -> Self {
        assert_positive_spacing(grid_spacing);
        Self {
            grid,
            inv_grid_spacing: 1.0 / grid_spacing,
            origin,
        }
    }

    /// 采样
    pub fn sample(&self, pt: DVec3) -> T {
        let size = self.grid.size();
        let normalized = (pt - self.origin) * self.inv_grid_spacing;
        let i = (normalized.x.round().max(0.0) as usize).min(size.x - 1);
        let j = (normalized.y.round().max(0.0) as usize).min(size.y - 1);
        let k = (normalized.z.round().max(0.0) as usize).min(size.z - 1);
        self.grid[(i, j, k)]
    }
}

// ============================================================
// 三线性采样器
// ============================================================

/// 三线性采样器
pub struct LinearArraySampler3<'a, T: GridValue> {
    grid: &'a Array3<T>,
    grid_spacing: DVec3,
    inv_grid_spacing: DVec3,
    origin: DVec3,
}

impl<'a, T: GridValue> LinearArraySampler3<'a, T> {
    /// 构造采样器
    ///
    /// # Panics
    /// 网格间距非正
    pub fn new(grid: &'a Array3<T>, grid_spacing: DVec3, origin: DVec3) -> Self {
        assert_positive_spacing(grid_spacing);
        Self {
            grid,
            grid_spacing,
            inv_grid_spacing: 1.0 / grid_spacing,
            origin,
        }
    }

    #[inline]
    fn barycentric(&self, pt: DVec3) -> ((usize, usize, usize), DVec3) {
        let size = self.grid.size();
        let normalized = (pt - self.origin) * self.inv_grid_spacing;
        let (i, fx) = get_barycentric(normalized.x, 0, size.x - 1);
        let (j, fy) = get_barycentric(normalized.y, 0, size.y - 1);
        let (k, fz) = get_barycentric(normalized.z, 0, size.z - 1);
        ((i, j, k), DVec3::new(fx, fy, fz))
    }

    /// 采样
    pub fn sample(&self, pt: DVec3) -> T {
        let size = self.grid.size();
        let ((i, j, k), f) = self.barycentric(pt);
        let ip = (i + 1).min(size.x - 1);
        let jp = (j + 1).min(size.y - 1);
        let kp = (k + 1).min(size.z - 1);

        let g = self.grid;
        let lerp = |a: T, b: T, t: f64| a.scale(1.0 - t).add(b.scale(t));

        let v00 = lerp(g[(i, j, k)], g[(ip, j, k)], f.x);
        let v10 = lerp(g[(i, jp, k)], g[(ip, jp, k)], f.x);
        let v01 = lerp(g[(i, j, kp)], g[(ip, j, kp)], f.x);
        let v11 = lerp(g[(i, jp, kp)], g[(ip, jp, kp)], f.x);
        let v0 = lerp(v00, v10, f.y);
        let v1 = lerp(v01, v11, f.y);
        lerp(v0, v1, f.z)
    }

    /// 角点坐标与三线性权重
    ///
    /// 返回 8 个角点索引及其对应权重（权重和为 1）。
    pub fn coordinates_and_weights(
        &self,
        pt: DVec3,
    ) -> ([(usize, usize, usize); 8], [f64; 8]) {
        let size = self.grid.size();
        let ((i, j, k), f) = self.barycentric(pt);
        let ip = (i + 1).min(size.x - 1);
        let jp = (j + 1).min(size.y - 1);
        let kp = (k + 1).min(size.z - 1);

        let indices = [
            (i, j, k),
            (ip, j, k),
            (i, jp, k),
            (ip, jp, k),
            (i, j, kp),
            (ip, j, kp),
            (i, jp, kp),
            (ip, jp, kp),
        ];
        let weights = [
            (1.0 - f.x) * (1.0 - f.y) * (1.0 - f.z),
            f.x * (1.0 - f.y) * (1.0 - f.z),
            (1.0 - f.x) * f.y * (1.0 - f.z),
            f.x * f.y * (1.0 - f.z),
            (1.0 - f.x) * (1.0 - f.y) * f.z,
            f.x * (1.0 - f.y) * f.z,
            (1.0 - f.x) * f.y * f.z,
            f.x * f.y * f.z,
        ];
        (indices, weights)
    }

    /// 角点坐标与权重梯度
    ///
    /// 权重对世界坐标的梯度，用于构造水平集类求解器的差分模板。
    pub fn coordinates_and_gradient_weights(
        &self,
        pt: DVec3,
    ) -> ([(usize, usize, usize); 8], [DVec3; 8]) {
        let size = self.grid.size();
        let ((i, j, k), f) = self.barycentric(pt);
        let ip = (i + 1).min(size.x - 1);
        let jp = (j + 1).min(size.y - 1);
        let kp = (k + 1).min(size.z - 1);
        let inv = self.inv_grid_spacing;

        let indices = [
            (i, j, k),
            (ip, j, k),
            (i, jp, k),
            (ip, jp, k),
            (i, j, kp),
            (ip, j, kp),
            (i, jp, kp),
            (ip, jp, kp),
        ];
        // d/dx[(1-fx)] = -1/hx, d/dx[fx] = 1/hx，按张量积展开
        let gw = |sx: f64, sy: f64, sz: f64, wx: f64, wy: f64, wz: f64| {
            DVec3::new(
                sx * inv.x * wy * wz,
                sy * inv.y * wx * wz,
                sz * inv.z * wx * wy,
            )
        };
        let weights = [
            gw(-1.0, -1.0, -1.0, 1.0 - f.x, 1.0 - f.y, 1.0 - f.z),
            gw(1.0, -1.0, -1.0, f.x, 1.0 - f.y, 1.0 - f.z),
            gw(-1.0, 1.0, -1.0, 1.0 - f.x, f.y, 1.0 - f.z),
            gw(1.0, 1.0, -1.0, f.x, f.y, 1.0 - f.z),
            gw(-1.0, -1.0, 1.0, 1.0 - f.x, 1.0 - f.y, f.z),
            gw(1.0, -1.0, 1.0, f.x, 1.0 - f.y, f.z),
            gw(-1.0, 1.0, 1.0, 1.0 - f.x, f.y, f.z),
            gw(1.0, 1.0, 1.0, f.x, f.y, f.z),
        ];
        (indices, weights)
    }

    /// 网格间距
    #[inline]
    pub fn grid_spacing(&self) -> DVec3 {
        self.grid_spacing
    }
}

// ============================================================
// 单调三次采样器
// ============================================================

/// 单调 Catmull-Rom 三次采样器
///
/// 沿 x、y、z 逐维做一维单调三次插值（可分张量形式，
/// 非真三维三次），每维取 4 个边界钳制的控制点。
pub struct CubicArraySampler3<'a, T: GridValue> {
    grid: &'a Array3<T>,
    inv_grid_spacing: DVec3,
    origin: DVec3,
}

impl<'a, T: GridValue> CubicArraySampler3<'a, T> {
    /// 构造采样器
    ///
    /// # Panics
    /// 网格间距非正
    pub fn new(grid: &'a Array3<T>, grid_spacing: DVec3, origin: DVec3) -> Self {
        assert_positive_spacing(grid_spacing);
        Self {
            grid,
            inv_grid_spacing: 1.0 / grid_spacing,
            origin,
        }
    }

    /// 采样
    pub fn sample(&self, pt: DVec3) -> T {
        let size = self.grid.size();
        let normalized = (pt - self.origin) * self.inv_grid_spacing;
        let (i, fx) = get_barycentric(normalized.x, 0, size.x - 1);
        let (j, fy) = get_barycentric(normalized.y, 0, size.y - 1);
        let (k, fz) = get_barycentric(normalized.z, 0, size.z - 1);

        let clamp_idx = |v: i64, hi: usize| -> usize {
            v.clamp(0, hi as i64 - 1).max(0) as usize
        };
        let is: [usize; 4] = std::array::from_fn(|n| clamp_idx(i as i64 - 1 + n as i64, size.x));
        let js: [usize; 4] = std::array::from_fn(|n| clamp_idx(j as i64 - 1 + n as i64, size.y));
        let ks: [usize; 4] = std::array::from_fn(|n| clamp_idx(k as i64 - 1 + n as i64, size.z));

        // 先 x，再 y，最后 z
        let mut values_z = [T::ZERO; 4];
        for (zz, &kk) in ks.iter().enumerate() {
            let mut values_y = [T::ZERO; 4];
            for (yy, &jj) in js.iter().enumerate() {
                values_y[yy] = T::monotonic_catmull_rom(
                    self.grid[(is[0], jj, kk)],
                    self.grid[(is[1], jj, kk)],
                    self.grid[(is[2], jj, kk)],
                    self.grid[(is[3], jj, kk)],
                    fx,
                );
            }
            values_z[zz] = T::monotonic_catmull_rom(
                values_y[0], values_y[1], values_y[2], values_y[3], fy,
            );
        }
        T::monotonic_catmull_rom(values_z[0], values_z[1], values_z[2], values_z[3], fz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::size3::Size3;

    fn make_grid() -> Array3<f64> {
        let mut grid = Array3::new(Size3::new(4, 4, 4), 0.0);
        grid.par_for_each_mut(|(i, j, k), v| *v = i as f64 + 2.0 * j as f64 + 4.0 * k as f64);
        grid
    }

    #[test]
    fn test_get_barycentric_clamping() {
        // 界内
        let (i, f) = get_barycentric(1.25, 0, 3);
        assert_eq!(i, 1);
        assert!((f - 0.25).abs() < 1e-14);
        // 下界外
        let (i, f) = get_barycentric(-0.5, 0, 3);
        assert_eq!(i, 0);
        assert_eq!(f, 0.0);
        // 上界外
        let (i, f) = get_barycentric(5.0, 0, 3);
        assert_eq!(i, 2);
        assert_eq!(f, 1.0);
        // 退化域
        let (i, f) = get_barycentric(0.7, 0, 0);
        assert_eq!(i, 0);
        assert_eq!(f, 0.0);
    }

    #[test]
    fn test_linear_exact_at_data_points() {
        // 数据点位置上的线性插值严格等于格点值
        let grid = make_grid();
        let h = glam::DVec3::splat(0.5);
        let origin = glam::DVec3::new(1.0, -1.0, 0.0);
        let sampler = LinearArraySampler3::new(&grid, h, origin);

        grid.for_each_index(|i, j, k| {
            let pt = origin
                + glam::DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z);
            let v = sampler.sample(pt);
            assert_eq!(v, grid[(i, j, k)]);
        });
    }

    #[test]
    fn test_linear_midpoint() {
        let grid = make_grid();
        let sampler =
            LinearArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        // 线性数据中点精确
        let v = sampler.sample(glam::DVec3::new(0.5, 0.5, 0.5));
        assert!((v - (0.5 + 1.0 + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_linear_clamped_extrapolation() {
        let grid = make_grid();
        let sampler =
            LinearArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        // 界外钳制到边界值，不失败
        let v = sampler.sample(glam::DVec3::new(-10.0, -10.0, -10.0));
        assert_eq!(v, grid[(0, 0, 0)]);
        let v = sampler.sample(glam::DVec3::new(10.0, 10.0, 10.0));
        assert_eq!(v, grid[(3, 3, 3)]);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let grid = make_grid();
        let sampler =
            LinearArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        let (_, weights) = sampler.coordinates_and_weights(glam::DVec3::new(1.3, 2.7, 0.4));
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_gradient_weights_sum_to_zero() {
        let grid = make_grid();
        let sampler =
            LinearArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        let (_, gweights) =
            sampler.coordinates_and_gradient_weights(glam::DVec3::new(1.3, 2.7, 0.4));
        let sum = gweights.iter().fold(glam::DVec3::ZERO, |a, &b| a + b);
        assert!(sum.length() < 1e-13);
    }

    #[test]
    fn test_nearest_rounding() {
        let grid = make_grid();
        let sampler =
            NearestArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        assert_eq!(sampler.sample(glam::DVec3::new(1.4, 0.6, 2.2)), grid[(1, 1, 2)]);
        assert_eq!(sampler.sample(glam::DVec3::new(-3.0, 9.0, 0.0)), grid[(0, 3, 0)]);
    }

    #[test]
    fn test_cubic_reproduces_linear_data() {
        // 单调 Catmull-Rom 在线性数据上严格线性
        let grid = make_grid();
        let sampler =
            CubicArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        let pt = glam::DVec3::new(1.5, 1.5, 1.5);
        let expected = 1.5 + 2.0 * 1.5 + 4.0 * 1.5;
        assert!((sampler.sample(pt) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_exact_at_data_points() {
        let grid = make_grid();
        let sampler =
            CubicArraySampler3::new(&grid, glam::DVec3::ONE, glam::DVec3::ZERO);
        grid.for_each_index(|i, j, k| {
            let pt = glam::DVec3::new(i as f64, j as f64, k as f64);
            assert!((sampler.sample(pt) - grid[(i, j, k)]).abs() < 1e-12);
        });
    }

    #[test]
    #[should_panic]
    fn test_degenerate_spacing_asserts() {
        let grid = make_grid();
        let _ = LinearArraySampler3::new(&grid, glam::DVec3::new(0.0, 1.0, 1.0), glam::DVec3::ZERO);
    }
}
