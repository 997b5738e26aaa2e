// crates/vg_physics/src/numerics/level_set.rs

//! 符号距离场辅助函数
//!
//! 约定：负值在界面内部，正值在外部。

/// 点是否位于符号距离场内部
#[inline]
pub fn is_inside_sdf(phi: f64) -> bool {
    phi < 0.0
}

/// 线段两端 SDF 值给出的内部占比
///
/// 返回 [0, 1]：两端均在内部为 1，均在外部为 0，
/// 跨越界面时按线性过零点给出分数。
#[inline]
pub fn fraction_inside_sdf(phi0: f64, phi1: f64) -> f64 {
    if is_inside_sdf(phi0) && is_inside_sdf(phi1) {
        1.0
    } else if is_inside_sdf(phi0) && !is_inside_sdf(phi1) {
        phi0 / (phi0 - phi1)
    } else if !is_inside_sdf(phi0) && is_inside_sdf(phi1) {
        phi1 / (phi1 - phi0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_inside() {
        assert!(is_inside_sdf(-0.1));
        assert!(!is_inside_sdf(0.0));
        assert!(!is_inside_sdf(0.1));
    }

    #[test]
    fn test_fraction_inside() {
        assert_eq!(fraction_inside_sdf(-1.0, -1.0), 1.0);
        assert_eq!(fraction_inside_sdf(1.0, 1.0), 0.0);
        // 界面恰在中点
        assert!((fraction_inside_sdf(-0.5, 0.5) - 0.5).abs() < 1e-14);
        assert!((fraction_inside_sdf(0.5, -0.5) - 0.5).abs() < 1e-14);
        // 非对称跨越
        assert!((fraction_inside_sdf(-1.0, 3.0) - 0.25).abs() < 1e-14);
    }
}
