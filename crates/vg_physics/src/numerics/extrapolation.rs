// crates/vg_physics/src/numerics/extrapolation.rs

//! 标记引导的区域外插
//!
//! 将有效区域（marker == 1）的场值逐层漫灌到无效区域（marker == 0），
//! 供求解器把流体侧的值推入碰撞体遮挡单元，避免差分/插值模板
//! 采到陈旧的碰撞体内部值。

use super::array3::Array3;
use super::value::GridValue;

/// 有效单元标记
const ACTIVE: u8 = 1;

/// 向无效区域外插场值
///
/// 每一轮把与有效单元相邻的无效单元设为其有效 6 邻域的平均值并
/// 标记为有效，共进行 `depth` 轮；超出该深度的单元保持输入值不变。
///
/// # 约定
///
/// - `marker`: 0 = 阻塞（待外插），1 = 有效
/// - 三个数组尺寸必须一致
///
/// # Panics
/// 尺寸不一致
pub fn extrapolate_to_region<T: GridValue>(
    input: &Array3<T>,
    marker: &Array3<u8>,
    depth: u32,
    output: &mut Array3<T>,
) {
    let size = input.size();
    assert_eq!(size, marker.size(), "marker 尺寸必须与 input 一致");
    assert_eq!(size, output.size(), "output 尺寸必须与 input 一致");

    let mut valid0 = marker.clone();
    let mut valid1 = marker.clone();

    // 初始：输出取输入值
    output
        .data_mut()
        .iter_mut()
        .zip(input.data().iter())
        .for_each(|(o, &i)| *o = i);

    for _ in 0..depth {
        valid0.for_each_index(|i, j, k| {
            if valid0[(i, j, k)] == ACTIVE {
                valid1[(i, j, k)] = ACTIVE;
                return;
            }

            let mut sum = T::ZERO;
            let mut count = 0u32;

            if i + 1 < size.x && valid0[(i + 1, j, k)] == ACTIVE {
                sum = sum.add(output[(i + 1, j, k)]);
                count += 1;
            }
            if i > 0 && valid0[(i - 1, j, k)] == ACTIVE {
                sum = sum.add(output[(i - 1, j, k)]);
                count += 1;
            }
            if j + 1 < size.y && valid0[(i, j + 1, k)] == ACTIVE {
                sum = sum.add(output[(i, j + 1, k)]);
                count += 1;
            }
            if j > 0 && valid0[(i, j - 1, k)] == ACTIVE {
                sum = sum.add(output[(i, j - 1, k)]);
                count += 1;
            }
            if k + 1 < size.z && valid0[(i, j, k + 1)] == ACTIVE {
                sum = sum.add(output[(i, j, k + 1)]);
                count += 1;
            }
            if k > 0 && valid0[(i, j, k - 1)] == ACTIVE {
                sum = sum.add(output[(i, j, k - 1)]);
                count += 1;
            }

            if count > 0 {
                output[(i, j, k)] = sum.scale(1.0 / count as f64);
                valid1[(i, j, k)] = ACTIVE;
            } else {
                valid1[(i, j, k)] = 0;
            }
        });
        valid0.swap(&mut valid1);
    }
}
