//! 带不确定度的物理量
//!
//! 每个物理量都是 (标称值, 标准不确定度) 对，算术运算按一阶线性误差传递合成不确定度。
//! 操作数之间视为相互独立：
//!
//! - 加减：σ² = σa² + σb²
//! - 乘除：按偏导数加权后平方和开根
//! - 幂、开方：σ = |f'(a)| · σa
//!
//! 与纯数 `f64` 的运算把纯数视为精确值（无不确定度）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 带标准不确定度的物理量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// 标称值
    pub value: f64,
    /// 标准不确定度（恒为非负）
    pub uncertainty: f64,
}

impl Measurement {
    /// 创建新的测量值（不确定度取绝对值）
    #[inline]
    pub fn new(value: f64, uncertainty: f64) -> Self {
        Self {
            value,
            uncertainty: uncertainty.abs(),
        }
    }

    /// 创建精确值（不确定度为0）
    #[inline]
    pub const fn exact(value: f64) -> Self {
        Self {
            value,
            uncertainty: 0.0,
        }
    }

    /// 整数次幂：σ = |n · x^(n-1)| · σx
    pub fn powi(self, n: i32) -> Self {
        let derivative = if n == 0 {
            0.0
        } else {
            n as f64 * self.value.powi(n - 1)
        };
        Self::new(self.value.powi(n), derivative * self.uncertainty)
    }

    /// 平方根：σ = σx / (2√x)
    ///
    /// 负标称值会得到 NaN，调用方负责在此之前校验定义域。
    pub fn sqrt(self) -> Self {
        let root = self.value.sqrt();
        let uncertainty = if root == 0.0 {
            if self.uncertainty == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.uncertainty / (2.0 * root)
        };
        Self::new(root, uncertainty)
    }

    /// 绝对值（不确定度不变）
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.value.abs(), self.uncertainty)
    }

    /// 标称值是否为负
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.value < 0.0
    }

    /// 标称值与不确定度是否都是有限数
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.uncertainty.is_finite()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*e} ± {:.*e}", p, self.value, p, self.uncertainty),
            None => write!(f, "{:e} ± {:e}", self.value, self.uncertainty),
        }
    }
}

// ==================== 测量值之间的运算 ====================

impl Add for Measurement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.value + rhs.value,
            self.uncertainty.hypot(rhs.uncertainty),
        )
    }
}

impl Sub for Measurement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.value - rhs.value,
            self.uncertainty.hypot(rhs.uncertainty),
        )
    }
}

impl Mul for Measurement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        // ∂(ab)/∂a = b, ∂(ab)/∂b = a
        let da = rhs.value * self.uncertainty;
        let db = self.value * rhs.uncertainty;
        Self::new(self.value * rhs.value, da.hypot(db))
    }
}

impl Div for Measurement {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        // ∂(a/b)/∂a = 1/b, ∂(a/b)/∂b = -a/b²
        let da = self.uncertainty / rhs.value;
        let db = self.value * rhs.uncertainty / (rhs.value * rhs.value);
        Self::new(self.value / rhs.value, da.hypot(db))
    }
}

impl Neg for Measurement {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.value, self.uncertainty)
    }
}

// ==================== 与精确纯数的运算 ====================

impl Mul<f64> for Measurement {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.value * rhs, self.uncertainty * rhs)
    }
}

impl Div<f64> for Measurement {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.value / rhs, self.uncertainty / rhs)
    }
}

impl Mul<Measurement> for f64 {
    type Output = Measurement;

    fn mul(self, rhs: Measurement) -> Measurement {
        rhs * self
    }
}

impl Div<Measurement> for f64 {
    type Output = Measurement;

    fn div(self, rhs: Measurement) -> Measurement {
        Measurement::exact(self) / rhs
    }
}

impl Sum for Measurement {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Measurement::exact(0.0), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Measurement> for Measurement {
    fn sum<I: Iterator<Item = &'a Measurement>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
