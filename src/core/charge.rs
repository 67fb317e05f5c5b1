//! 电荷推断引擎
//!
//! 由下落/上升终端速度求油滴半径、质量与电荷（Stokes定律 + Cunningham滑移修正）：
//!
//! ```text
//! E = U / d
//! a = sqrt((b/2p)² + 9ηv_f/(2gρ)) - b/2p
//! m = 4πa³ρ / 3
//! q = -(m·g·|v_f - v_r|) / (E·v_f)
//! ```
//!
//! 符号/一致性判定（顺序固定）：
//! 1. `v_fall < 0` 且 `v_rise > 0`：输入方向颠倒，两者互换
//! 2. `v_rise` 严格落在 `(v_f - tol·v_f, v_f + tol·v_f)` 内：返回 `valid=false`
//! 3. 否则两者均为负：用 `|v_fall|` 重新计算，返回 `valid=false`
//! 4. 其他情况：返回 `valid=true`
//!
//! `valid=false` 只是下游量子化统计的排除标记，不代表运行时错误。

use super::measurement::Measurement;
use crate::error::{MillikanError, MillikanResult, calculation_error};
use crate::tools::constants::{defaults, physics};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 实验物理常量（不可变，整体传入引擎）
///
/// 反序列化时缺省字段取实验室默认值（23°C，实测气压与极板参数）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// 空气平均自由程修正系数 b（Pa·m）
    pub slip_coefficient: f64,
    /// 重力加速度（m/s²）
    pub gravity: f64,
    /// 空气黏度 η（N·s/m²）
    pub air_viscosity: Measurement,
    /// 油密度 ρ（kg/m³）
    pub oil_density: Measurement,
    /// 腔室气压（hPa）
    pub pressure_hpa: Measurement,
    /// 极板电势差（V）
    pub plate_potential: Measurement,
    /// 极板间距（英寸，游标卡尺读数）
    pub plate_spacing_in: Measurement,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            slip_coefficient: 0.0082,
            gravity: 9.80665,
            air_viscosity: Measurement::new(1.84e-5, 4e-7),
            oil_density: Measurement::new(863.4, 10.2),
            pressure_hpa: Measurement::new(1025.26, 0.1),
            plate_potential: Measurement::new(498.0, 2.0),
            plate_spacing_in: Measurement::new(0.30, 0.001),
        }
    }
}

impl PhysicalConstants {
    /// 气压（Pa）
    #[inline]
    pub fn pressure_pa(&self) -> Measurement {
        self.pressure_hpa * 100.0
    }

    /// 极板间距（m）
    #[inline]
    pub fn plate_spacing_m(&self) -> Measurement {
        self.plate_spacing_in * physics::METERS_PER_INCH
    }

    /// 极板间电场强度 E = U/d（V/m）
    #[inline]
    pub fn electric_field(&self) -> Measurement {
        self.plate_potential / self.plate_spacing_m()
    }

    /// 校验常量是否可用于计算
    pub fn validate(&self) -> MillikanResult<()> {
        let positive = [
            ("slip_coefficient", self.slip_coefficient),
            ("gravity", self.gravity),
            ("air_viscosity", self.air_viscosity.value),
            ("oil_density", self.oil_density.value),
            ("pressure_hpa", self.pressure_hpa.value),
            ("plate_potential", self.plate_potential.value),
            ("plate_spacing_in", self.plate_spacing_in.value),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MillikanError::InvalidInput(format!(
                    "物理常量 {name} 必须为正数: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// 单个油滴的半径、质量与电荷
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropletEstimate {
    /// 有效半径（m）
    pub radius: Measurement,
    /// 质量（kg）
    pub mass: Measurement,
    /// 电荷（C）
    pub charge: Measurement,
}

/// 一致性判定走过的分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargeBranch {
    /// 上升速度落在下落速度的容差带内
    WithinTolerance,
    /// 两个速度均为负，使用 |v_fall| 重新计算
    BothNegative,
    /// 常规观测
    Regular,
}

impl ChargeBranch {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WithinTolerance => "tolerance",
            Self::BothNegative => "both-negative",
            Self::Regular => "regular",
        }
    }
}

/// 电荷推断结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChargeResult {
    /// false 表示应从量子化统计中排除
    pub is_valid: bool,
    /// 电荷（C）
    pub charge: Measurement,
    /// 半径、质量与电荷
    pub droplet: DropletEstimate,
    /// 判定分支
    pub branch: ChargeBranch,
    /// 是否发生了下落/上升互换
    pub swapped: bool,
    /// 互换后的下落速度
    pub v_fall: Measurement,
    /// 互换后的上升速度
    pub v_rise: Measurement,
}

impl ChargeResult {
    /// 以元电荷为单位的电荷标称值
    #[inline]
    pub fn elementary_multiple(&self) -> f64 {
        self.charge.value / physics::ELEMENTARY_CHARGE
    }
}

/// 电荷推断引擎
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeEngine {
    constants: PhysicalConstants,
    tolerance: f64,
}

impl Default for ChargeEngine {
    fn default() -> Self {
        Self {
            constants: PhysicalConstants::default(),
            tolerance: defaults::TOLERANCE,
        }
    }
}

impl ChargeEngine {
    /// 创建引擎
    ///
    /// # 参数
    ///
    /// * `constants` - 物理常量
    /// * `tolerance` - 容差比例（默认0.2），必须为非负有限数
    pub fn new(constants: PhysicalConstants, tolerance: f64) -> MillikanResult<Self> {
        constants.validate()?;
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(MillikanError::InvalidInput(format!(
                "容差比例必须为非负数: {tolerance}"
            )));
        }
        Ok(Self {
            constants,
            tolerance,
        })
    }

    #[inline]
    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 闭式求解半径、质量与电荷（不做符号判定）
    pub fn droplet(&self, v_fall: Measurement, v_rise: Measurement) -> MillikanResult<DropletEstimate> {
        let c = &self.constants;

        if v_fall.value == 0.0 {
            return Err(calculation_error("下落速度为零", "电荷公式分母为零"));
        }

        let b_over_2p = c.slip_coefficient / (2.0 * c.pressure_pa());
        let stokes_term = 9.0 * c.air_viscosity * v_fall / (2.0 * c.gravity * c.oil_density);
        let radicand = b_over_2p.powi(2) + stokes_term;
        if radicand.is_negative() {
            return Err(calculation_error(
                "半径根号项为负",
                format!("v_fall = {:e} m/s", v_fall.value),
            ));
        }

        let radius = radicand.sqrt() - b_over_2p;
        let mass = 4.0 * PI * radius.powi(3) * c.oil_density / 3.0;
        let charge = -(mass * c.gravity * (v_fall - v_rise).abs()) / (c.electric_field() * v_fall);

        if !charge.is_finite() {
            return Err(calculation_error(
                "电荷结果非有限数",
                format!("v_fall = {:e}, v_rise = {:e}", v_fall.value, v_rise.value),
            ));
        }

        Ok(DropletEstimate {
            radius,
            mass,
            charge,
        })
    }

    /// 对一对相位速度执行符号/一致性判定并计算电荷
    pub fn infer(&self, v_fall: Measurement, v_rise: Measurement) -> MillikanResult<ChargeResult> {
        let swapped = v_fall.is_negative() && v_rise.value > 0.0;
        let (v_fall, v_rise) = if swapped {
            (v_rise, v_fall)
        } else {
            (v_fall, v_rise)
        };

        let band_min = v_fall.value - self.tolerance * v_fall.value;
        let band_max = v_fall.value + self.tolerance * v_fall.value;
        let within_tolerance = v_rise.value > band_min && v_rise.value < band_max;

        let (is_valid, branch, droplet) = if within_tolerance {
            (false, ChargeBranch::WithinTolerance, self.droplet(v_fall, v_rise)?)
        } else if v_fall.is_negative() && v_rise.is_negative() {
            (false, ChargeBranch::BothNegative, self.droplet(v_fall.abs(), v_rise)?)
        } else {
            (true, ChargeBranch::Regular, self.droplet(v_fall, v_rise)?)
        };

        Ok(ChargeResult {
            is_valid,
            charge: droplet.charge,
            droplet,
            branch,
            swapped,
            v_fall,
            v_rise,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ChargeEngine {
        ChargeEngine::default()
    }

    #[test]
    fn test_electric_field() {
        let e = PhysicalConstants::default().electric_field();
        assert!((e.value - 498.0 / 0.00762).abs() < 1e-6);
        assert!(e.uncertainty > 0.0);
    }

    #[test]
    fn test_realistic_droplet() {
        let result = engine()
            .infer(Measurement::new(1e-4, 1e-6), Measurement::new(-5e-5, 1e-6))
            .unwrap();

        assert!(result.is_valid);
        assert_eq!(result.branch, ChargeBranch::Regular);
        assert!(!result.swapped);

        // 约 4.35 个元电荷的负电荷
        assert!(result.charge.value < 0.0);
        let multiple = result.elementary_multiple().abs();
        assert!(multiple > 4.0 && multiple < 4.7, "元电荷倍数 {multiple}");

        // 半径约 0.95 μm
        let radius = result.droplet.radius.value;
        assert!(radius > 9.0e-7 && radius < 1.0e-6, "半径 {radius}");
        assert!(result.charge.uncertainty > 0.0);
    }

    #[test]
    fn test_sign_swap_is_symmetric() {
        let e = engine();
        let reversed = e
            .infer(Measurement::new(-5.0, 0.1), Measurement::new(3.0, 0.1))
            .unwrap();
        let ordered = e
            .infer(Measurement::new(3.0, 0.1), Measurement::new(-5.0, 0.1))
            .unwrap();

        assert!(reversed.swapped);
        assert!(!ordered.swapped);
        assert_eq!(reversed.charge.value, ordered.charge.value);
        assert_eq!(reversed.is_valid, ordered.is_valid);
        assert_eq!(reversed.v_fall, ordered.v_fall);
    }

    #[test]
    fn test_within_tolerance_flags_invalid() {
        let result = engine()
            .infer(Measurement::exact(10.0), Measurement::exact(10.5))
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.branch, ChargeBranch::WithinTolerance);
    }

    #[test]
    fn test_tolerance_band_is_open() {
        // 恰好落在边界上不算容差内
        let e = ChargeEngine::new(PhysicalConstants::default(), 0.25).unwrap();
        let result = e
            .infer(Measurement::exact(8.0), Measurement::exact(10.0))
            .unwrap();
        assert_eq!(result.branch, ChargeBranch::Regular);
        assert!(result.is_valid);
    }

    #[test]
    fn test_both_negative_uses_abs_fall() {
        let e = engine();
        let v_fall = Measurement::new(-2e-4, 1e-6);
        let v_rise = Measurement::new(-1e-4, 1e-6);
        let result = e.infer(v_fall, v_rise).unwrap();

        assert!(!result.is_valid);
        assert_eq!(result.branch, ChargeBranch::BothNegative);

        let expected = e.droplet(v_fall.abs(), v_rise).unwrap();
        assert_eq!(result.charge, expected.charge);
        assert!(result.charge.value < 0.0);
    }

    #[test]
    fn test_degenerate_velocities_are_errors() {
        let e = engine();
        assert!(matches!(
            e.infer(Measurement::exact(0.0), Measurement::exact(-1e-4)),
            Err(MillikanError::CalculationError(_))
        ));
        // 负下落速度 + 零上升速度：根号项为负
        assert!(matches!(
            e.infer(Measurement::exact(-1e-3), Measurement::exact(0.0)),
            Err(MillikanError::CalculationError(_))
        ));
    }

    #[test]
    fn test_invalid_engine_configuration() {
        assert!(ChargeEngine::new(PhysicalConstants::default(), -0.1).is_err());
        assert!(ChargeEngine::new(PhysicalConstants::default(), f64::NAN).is_err());

        let broken = PhysicalConstants {
            gravity: 0.0,
            ..PhysicalConstants::default()
        };
        assert!(ChargeEngine::new(broken, 0.2).is_err());
    }

    #[test]
    fn test_partial_constants_override() {
        let json = r#"{ "pressure_hpa": { "value": 1013.25, "uncertainty": 0.5 } }"#;
        let constants: PhysicalConstants = serde_json::from_str(json).unwrap();
        assert_eq!(constants.pressure_hpa.value, 1013.25);
        assert_eq!(constants.gravity, 9.80665);
    }
}
