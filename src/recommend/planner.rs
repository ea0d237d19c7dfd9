use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::auth::repo::{Gender, User};
use crate::error::ApiError;
use crate::meals::repo::DietType;

/// Safety floor for the daily calorie target.
pub const MIN_CALORIE_TARGET: i32 = 1200;

/// Calorie window around each bucket target when selecting meals.
pub const BUCKET_KCAL_TOLERANCE: f64 = 0.15;

/// Meals returned per meal-time bucket.
pub const BUCKET_LIMIT: i64 = 10;

const BREAKFAST_SHARE: f64 = 0.20;
const LUNCH_SHARE: f64 = 0.40;
const DINNER_SHARE: f64 = 0.40;

const MIN_PLAUSIBLE_AGE: i32 = 13;
const MAX_PLAUSIBLE_AGE: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Moderate,
    Active,
}

impl ActivityLevel {
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            other => Err(format!(
                "activity_level must be one of 'sedentary' | 'moderate' | 'active', got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn calorie_delta(self) -> i32 {
        match self {
            Goal::Lose => -500,
            Goal::Maintain => 0,
            Goal::Gain => 500,
        }
    }

    pub fn diet_type(self) -> DietType {
        match self {
            Goal::Lose => DietType::WeightLoss,
            Goal::Gain => DietType::WeightGain,
            Goal::Maintain => DietType::EatClean,
        }
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            other => Err(format!(
                "goal must be one of 'lose' | 'maintain' | 'gain', got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiClass {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl fmt::Display for BmiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BmiClass::Underweight => "Underweight",
            BmiClass::Normal => "Normal",
            BmiClass::Overweight => "Overweight",
            BmiClass::Obesity => "Obesity",
        };
        f.write_str(s)
    }
}

/// Per-meal-time calorie allocation, each share rounded independently.
/// The rounding error against the daily target is not reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealBreakdown {
    pub breakfast: i32,
    pub lunch: i32,
    pub dinner: i32,
}

/// Energy side of a computed plan, before meal selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyPlan {
    pub bmi: f64,
    pub bmi_class: BmiClass,
    pub bmr: i32,
    pub tdee: i32,
    pub calorie_target: i32,
    pub breakdown: MealBreakdown,
    pub diet_type: DietType,
}

pub fn classify_bmi(bmi: f64) -> BmiClass {
    if bmi < 18.5 {
        BmiClass::Underweight
    } else if bmi < 25.0 {
        BmiClass::Normal
    } else if bmi < 30.0 {
        BmiClass::Overweight
    } else {
        BmiClass::Obesity
    }
}

/// Age used for the BMR formula. Outside the plausible window — or with no
/// birth date at all — this falls back to the configured default age, which
/// is a safety default, not a real computation.
pub fn derive_age(birth_date: Option<Date>, today: Date, fallback_age: i32) -> i32 {
    match birth_date {
        Some(birth) => {
            let age = User::age_on(birth, today);
            if (MIN_PLAUSIBLE_AGE..=MAX_PLAUSIBLE_AGE).contains(&age) {
                age
            } else {
                fallback_age
            }
        }
        None => fallback_age,
    }
}

/// BMI, BMR (Mifflin-St Jeor), TDEE, calorie target and bucket breakdown.
///
/// The gender term defaults to the female constant when the profile carries
/// no gender.
pub fn compute_energy_plan(
    height_cm: f64,
    weight_kg: f64,
    gender: Option<Gender>,
    age: i32,
    activity_level: ActivityLevel,
    goal: Goal,
) -> Result<EnergyPlan, ApiError> {
    if !(height_cm > 0.0) {
        return Err(ApiError::validation("height_cm must be positive"));
    }
    if !(weight_kg > 0.0) {
        return Err(ApiError::validation("weight_kg must be positive"));
    }

    let height_m = height_cm / 100.0;
    let bmi = round1(weight_kg / (height_m * height_m));
    let bmi_class = classify_bmi(bmi);

    let gender_term = match gender {
        Some(Gender::Male) => 5.0,
        _ => -161.0,
    };
    let bmr = (10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + gender_term).round()
        as i32;
    let tdee = (f64::from(bmr) * activity_level.factor()).round() as i32;
    let calorie_target = (tdee + goal.calorie_delta()).max(MIN_CALORIE_TARGET);

    let breakdown = MealBreakdown {
        breakfast: share_of(calorie_target, BREAKFAST_SHARE),
        lunch: share_of(calorie_target, LUNCH_SHARE),
        dinner: share_of(calorie_target, DINNER_SHARE),
    };

    Ok(EnergyPlan {
        bmi,
        bmi_class,
        bmr,
        tdee,
        calorie_target,
        breakdown,
        diet_type: goal.diet_type(),
    })
}

/// Calorie window (±15%) for one bucket target.
pub fn bucket_kcal_window(target: i32) -> (i32, i32) {
    let t = f64::from(target);
    (
        (t * (1.0 - BUCKET_KCAL_TOLERANCE)).round() as i32,
        (t * (1.0 + BUCKET_KCAL_TOLERANCE)).round() as i32,
    )
}

fn share_of(total: i32, share: f64) -> i32 {
    (f64::from(total) * share).round() as i32
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn bmi_is_rounded_and_classified() {
        let plan = compute_energy_plan(
            170.0,
            65.0,
            Some(Gender::Female),
            30,
            ActivityLevel::Sedentary,
            Goal::Maintain,
        )
        .unwrap();
        assert_eq!(plan.bmi, 22.5);
        assert_eq!(plan.bmi_class, BmiClass::Normal);
    }

    #[test]
    fn bmi_class_thresholds() {
        assert_eq!(classify_bmi(18.4), BmiClass::Underweight);
        assert_eq!(classify_bmi(18.5), BmiClass::Normal);
        assert_eq!(classify_bmi(24.9), BmiClass::Normal);
        assert_eq!(classify_bmi(25.0), BmiClass::Overweight);
        assert_eq!(classify_bmi(29.9), BmiClass::Overweight);
        assert_eq!(classify_bmi(30.0), BmiClass::Obesity);
    }

    #[test]
    fn moderate_lose_scenario_follows_mifflin_st_jeor() {
        let plan = compute_energy_plan(
            175.0,
            80.0,
            Some(Gender::Male),
            30,
            ActivityLevel::Moderate,
            Goal::Lose,
        )
        .unwrap();
        // 10*80 + 6.25*175 - 5*30 + 5 = 1748.75
        assert_eq!(plan.bmr, 1749);
        assert_eq!(plan.tdee, 2711);
        assert_eq!(plan.calorie_target, 2211);
        assert_eq!(plan.breakdown.breakfast, 442);
        assert_eq!(plan.breakdown.lunch, 884);
        assert_eq!(plan.breakdown.dinner, 884);
        assert_eq!(plan.diet_type, DietType::WeightLoss);
    }

    #[test]
    fn breakdown_sums_close_to_target() {
        for target_input in [(160.0, 50.0), (175.0, 80.0), (182.0, 95.5)] {
            let plan = compute_energy_plan(
                target_input.0,
                target_input.1,
                Some(Gender::Male),
                40,
                ActivityLevel::Active,
                Goal::Gain,
            )
            .unwrap();
            let sum = plan.breakdown.breakfast + plan.breakdown.lunch + plan.breakdown.dinner;
            assert!((sum - plan.calorie_target).abs() <= 3);
        }
    }

    #[test]
    fn calorie_target_never_drops_below_floor() {
        // tiny person on a cut: raw target would be far below 1200
        let plan = compute_energy_plan(
            140.0,
            35.0,
            Some(Gender::Female),
            80,
            ActivityLevel::Sedentary,
            Goal::Lose,
        )
        .unwrap();
        assert_eq!(plan.calorie_target, MIN_CALORIE_TARGET);
    }

    #[test]
    fn missing_gender_uses_female_constant() {
        let with_female = compute_energy_plan(
            170.0,
            60.0,
            Some(Gender::Female),
            25,
            ActivityLevel::Sedentary,
            Goal::Maintain,
        )
        .unwrap();
        let without = compute_energy_plan(
            170.0,
            60.0,
            None,
            25,
            ActivityLevel::Sedentary,
            Goal::Maintain,
        )
        .unwrap();
        assert_eq!(with_female.bmr, without.bmr);
    }

    #[test]
    fn non_positive_height_or_weight_is_a_validation_error() {
        let err = compute_energy_plan(
            0.0,
            70.0,
            None,
            30,
            ActivityLevel::Moderate,
            Goal::Maintain,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = compute_energy_plan(
            170.0,
            -5.0,
            None,
            30,
            ActivityLevel::Moderate,
            Goal::Maintain,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn activity_and_goal_parse_known_values_only() {
        assert_eq!(
            "Moderate".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::Moderate
        );
        assert!("very active".parse::<ActivityLevel>().is_err());
        assert_eq!("LOSE".parse::<Goal>().unwrap(), Goal::Lose);
        assert!("bulk".parse::<Goal>().is_err());
    }

    #[test]
    fn derive_age_prefers_birth_date_within_window() {
        let today = date!(2025 - 06 - 01);
        assert_eq!(derive_age(Some(date!(1995 - 06 - 01)), today, 25), 30);
        assert_eq!(derive_age(Some(date!(1995 - 06 - 02)), today, 25), 29);
    }

    #[test]
    fn derive_age_falls_back_when_missing_or_implausible() {
        let today = date!(2025 - 06 - 01);
        assert_eq!(derive_age(None, today, 25), 25);
        // younger than 13
        assert_eq!(derive_age(Some(date!(2020 - 01 - 01)), today, 25), 25);
        // older than 120
        assert_eq!(derive_age(Some(date!(1890 - 01 - 01)), today, 25), 25);
    }

    #[test]
    fn bucket_window_is_fifteen_percent() {
        assert_eq!(bucket_kcal_window(400), (340, 460));
        assert_eq!(bucket_kcal_window(884), (751, 1017));
    }

    #[test]
    fn goal_maps_to_diet_type() {
        assert_eq!(Goal::Lose.diet_type(), DietType::WeightLoss);
        assert_eq!(Goal::Gain.diet_type(), DietType::WeightGain);
        assert_eq!(Goal::Maintain.diet_type(), DietType::EatClean);
    }
}
