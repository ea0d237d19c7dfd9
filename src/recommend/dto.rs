use serde::{Deserialize, Serialize};

use crate::catalog::repo::Ingredient;
use crate::meals::dto::MealSummary;
use crate::recommend::planner::{ActivityLevel, EnergyPlan, Goal};

/// JSON body for the URL variant of ingredient detection.
#[derive(Debug, Deserialize)]
pub struct DetectFromUrlRequest {
    pub image_url: String,
    pub bmi: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

/// Optional body hints accompanying an image, used to derive the diet-type
/// filter for premium users.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyHints {
    pub bmi: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    /// Raw names from the vision model, before catalog matching.
    pub detected: Vec<String>,
    pub matched: Vec<Ingredient>,
    pub meals: Vec<MealSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Planning request. Height/weight stay optional here so their absence maps
/// to a field-level validation error rather than a deserialization failure;
/// activity level and goal arrive as free text and are parsed explicitly.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: String,
    pub goal: String,
}

/// The planner inputs worth keeping with the stored plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanInput {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanMeals {
    pub breakfast: Vec<MealSummary>,
    pub lunch: Vec<MealSummary>,
    pub dinner: Vec<MealSummary>,
}

/// Full plan document: energy numbers plus the selected meals per bucket.
/// Persisted verbatim into plan history and returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    #[serde(flatten)]
    pub energy: EnergyPlan,
    pub meals: PlanMeals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::repo::DietType;
    use crate::recommend::planner::{BmiClass, MealBreakdown};

    #[test]
    fn plan_result_flattens_energy_fields() {
        let result = PlanResult {
            energy: EnergyPlan {
                bmi: 22.5,
                bmi_class: BmiClass::Normal,
                bmr: 1749,
                tdee: 2711,
                calorie_target: 2211,
                breakdown: MealBreakdown {
                    breakfast: 442,
                    lunch: 884,
                    dinner: 884,
                },
                diet_type: DietType::WeightLoss,
            },
            meals: PlanMeals::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["bmi"], 22.5);
        assert_eq!(json["calorie_target"], 2211);
        assert_eq!(json["breakdown"]["lunch"], 884);
        assert_eq!(json["diet_type"], "weight_loss");
        assert!(json["meals"]["breakfast"].as_array().unwrap().is_empty());

        let back: PlanResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.energy.bmr, 1749);
    }
}
