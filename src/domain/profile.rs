//! Financial profile attached to each session
//!
//! All fields are optional; `update_profile` merges a patch over the existing
//! profile (later values overwrite same-named earlier ones, unset fields are
//! untouched) and stamps `lastUpdated`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable profile for one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_debt:     Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals:          Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated:   Option<DateTime<Utc>>
}

/// Partial profile update; only set fields are applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_debt:     Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals:          Option<Vec<String>>
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.monthly_income.is_none()
            && self.total_debt.is_none()
            && self.savings_target.is_none()
            && self.goals.is_none()
    }
}

impl Profile {
    /// Merge a patch into this profile and stamp `last_updated`
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(income) = patch.monthly_income {
            self.monthly_income = Some(income);
        }
        if let Some(debt) = patch.total_debt {
            self.total_debt = Some(debt);
        }
        if let Some(target) = patch.savings_target {
            self.savings_target = Some(target);
        }
        if let Some(goals) = patch.goals {
            self.goals = Some(goals);
        }
        self.last_updated = Some(Utc::now());
    }

    /// Render the set fields as a one-line summary for the generation context,
    /// or `None` when nothing has been recorded yet
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(income) = self.monthly_income {
            parts.push(format!("monthly income ${:.2}", income));
        }
        if let Some(debt) = self.total_debt {
            parts.push(format!("total debt ${:.2}", debt));
        }
        if let Some(target) = self.savings_target {
            parts.push(format!("savings target ${:.2}", target));
        }
        if let Some(goals) = &self.goals {
            if !goals.is_empty() {
                parts.push(format!("goals: {}", goals.join(", ")));
            }
        }

        if parts.is_empty() { None } else { Some(parts.join("; ")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_merges_over_existing_fields() {
        let mut profile = Profile { total_debt: Some(2000.0), ..Default::default() };

        profile.apply(ProfilePatch { monthly_income: Some(1500.0), ..Default::default() });

        assert_eq!(profile.total_debt, Some(2000.0));
        assert_eq!(profile.monthly_income, Some(1500.0));
        assert!(profile.last_updated.is_some());
    }

    #[test]
    fn apply_overwrites_same_named_fields() {
        let mut profile = Profile { monthly_income: Some(1000.0), ..Default::default() };

        profile.apply(ProfilePatch { monthly_income: Some(1500.0), ..Default::default() });

        assert_eq!(profile.monthly_income, Some(1500.0));
    }

    #[test]
    fn summary_is_none_for_empty_profile() {
        assert!(Profile::default().summary().is_none());
    }

    #[test]
    fn summary_renders_set_fields_only() {
        let profile = Profile {
            monthly_income: Some(1500.0),
            goals: Some(vec!["emergency fund".to_string()]),
            ..Default::default()
        };

        let summary = profile.summary().unwrap();
        assert!(summary.contains("monthly income $1500.00"));
        assert!(summary.contains("goals: emergency fund"));
        assert!(!summary.contains("debt"));
    }

    #[test]
    fn wire_casing_is_camel_case() {
        let mut profile = Profile::default();
        profile.apply(ProfilePatch { total_debt: Some(2000.0), ..Default::default() });

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["totalDebt"], 2000.0);
        assert!(json.get("lastUpdated").is_some());
    }
}
