//! Deterministic pre-signing timeline planner.
//!
//! Works backwards from the target signing date: each required certificate
//! (dominio, inhibiciones, catastro, municipal) has a known processing time
//! per jurisdiction, plus a fixed safety buffer. A request deadline already
//! in the past makes the whole plan a critical risk.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const SAFETY_BUFFER_DAYS: i64 = 3;
const DEFAULT_PROCESSING_DAYS: i64 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingMode {
    #[default]
    Simple,
    Urgente,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Urgente => "URGENTE",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineRequest {
    /// Target signing date, YYYY-MM-DD.
    pub target_date: String,
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,
    #[serde(default)]
    pub mode: ProcessingMode,
}

fn default_jurisdiction() -> String {
    "PBA".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    OnTime,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feasibility {
    Ok,
    CriticalRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineTask {
    pub action: String,
    /// YYYY-MM-DD
    pub deadline: String,
    pub days_before_signing: i64,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePlan {
    pub target_signing_date: String,
    pub feasibility: Feasibility,
    pub tasks: Vec<TimelineTask>,
    pub alerts: Vec<String>,
}

/// Processing days for a certificate in a jurisdiction. Only PBA is tabled;
/// unknown jurisdictions fall back to the default.
fn processing_days(jurisdiction: &str, requirement: &str, mode: ProcessingMode) -> i64 {
    if jurisdiction != "PBA" {
        return DEFAULT_PROCESSING_DAYS;
    }
    match (requirement, mode) {
        ("DOMINIO", ProcessingMode::Simple) | ("INHIBICION", ProcessingMode::Simple) => 20,
        ("DOMINIO", ProcessingMode::Urgente) | ("INHIBICION", ProcessingMode::Urgente) => 7,
        ("CATASTRO", _) => 15,
        ("MUNICIPAL", _) => 10,
        _ => DEFAULT_PROCESSING_DAYS,
    }
}

pub fn plan_timeline(request: &TimelineRequest) -> TimelinePlan {
    plan_timeline_from(request, Utc::now().date_naive())
}

/// Deterministic core, parameterized on "today" for testability.
pub fn plan_timeline_from(request: &TimelineRequest, today: NaiveDate) -> TimelinePlan {
    let mut plan = TimelinePlan {
        target_signing_date: request.target_date.clone(),
        feasibility: Feasibility::Ok,
        tasks: Vec::new(),
        alerts: Vec::new(),
    };

    let Ok(target) = NaiveDate::parse_from_str(&request.target_date, "%Y-%m-%d") else {
        plan.feasibility = Feasibility::CriticalRisk;
        plan.alerts
            .push(format!("Fecha de firma inválida: {}", request.target_date));
        return plan;
    };

    for requirement in ["DOMINIO", "INHIBICION", "CATASTRO", "MUNICIPAL"] {
        let days_needed = processing_days(&request.jurisdiction, requirement, request.mode);
        let total_lead_time = days_needed + SAFETY_BUFFER_DAYS;
        let deadline = target - Duration::days(total_lead_time);

        let status = if deadline < today {
            plan.feasibility = Feasibility::CriticalRisk;
            plan.alerts.push(format!(
                "Imposible llegar con {} en modo {}. Sugerencia: mueva la fecha de firma.",
                requirement,
                request.mode.as_str()
            ));
            TaskStatus::Late
        } else {
            TaskStatus::OnTime
        };

        plan.tasks.push(TimelineTask {
            action: format!("Solicitar {} ({})", requirement, request.mode.as_str()),
            deadline: deadline.format("%Y-%m-%d").to_string(),
            days_before_signing: total_lead_time,
            status,
        });
    }

    plan.tasks.sort_by(|a, b| a.deadline.cmp(&b.deadline));
    plan
}
