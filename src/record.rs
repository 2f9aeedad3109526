use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One completed contract analysis as stored by the ingestion pipeline.
/// Every content field is optional in practice; composition gates each
/// section on the field being present and non-blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub contract_type: String,
    pub risk_level: RiskLevel,
    pub risk_rationale: String,
    pub critical_clauses: Vec<CriticalClause>,
    pub unfair_clauses: Vec<UnfairClause>,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub rebalanced_text: String,
    pub glossary: Vec<GlossaryEntry>,
    pub final_alerts: Vec<String>,
    /// Enriched analysis payload; absent on records produced by the older
    /// pipeline.
    pub v2: Option<AnalysisV2>,
}

impl AnalysisRecord {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk",
            RiskLevel::Medium => "Medium risk",
            RiskLevel::High => "High risk",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CriticalClause {
    pub title: String,
    pub excerpt: String,
    pub rationale: String,
    pub specific_risk: String,
    pub suggested_rewrite: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnfairClause {
    pub title: String,
    pub excerpt: String,
    pub rationale: String,
    pub legal_reference: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlossaryEntry {
    pub term: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisV2 {
    pub contract_type_short: String,
    pub overall_risk: Option<RiskIndex>,
    pub plain_summary: String,
    pub balance: Option<BalanceScore>,
    pub checklist: Vec<ChecklistItem>,
    pub top_risk_clauses: Vec<TopRiskClause>,
    pub clauses: Vec<EnrichedClause>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskIndex {
    /// 0..=100.
    pub score: u8,
    pub level: RiskLevel,
    pub why: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BalanceScore {
    /// Percentage share favoring the user.
    pub user: u8,
    /// Percentage share favoring the counterparty.
    pub counterparty: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChecklistItem {
    pub kind: ChecklistKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistKind {
    #[default]
    Action,
    Caution,
    Ok,
}

impl ChecklistKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ChecklistKind::Action => "To do:",
            ChecklistKind::Caution => "Watch out:",
            ChecklistKind::Ok => "OK:",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopRiskClause {
    pub title: String,
    pub why: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichedClause {
    pub title: String,
    pub traffic_light: TrafficLight,
    /// 0..=100 clause-level risk score.
    pub score: u8,
    pub diagnostic: String,
    pub excerpt: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Green,
    #[default]
    Yellow,
    Red,
}

impl TrafficLight {
    pub fn label(self) -> &'static str {
        match self {
            TrafficLight::Green => "OK",
            TrafficLight::Yellow => "Caution",
            TrafficLight::Red => "Risk",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_deserializes_with_defaults() {
        let record = AnalysisRecord::from_json(r#"{"id":"r1","summary":"ok"}"#).unwrap();
        assert_eq!(record.id, "r1");
        assert_eq!(record.risk_level, RiskLevel::Medium);
        assert!(record.critical_clauses.is_empty());
        assert!(record.v2.is_none());
    }

    #[test]
    fn risk_level_parses_lowercase() {
        let record = AnalysisRecord::from_json(r#"{"risk_level":"high"}"#).unwrap();
        assert_eq!(record.risk_level, RiskLevel::High);
    }

    #[test]
    fn v2_payload_round_trips_fields() {
        let data = r#"{
            "id": "r2",
            "v2": {
                "contract_type_short": "Lease",
                "overall_risk": {"score": 72, "level": "high", "why": "One-sided termination."},
                "balance": {"user": 30, "counterparty": 70},
                "checklist": [{"kind": "caution", "text": "Check the deposit clause."}],
                "clauses": [{"title": "Deposit", "traffic_light": "red", "score": 80,
                             "diagnostic": "Deposit withheld unconditionally.",
                             "excerpt": "...", "highlights": ["withheld"]}]
            }
        }"#;
        let record = AnalysisRecord::from_json(data).unwrap();
        let v2 = record.v2.unwrap();
        assert_eq!(v2.overall_risk.unwrap().score, 72);
        assert_eq!(v2.balance.unwrap().counterparty, 70);
        assert_eq!(v2.checklist[0].kind, ChecklistKind::Caution);
        assert_eq!(v2.clauses[0].traffic_light, TrafficLight::Red);
    }
}
