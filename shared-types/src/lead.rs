use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pipeline::{DepositStatus, FlagVector, LeadStatus, PipelineStage};

/// Lead record as exchanged with the dashboard.
///
/// `deposit_status` and `status` are derived from `flags`; use [`Lead::set_stage`]
/// to change the pipeline position so they never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub language: Option<String>,
    pub source: Option<String>,
    pub branch_id: Option<i64>,
    pub lead_agent_id: Option<i64>,
    pub created_by: Option<i64>,
    #[serde(flatten)]
    pub flags: FlagVector,
    pub deposit_status: DepositStatus,
    pub status: LeadStatus,
    pub latest_remarks: Option<String>,
    pub current_status: Option<String>,
    pub created_at: i64,
    pub last_updated_at: i64,
}

impl Lead {
    pub fn stage(&self) -> PipelineStage {
        PipelineStage::from_flags(&self.flags)
    }

    pub fn set_stage(&mut self, stage: PipelineStage) {
        self.flags = stage.to_flags();
        self.refresh_derived();
    }

    /// Recomputes `deposit_status` and `status` from the stored flags.
    pub fn refresh_derived(&mut self) {
        let stage = self.stage();
        self.deposit_status = stage.deposit_status();
        self.status = stage.lead_status();
    }

    pub fn is_assigned(&self) -> bool {
        self.lead_agent_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub language: Option<String>,
    pub source: Option<String>,
    pub branch_id: Option<i64>,
    pub lead_agent_id: Option<i64>,
}

/// Edits contact details only. Pipeline flags change through
/// [`UpdateLeadStatusRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub language: Option<String>,
    pub source: Option<String>,
    pub branch_id: Option<i64>,
}

/// Full replacement of a lead's flag vector. There is no partial form and no
/// concurrency token: the last writer wins.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusRequest {
    #[serde(rename = "_id")]
    pub id: i64,
    pub lead_agent_id: Option<i64>,
    #[serde(flatten)]
    pub flags: FlagVector,
    pub last_updated_at: Option<i64>,
    #[serde(default)]
    pub latest_remarks: String,
    pub current_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadRequest {
    pub lead_id: i64,
    pub agent_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LeadHistoryEntry {
    #[serde(rename = "_id")]
    pub id: i64,
    pub lead_id: i64,
    pub current_status: String,
    pub latest_remarks: String,
    #[serde(flatten)]
    pub flags: FlagVector,
    pub changed_by: Option<i64>,
    pub changed_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadHistoryResponse {
    pub history: Vec<LeadHistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ContactOutcome, HotAccount, Interest, Temperature};

    fn lead() -> Lead {
        Lead {
            id: 7,
            name: "Amal Haddad".to_string(),
            phone: Some("+971500000000".to_string()),
            email: None,
            nationality: Some("Jordan".to_string()),
            language: Some("Arabic".to_string()),
            source: Some("Kiosk".to_string()),
            branch_id: Some(1),
            lead_agent_id: None,
            created_by: None,
            flags: FlagVector::default(),
            deposit_status: DepositStatus::Unknown,
            status: LeadStatus::Lead,
            latest_remarks: None,
            current_status: None,
            created_at: 0,
            last_updated_at: 0,
        }
    }

    #[test]
    fn test_wire_shape_is_flat_camel_case() {
        let value = serde_json::to_value(lead()).unwrap();
        assert_eq!(value["_id"], 7);
        assert_eq!(value["contacted"], false);
        assert_eq!(value["depositStatus"], "");
        assert_eq!(value["status"], "Lead");
        assert!(value.get("flags").is_none());
    }

    #[test]
    fn test_set_stage_refreshes_derived_fields() {
        let mut lead = lead();
        lead.set_stage(PipelineStage::Contacted(ContactOutcome::Answered(
            Interest::Interested(Temperature::Hot(HotAccount::Real { deposited: true })),
        )));
        assert!(lead.flags.deposited);
        assert_eq!(lead.status, LeadStatus::Real);
        assert_eq!(lead.deposit_status, DepositStatus::Deposited);
    }

    #[test]
    fn test_status_request_accepts_observed_payload() {
        let body = serde_json::json!({
            "_id": 3,
            "leadAgentId": 12,
            "contacted": true,
            "answered": true,
            "interested": false,
            "hot": false,
            "cold": true,
            "real": false,
            "demo": false,
            "deposited": false,
            "lastUpdatedAt": 1700000000,
            "latestRemarks": "Call back next month",
            "currentStatus": "Not Interested"
        });
        let request: UpdateLeadStatusRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.id, 3);
        assert!(request.flags.cold);
        assert_eq!(request.current_status, "Not Interested");
    }
}
