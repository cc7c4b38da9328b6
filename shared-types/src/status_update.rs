//! Status update modal: radio choices mirroring the tab hierarchy, encoded into
//! a full replacement flag vector.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lead::UpdateLeadStatusRequest;
use crate::pipeline::{ContactOutcome, FlagVector, HotAccount, Interest, PipelineStage, Temperature};
use crate::tabs::{TabLabel, TabPath};

pub const MAX_REMARKS_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum AnsweredChoice {
    Answered,
    #[serde(rename = "Not Answered")]
    NotAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InterestChoice {
    Interested,
    #[serde(rename = "Not Interested")]
    NotInterested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LeadTypeChoice {
    #[serde(rename = "Warm Lead")]
    WarmLead,
    #[serde(rename = "Hot Lead")]
    HotLead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum HotLeadChoice {
    Demo,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DepositChoice {
    Deposit,
    #[serde(rename = "Not Deposit")]
    NotDeposit,
}

/// One radio choice in the modal, tagged with its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChoice {
    Answered(AnsweredChoice),
    Interest(InterestChoice),
    LeadType(LeadTypeChoice),
    HotLeadType(HotLeadChoice),
    Deposit(DepositChoice),
}

impl StatusChoice {
    pub fn level(&self) -> usize {
        match self {
            StatusChoice::Answered(_) => 1,
            StatusChoice::Interest(_) => 2,
            StatusChoice::LeadType(_) => 3,
            StatusChoice::HotLeadType(_) => 4,
            StatusChoice::Deposit(_) => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusChoice::Answered(AnsweredChoice::Answered) => "Answered",
            StatusChoice::Answered(AnsweredChoice::NotAnswered) => "Not Answered",
            StatusChoice::Interest(InterestChoice::Interested) => "Interested",
            StatusChoice::Interest(InterestChoice::NotInterested) => "Not Interested",
            StatusChoice::LeadType(LeadTypeChoice::WarmLead) => "Warm Lead",
            StatusChoice::LeadType(LeadTypeChoice::HotLead) => "Hot Lead",
            StatusChoice::HotLeadType(HotLeadChoice::Demo) => "Demo",
            StatusChoice::HotLeadType(HotLeadChoice::Real) => "Real",
            StatusChoice::Deposit(DepositChoice::Deposit) => "Deposit",
            StatusChoice::Deposit(DepositChoice::NotDeposit) => "Not Deposit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("Please select a status before saving")]
    NoStatusSelected,

    #[error("Selection is incomplete: choose an option below '{after}'")]
    IncompleteSelection { after: &'static str },

    #[error("'{label}' is not available for the current selection")]
    ChoiceNotEnabled { label: &'static str },

    #[error("Remarks must be at most 500 characters (got {len})")]
    RemarksTooLong { len: usize },

    #[error("Tab path '{0}' does not describe a contact outcome")]
    NotAStatusPath(String),
}

/// Current radio selections of the status modal. All start unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusSelection {
    #[serde(rename = "answeredChoice")]
    pub answered: Option<AnsweredChoice>,
    #[serde(rename = "interestedChoice")]
    pub interested: Option<InterestChoice>,
    #[serde(rename = "leadTypeChoice")]
    pub lead_type: Option<LeadTypeChoice>,
    #[serde(rename = "hotLeadTypeChoice")]
    pub hot_lead_type: Option<HotLeadChoice>,
    #[serde(rename = "depositChoice")]
    pub deposit: Option<DepositChoice>,
}

/// Result of encoding a selection: what gets sent to `/lead/updateStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub stage: PipelineStage,
    pub flags: FlagVector,
    pub current_status: String,
    pub latest_remarks: String,
}

impl StatusSelection {
    /// Applies one radio choice and clears every deeper choice. A choice whose
    /// parent radio does not enable it is rejected.
    pub fn choose(&self, choice: StatusChoice) -> Result<Self, StatusError> {
        if !self.is_enabled(choice.level()) {
            return Err(StatusError::ChoiceNotEnabled {
                label: choice.label(),
            });
        }

        let mut next = self.cleared_from(choice.level());
        match choice {
            StatusChoice::Answered(c) => next.answered = Some(c),
            StatusChoice::Interest(c) => next.interested = Some(c),
            StatusChoice::LeadType(c) => next.lead_type = Some(c),
            StatusChoice::HotLeadType(c) => next.hot_lead_type = Some(c),
            StatusChoice::Deposit(c) => next.deposit = Some(c),
        }
        Ok(next)
    }

    /// Whether the radio group at `level` is shown for the choices above it.
    pub fn is_enabled(&self, level: usize) -> bool {
        match level {
            1 => true,
            2 => self.answered == Some(AnsweredChoice::Answered),
            3 => self.is_enabled(2) && self.interested == Some(InterestChoice::Interested),
            4 => self.is_enabled(3) && self.lead_type == Some(LeadTypeChoice::HotLead),
            5 => self.is_enabled(4) && self.hot_lead_type == Some(HotLeadChoice::Real),
            _ => false,
        }
    }

    pub fn cleared_from(&self, level: usize) -> Self {
        let mut next = *self;
        if level <= 1 {
            next.answered = None;
        }
        if level <= 2 {
            next.interested = None;
        }
        if level <= 3 {
            next.lead_type = None;
        }
        if level <= 4 {
            next.hot_lead_type = None;
        }
        if level <= 5 {
            next.deposit = None;
        }
        next
    }

    /// Choices that take part in the encoding, top-down. Anything below a
    /// terminal choice is dropped.
    pub fn effective_choices(&self) -> Vec<StatusChoice> {
        let mut choices = Vec::new();
        let levels = [
            self.answered.map(StatusChoice::Answered),
            self.interested.map(StatusChoice::Interest),
            self.lead_type.map(StatusChoice::LeadType),
            self.hot_lead_type.map(StatusChoice::HotLeadType),
            self.deposit.map(StatusChoice::Deposit),
        ];

        for (idx, choice) in levels.into_iter().enumerate() {
            if !self.is_enabled(idx + 1) {
                break;
            }
            match choice {
                Some(choice) => choices.push(choice),
                None => break,
            }
        }
        choices
    }

    /// Label of the deepest effective choice, sent as `currentStatus`.
    pub fn current_status(&self) -> Option<&'static str> {
        self.effective_choices().last().map(StatusChoice::label)
    }

    /// Pipeline stage the selection describes.
    pub fn stage(&self) -> Result<PipelineStage, StatusError> {
        let interest = match self.answered {
            None => return Err(StatusError::NoStatusSelected),
            Some(AnsweredChoice::NotAnswered) => {
                return Ok(PipelineStage::Contacted(ContactOutcome::NotAnswered))
            }
            Some(AnsweredChoice::Answered) => self.interested,
        };

        let lead_type = match interest {
            None => return Err(StatusError::IncompleteSelection { after: "Answered" }),
            Some(InterestChoice::NotInterested) => {
                return Ok(PipelineStage::Contacted(ContactOutcome::Answered(
                    Interest::NotInterested,
                )))
            }
            Some(InterestChoice::Interested) => self.lead_type,
        };

        let temperature = match lead_type {
            None => return Err(StatusError::IncompleteSelection { after: "Interested" }),
            Some(LeadTypeChoice::WarmLead) => Temperature::Warm,
            Some(LeadTypeChoice::HotLead) => Temperature::Hot(match self.hot_lead_type {
                None => HotAccount::Unclassified,
                Some(HotLeadChoice::Demo) => HotAccount::Demo,
                Some(HotLeadChoice::Real) => HotAccount::Real {
                    deposited: self.deposit == Some(DepositChoice::Deposit),
                },
            }),
        };

        Ok(PipelineStage::Contacted(ContactOutcome::Answered(
            Interest::Interested(temperature),
        )))
    }

    /// Validates the selection and remarks and computes the full flag vector.
    pub fn encode(&self, remarks: &str) -> Result<StatusUpdate, StatusError> {
        let stage = self.stage()?;

        let len = remarks.chars().count();
        if len > MAX_REMARKS_CHARS {
            return Err(StatusError::RemarksTooLong { len });
        }

        let current_status = self
            .current_status()
            .ok_or(StatusError::NoStatusSelected)?
            .to_string();

        Ok(StatusUpdate {
            stage,
            flags: stage.to_flags(),
            current_status,
            latest_remarks: remarks.to_string(),
        })
    }

    /// Selection that a status modal would need to file a lead under `path`.
    /// Only paths below `Contacted` describe a contact outcome.
    pub fn from_tab_path(path: &TabPath) -> Result<Self, StatusError> {
        let labels = path.labels();
        if labels.first() != Some(&TabLabel::Contacted) {
            return Err(StatusError::NotAStatusPath(path.to_string()));
        }

        let mut selection = StatusSelection::default();
        for label in &labels[1..] {
            let choices = match label {
                TabLabel::NotAnswered => vec![StatusChoice::Answered(AnsweredChoice::NotAnswered)],
                TabLabel::Interested => vec![
                    StatusChoice::Answered(AnsweredChoice::Answered),
                    StatusChoice::Interest(InterestChoice::Interested),
                ],
                TabLabel::NotInterested => vec![
                    StatusChoice::Answered(AnsweredChoice::Answered),
                    StatusChoice::Interest(InterestChoice::NotInterested),
                ],
                TabLabel::WarmLead => vec![StatusChoice::LeadType(LeadTypeChoice::WarmLead)],
                TabLabel::HotLead => vec![StatusChoice::LeadType(LeadTypeChoice::HotLead)],
                TabLabel::Demo => vec![StatusChoice::HotLeadType(HotLeadChoice::Demo)],
                TabLabel::Real => vec![StatusChoice::HotLeadType(HotLeadChoice::Real)],
                TabLabel::Deposit => vec![StatusChoice::Deposit(DepositChoice::Deposit)],
                TabLabel::NotDeposit => vec![StatusChoice::Deposit(DepositChoice::NotDeposit)],
                _ => return Err(StatusError::NotAStatusPath(path.to_string())),
            };
            for choice in choices {
                selection = selection.choose(choice)?;
            }
        }

        Ok(selection)
    }
}

impl StatusUpdate {
    pub fn into_request(
        self,
        lead_id: i64,
        lead_agent_id: Option<i64>,
        now: i64,
    ) -> UpdateLeadStatusRequest {
        UpdateLeadStatusRequest {
            id: lead_id,
            lead_agent_id,
            flags: self.flags,
            last_updated_at: Some(now),
            latest_remarks: self.latest_remarks,
            current_status: self.current_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{all_paths, pipeline_labels, tab_matches};
    use crate::lead::Lead;
    use crate::pipeline::{DepositStatus, LeadStatus};
    use crate::tabs::LeadRoute;

    fn select(choices: &[StatusChoice]) -> StatusSelection {
        choices
            .iter()
            .fold(StatusSelection::default(), |s, c| s.choose(*c).unwrap())
    }

    fn lead_with(flags: FlagVector) -> Lead {
        let mut lead = Lead {
            id: 1,
            name: "Test".to_string(),
            phone: None,
            email: None,
            nationality: None,
            language: None,
            source: None,
            branch_id: None,
            lead_agent_id: None,
            created_by: None,
            flags,
            deposit_status: DepositStatus::Unknown,
            status: LeadStatus::Lead,
            latest_remarks: None,
            current_status: None,
            created_at: 0,
            last_updated_at: 0,
        };
        lead.refresh_derived();
        lead
    }

    #[test]
    fn test_full_deposit_path() {
        let path = TabPath::parse(
            LeadRoute::Leads,
            "Contacted > Interested > Hot Lead > Real > Deposit",
        )
        .unwrap();
        let update = StatusSelection::from_tab_path(&path)
            .unwrap()
            .encode("")
            .unwrap();

        assert_eq!(
            update.flags,
            FlagVector {
                contacted: true,
                answered: true,
                interested: true,
                hot: true,
                cold: false,
                real: true,
                demo: false,
                deposited: true,
            }
        );
        assert_eq!(update.current_status, "Deposit");
    }

    #[test]
    fn test_not_answered_is_terminal() {
        let update = select(&[StatusChoice::Answered(AnsweredChoice::NotAnswered)])
            .encode("No pickup")
            .unwrap();
        assert_eq!(
            update.flags,
            FlagVector {
                contacted: true,
                ..Default::default()
            }
        );
        assert_eq!(update.current_status, "Not Answered");
        assert_eq!(update.latest_remarks, "No pickup");
    }

    #[test]
    fn test_not_interested_sets_cold() {
        let update = select(&[
            StatusChoice::Answered(AnsweredChoice::Answered),
            StatusChoice::Interest(InterestChoice::NotInterested),
        ])
        .encode("")
        .unwrap();
        assert!(update.flags.contacted && update.flags.answered && update.flags.cold);
        assert!(!update.flags.interested);
    }

    #[test]
    fn test_real_without_deposit_choice() {
        let update = select(&[
            StatusChoice::Answered(AnsweredChoice::Answered),
            StatusChoice::Interest(InterestChoice::Interested),
            StatusChoice::LeadType(LeadTypeChoice::HotLead),
            StatusChoice::HotLeadType(HotLeadChoice::Real),
        ])
        .encode("")
        .unwrap();
        assert!(update.flags.real && !update.flags.deposited && !update.flags.demo);
        assert_eq!(update.current_status, "Real");
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        assert_eq!(
            StatusSelection::default().encode(""),
            Err(StatusError::NoStatusSelected)
        );
    }

    #[test]
    fn test_incomplete_selection_is_rejected() {
        let answered = select(&[StatusChoice::Answered(AnsweredChoice::Answered)]);
        assert_eq!(
            answered.encode(""),
            Err(StatusError::IncompleteSelection { after: "Answered" })
        );

        let interested = answered
            .choose(StatusChoice::Interest(InterestChoice::Interested))
            .unwrap();
        assert_eq!(
            interested.encode(""),
            Err(StatusError::IncompleteSelection { after: "Interested" })
        );
    }

    #[test]
    fn test_remarks_limit_counts_characters() {
        let selection = select(&[StatusChoice::Answered(AnsweredChoice::NotAnswered)]);
        assert!(selection.encode(&"é".repeat(MAX_REMARKS_CHARS)).is_ok());
        assert_eq!(
            selection.encode(&"x".repeat(MAX_REMARKS_CHARS + 1)),
            Err(StatusError::RemarksTooLong {
                len: MAX_REMARKS_CHARS + 1
            })
        );
    }

    #[test]
    fn test_choose_clears_deeper_choices() {
        let deep = select(&[
            StatusChoice::Answered(AnsweredChoice::Answered),
            StatusChoice::Interest(InterestChoice::Interested),
            StatusChoice::LeadType(LeadTypeChoice::HotLead),
            StatusChoice::HotLeadType(HotLeadChoice::Real),
            StatusChoice::Deposit(DepositChoice::Deposit),
        ]);

        let changed = deep
            .choose(StatusChoice::LeadType(LeadTypeChoice::WarmLead))
            .unwrap();
        assert_eq!(changed.lead_type, Some(LeadTypeChoice::WarmLead));
        assert_eq!(changed.hot_lead_type, None);
        assert_eq!(changed.deposit, None);
        assert_eq!(changed.interested, Some(InterestChoice::Interested));
    }

    #[test]
    fn test_disabled_choice_is_rejected() {
        let not_answered = select(&[StatusChoice::Answered(AnsweredChoice::NotAnswered)]);
        assert_eq!(
            not_answered.choose(StatusChoice::Interest(InterestChoice::Interested)),
            Err(StatusError::ChoiceNotEnabled { label: "Interested" })
        );
    }

    #[test]
    fn test_choices_below_terminal_are_ignored() {
        let selection = StatusSelection {
            answered: Some(AnsweredChoice::NotAnswered),
            interested: Some(InterestChoice::Interested),
            lead_type: Some(LeadTypeChoice::HotLead),
            ..Default::default()
        };
        let update = selection.encode("").unwrap();
        assert!(!update.flags.answered && !update.flags.hot);
        assert_eq!(update.current_status, "Not Answered");
    }

    #[test]
    fn test_encode_then_classify_round_trip() {
        for path in all_paths(LeadRoute::Leads) {
            let Ok(selection) = StatusSelection::from_tab_path(&path) else {
                continue;
            };
            let Ok(update) = selection.encode("") else {
                continue;
            };

            assert!(PipelineStage::try_from_flags(&update.flags).is_ok());

            let lead = lead_with(update.flags);
            assert!(tab_matches(&path, &lead), "{path} did not match its own encoding");

            let leaf = path.leaf().unwrap();
            if leaf.is_leaf() {
                assert_eq!(pipeline_labels(&lead.stage()), path.labels());
            }
            assert_eq!(update.current_status, leaf.as_str());
        }
    }

    #[test]
    fn test_non_contacted_paths_are_not_statuses() {
        let path = TabPath::parse(LeadRoute::Leads, "Pending").unwrap();
        assert!(matches!(
            StatusSelection::from_tab_path(&path),
            Err(StatusError::NotAStatusPath(_))
        ));
    }

    #[test]
    fn test_into_request_carries_everything() {
        let update = select(&[StatusChoice::Answered(AnsweredChoice::NotAnswered)])
            .encode("busy")
            .unwrap();
        let request = update.into_request(9, Some(2), 1_700_000_000);
        assert_eq!(request.id, 9);
        assert_eq!(request.lead_agent_id, Some(2));
        assert_eq!(request.current_status, "Not Answered");
        assert_eq!(request.last_updated_at, Some(1_700_000_000));
    }
}
