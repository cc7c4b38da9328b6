use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Persisted boolean representation of a lead's position in the sales pipeline.
///
/// This is the shape the API stores and sends. Use [`PipelineStage`] for any
/// logic, since a bare flag vector can hold combinations the pipeline does not
/// allow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FlagVector {
    #[serde(default)]
    pub contacted: bool,
    #[serde(default)]
    pub answered: bool,
    #[serde(default)]
    pub interested: bool,
    #[serde(default)]
    pub hot: bool,
    #[serde(default)]
    pub cold: bool,
    #[serde(default)]
    pub real: bool,
    #[serde(default)]
    pub demo: bool,
    #[serde(default)]
    pub deposited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagChainError {
    #[error("'{flag}' cannot be set while '{parent}' is not set")]
    MissingParent {
        flag: &'static str,
        parent: &'static str,
    },

    #[error("A lead cannot be both a demo and a real account")]
    DemoAndReal,

    #[error("A lead cannot be cold while it is interested")]
    ColdAndInterested,
}

/// Pipeline position as a sum type. Every value maps to exactly one valid
/// [`FlagVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Uncontacted,
    Contacted(ContactOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    NotAnswered,
    Answered(Interest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    NotInterested,
    Interested(Temperature),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temperature {
    Warm,
    Hot(HotAccount),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotAccount {
    /// Hot lead that has not opened an account of either kind yet.
    Unclassified,
    Demo,
    Real { deposited: bool },
}

/// Legacy free-text pipeline label. Always derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LeadStatus {
    Lead,
    Demo,
    Real,
}

/// String mirror of `deposited` carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DepositStatus {
    #[serde(rename = "Deposited")]
    Deposited,
    #[serde(rename = "Not Deposited")]
    NotDeposited,
    #[serde(rename = "")]
    Unknown,
}

impl PipelineStage {
    /// Classifies a stored flag vector, stopping at the first ancestor flag that
    /// is false. Deeper flags are ignored in that case, so records that break the
    /// dependency chain still land in exactly one stage.
    pub fn from_flags(flags: &FlagVector) -> Self {
        if !flags.contacted {
            return PipelineStage::Uncontacted;
        }
        if !flags.answered {
            return PipelineStage::Contacted(ContactOutcome::NotAnswered);
        }
        if !flags.interested {
            return PipelineStage::Contacted(ContactOutcome::Answered(Interest::NotInterested));
        }
        if !flags.hot {
            return PipelineStage::Contacted(ContactOutcome::Answered(Interest::Interested(
                Temperature::Warm,
            )));
        }

        let account = if flags.real {
            HotAccount::Real {
                deposited: flags.deposited,
            }
        } else if flags.demo {
            HotAccount::Demo
        } else {
            HotAccount::Unclassified
        };

        PipelineStage::Contacted(ContactOutcome::Answered(Interest::Interested(
            Temperature::Hot(account),
        )))
    }

    /// Strict variant of [`PipelineStage::from_flags`] used on writes: rejects any
    /// vector that breaks the dependency chain.
    pub fn try_from_flags(flags: &FlagVector) -> Result<Self, FlagChainError> {
        validate_chain(flags)?;
        Ok(Self::from_flags(flags))
    }

    pub fn to_flags(&self) -> FlagVector {
        let mut flags = FlagVector::default();

        let outcome = match self {
            PipelineStage::Uncontacted => return flags,
            PipelineStage::Contacted(outcome) => outcome,
        };
        flags.contacted = true;

        let interest = match outcome {
            ContactOutcome::NotAnswered => return flags,
            ContactOutcome::Answered(interest) => interest,
        };
        flags.answered = true;

        let temperature = match interest {
            Interest::NotInterested => {
                flags.cold = true;
                return flags;
            }
            Interest::Interested(temperature) => temperature,
        };
        flags.interested = true;

        let account = match temperature {
            Temperature::Warm => return flags,
            Temperature::Hot(account) => account,
        };
        flags.hot = true;

        match account {
            HotAccount::Unclassified => {}
            HotAccount::Demo => flags.demo = true,
            HotAccount::Real { deposited } => {
                flags.real = true;
                flags.deposited = *deposited;
            }
        }

        flags
    }

    pub fn is_contacted(&self) -> bool {
        matches!(self, PipelineStage::Contacted(_))
    }

    pub fn lead_status(&self) -> LeadStatus {
        match self.hot_account() {
            Some(HotAccount::Real { .. }) => LeadStatus::Real,
            Some(HotAccount::Demo) => LeadStatus::Demo,
            _ => LeadStatus::Lead,
        }
    }

    pub fn deposit_status(&self) -> DepositStatus {
        match self.hot_account() {
            Some(HotAccount::Real { deposited: true }) => DepositStatus::Deposited,
            Some(HotAccount::Real { deposited: false }) => DepositStatus::NotDeposited,
            _ => DepositStatus::Unknown,
        }
    }

    pub fn hot_account(&self) -> Option<HotAccount> {
        match self {
            PipelineStage::Contacted(ContactOutcome::Answered(Interest::Interested(
                Temperature::Hot(account),
            ))) => Some(*account),
            _ => None,
        }
    }
}

impl From<PipelineStage> for FlagVector {
    fn from(stage: PipelineStage) -> Self {
        stage.to_flags()
    }
}

fn validate_chain(flags: &FlagVector) -> Result<(), FlagChainError> {
    let chain: [(bool, &'static str, bool, &'static str); 6] = [
        (flags.answered, "answered", flags.contacted, "contacted"),
        (flags.interested, "interested", flags.answered, "answered"),
        (flags.hot, "hot", flags.interested, "interested"),
        (flags.real, "real", flags.hot, "hot"),
        (flags.demo, "demo", flags.hot, "hot"),
        (flags.deposited, "deposited", flags.real, "real"),
    ];

    for (set, flag, parent_set, parent) in chain {
        if set && !parent_set {
            return Err(FlagChainError::MissingParent { flag, parent });
        }
    }

    if flags.demo && flags.real {
        return Err(FlagChainError::DemoAndReal);
    }

    if flags.cold && flags.interested {
        return Err(FlagChainError::ColdAndInterested);
    }

    if flags.cold && !flags.answered {
        return Err(FlagChainError::MissingParent {
            flag: "cold",
            parent: "answered",
        });
    }

    Ok(())
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Lead => "Lead",
            LeadStatus::Demo => "Demo",
            LeadStatus::Real => "Real",
        }
    }
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::Deposited => "Deposited",
            DepositStatus::NotDeposited => "Not Deposited",
            DepositStatus::Unknown => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_stages() -> Vec<PipelineStage> {
        use ContactOutcome::*;
        use HotAccount::*;
        use Interest::*;
        use Temperature::*;

        vec![
            PipelineStage::Uncontacted,
            PipelineStage::Contacted(NotAnswered),
            PipelineStage::Contacted(Answered(NotInterested)),
            PipelineStage::Contacted(Answered(Interested(Warm))),
            PipelineStage::Contacted(Answered(Interested(Hot(Unclassified)))),
            PipelineStage::Contacted(Answered(Interested(Hot(Demo)))),
            PipelineStage::Contacted(Answered(Interested(Hot(Real { deposited: false })))),
            PipelineStage::Contacted(Answered(Interested(Hot(Real { deposited: true })))),
        ]
    }

    #[test]
    fn test_every_stage_produces_a_valid_chain() {
        for stage in all_stages() {
            let flags = stage.to_flags();
            assert_eq!(PipelineStage::try_from_flags(&flags), Ok(stage));
        }
    }

    #[test]
    fn test_deposited_implies_whole_chain() {
        for stage in all_stages() {
            let flags = stage.to_flags();
            if flags.deposited {
                assert!(flags.real && flags.hot && flags.interested);
                assert!(flags.answered && flags.contacted);
            }
        }
    }

    #[test]
    fn test_from_flags_short_circuits_on_uncontacted() {
        let flags = FlagVector {
            contacted: false,
            answered: true,
            interested: true,
            hot: true,
            real: true,
            deposited: true,
            ..Default::default()
        };
        assert_eq!(PipelineStage::from_flags(&flags), PipelineStage::Uncontacted);
        assert!(matches!(
            PipelineStage::try_from_flags(&flags),
            Err(FlagChainError::MissingParent {
                flag: "answered",
                parent: "contacted"
            })
        ));
    }

    #[test]
    fn test_real_wins_over_demo_when_both_stored() {
        let flags = FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            hot: true,
            real: true,
            demo: true,
            ..Default::default()
        };
        assert_eq!(
            PipelineStage::from_flags(&flags).hot_account(),
            Some(HotAccount::Real { deposited: false })
        );
        assert_eq!(
            PipelineStage::try_from_flags(&flags),
            Err(FlagChainError::DemoAndReal)
        );
    }

    #[test]
    fn test_derived_labels() {
        let real = PipelineStage::from_flags(&FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            hot: true,
            real: true,
            deposited: true,
            ..Default::default()
        });
        assert_eq!(real.lead_status(), LeadStatus::Real);
        assert_eq!(real.deposit_status(), DepositStatus::Deposited);

        let warm = PipelineStage::from_flags(&FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            ..Default::default()
        });
        assert_eq!(warm.lead_status(), LeadStatus::Lead);
        assert_eq!(warm.deposit_status().as_str(), "");
    }

    #[test]
    fn test_deposit_status_wire_format() {
        let json = serde_json::to_string(&DepositStatus::NotDeposited).unwrap();
        assert_eq!(json, "\"Not Deposited\"");
        let parsed: DepositStatus = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, DepositStatus::Unknown);
    }
}
