use crate::lead::Lead;
use crate::pipeline::{ContactOutcome, HotAccount, Interest, PipelineStage, Temperature};
use crate::tabs::{LeadRoute, TabLabel, TabPath};

/// Whether a single tab label admits a lead in `stage`.
///
/// Pipeline labels test the classified stage rather than raw flags, so a lead
/// whose ancestor flag is false never matches a deeper tab.
pub fn label_matches(label: TabLabel, stage: &PipelineStage, assigned: bool) -> bool {
    use ContactOutcome::*;
    use Interest::*;
    use PipelineStage::*;
    use Temperature::*;

    match label {
        TabLabel::All => true,
        TabLabel::Pending => matches!(stage, Uncontacted),
        TabLabel::Assigned => assigned,
        TabLabel::NotAssigned => !assigned,
        TabLabel::Contacted => stage.is_contacted(),
        TabLabel::NotAnswered => matches!(stage, Contacted(NotAnswered)),
        TabLabel::Interested => matches!(stage, Contacted(Answered(Interested(_)))),
        TabLabel::NotInterested => matches!(stage, Contacted(Answered(NotInterested))),
        TabLabel::WarmLead => matches!(stage, Contacted(Answered(Interested(Warm)))),
        TabLabel::HotLead => matches!(stage, Contacted(Answered(Interested(Hot(_))))),
        TabLabel::Demo => stage.hot_account() == Some(HotAccount::Demo),
        TabLabel::Real => matches!(stage.hot_account(), Some(HotAccount::Real { .. })),
        TabLabel::Deposit => stage.hot_account() == Some(HotAccount::Real { deposited: true }),
        TabLabel::NotDeposit => {
            stage.hot_account() == Some(HotAccount::Real { deposited: false })
        }
    }
}

/// Decision table for the selected tab path. Levels without a selection match
/// anything below them.
pub fn tab_matches(path: &TabPath, lead: &Lead) -> bool {
    let stage = lead.stage();
    let assigned = lead.is_assigned();
    path.labels()
        .iter()
        .all(|label| label_matches(*label, &stage, assigned))
}

/// Case-insensitive substring search over the lead's free-text fields. A blank
/// query matches everything.
pub fn search_matches(lead: &Lead, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let fields = [
        Some(lead.name.as_str()),
        lead.phone.as_deref(),
        lead.nationality.as_deref(),
        lead.source.as_deref(),
        lead.language.as_deref(),
        lead.email.as_deref(),
    ];

    fields
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

/// Tab path plus search text, as held by a lead list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFilter {
    pub path: TabPath,
    pub search: String,
}

impl LeadFilter {
    pub fn new(route: LeadRoute) -> Self {
        Self {
            path: TabPath::new(route),
            search: String::new(),
        }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        tab_matches(&self.path, lead) && search_matches(lead, &self.search)
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

/// Number of leads under each option of the next level, for tab badges.
/// Search text is applied as well.
pub fn tab_counts(filter: &LeadFilter, leads: &[Lead]) -> Vec<(TabLabel, usize)> {
    let level = filter.path.depth() + 1;
    filter
        .path
        .options(level)
        .iter()
        .filter_map(|label| {
            let path = filter.path.select(level, *label).ok()?;
            let count = leads
                .iter()
                .filter(|lead| tab_matches(&path, lead) && search_matches(lead, &filter.search))
                .count();
            Some((*label, count))
        })
        .collect()
}

/// Every path reachable in `route`, shallowest first.
pub fn all_paths(route: LeadRoute) -> Vec<TabPath> {
    let mut paths = Vec::new();
    let mut frontier = vec![TabPath::new(route)];

    while let Some(path) = frontier.pop() {
        let level = path.depth() + 1;
        for label in path.options(level) {
            if let Ok(next) = path.select(level, *label) {
                paths.push(next.clone());
                frontier.push(next);
            }
        }
    }

    paths.sort_by_key(TabPath::depth);
    paths
}

/// Deepest pipeline tab that holds a lead in `stage`, ignoring the
/// assignment tabs.
pub fn pipeline_labels(stage: &PipelineStage) -> Vec<TabLabel> {
    use ContactOutcome::*;
    use Interest::*;
    use PipelineStage::*;
    use Temperature::*;

    match stage {
        Uncontacted => vec![TabLabel::Pending],
        Contacted(NotAnswered) => vec![TabLabel::Contacted, TabLabel::NotAnswered],
        Contacted(Answered(NotInterested)) => vec![TabLabel::Contacted, TabLabel::NotInterested],
        Contacted(Answered(Interested(Warm))) => vec![
            TabLabel::Contacted,
            TabLabel::Interested,
            TabLabel::WarmLead,
        ],
        Contacted(Answered(Interested(Hot(account)))) => {
            let mut labels = vec![TabLabel::Contacted, TabLabel::Interested, TabLabel::HotLead];
            match account {
                HotAccount::Unclassified => {}
                HotAccount::Demo => labels.push(TabLabel::Demo),
                HotAccount::Real { deposited } => {
                    labels.push(TabLabel::Real);
                    labels.push(if *deposited {
                        TabLabel::Deposit
                    } else {
                        TabLabel::NotDeposit
                    });
                }
            }
            labels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DepositStatus, FlagVector, LeadStatus};

    fn lead_with(flags: FlagVector) -> Lead {
        let mut lead = Lead {
            id: 1,
            name: "Lina Farouk".to_string(),
            phone: Some("0501234567".to_string()),
            email: Some("lina@example.com".to_string()),
            nationality: Some("Egypt".to_string()),
            language: Some("Arabic".to_string()),
            source: Some("Facebook".to_string()),
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

    fn path(labels: &[TabLabel]) -> TabPath {
        TabPath::from_labels(LeadRoute::Leads, labels).unwrap()
    }

    #[test]
    fn test_not_interested_lead_appears_only_under_not_interested() {
        let lead = lead_with(FlagVector {
            contacted: true,
            answered: true,
            interested: false,
            ..Default::default()
        });

        let matching: Vec<String> = all_paths(LeadRoute::Leads)
            .into_iter()
            .filter(|p| p.labels().first() == Some(&TabLabel::Contacted) && p.depth() > 1)
            .filter(|p| tab_matches(p, &lead))
            .map(|p| p.to_string())
            .collect();

        assert_eq!(matching, vec!["Contacted > Not Interested".to_string()]);
        assert!(!tab_matches(&path(&[TabLabel::Pending]), &lead));
        assert!(tab_matches(&path(&[TabLabel::All]), &lead));
    }

    #[test]
    fn test_decision_table_rows() {
        let deposited = lead_with(FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            hot: true,
            real: true,
            deposited: true,
            ..Default::default()
        });
        let demo = lead_with(FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            hot: true,
            demo: true,
            ..Default::default()
        });
        let warm = lead_with(FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            ..Default::default()
        });
        let unanswered = lead_with(FlagVector {
            contacted: true,
            ..Default::default()
        });
        let fresh = lead_with(FlagVector::default());

        let hot_real = [
            TabLabel::Contacted,
            TabLabel::Interested,
            TabLabel::HotLead,
            TabLabel::Real,
        ];
        assert!(tab_matches(&path(&hot_real), &deposited));
        assert!(!tab_matches(&path(&hot_real), &demo));

        let mut with_deposit = hot_real.to_vec();
        with_deposit.push(TabLabel::Deposit);
        assert!(tab_matches(&path(&with_deposit), &deposited));

        assert!(tab_matches(
            &path(&[TabLabel::Contacted, TabLabel::Interested, TabLabel::HotLead, TabLabel::Demo]),
            &demo
        ));
        assert!(tab_matches(
            &path(&[TabLabel::Contacted, TabLabel::Interested, TabLabel::WarmLead]),
            &warm
        ));
        assert!(!tab_matches(
            &path(&[TabLabel::Contacted, TabLabel::Interested, TabLabel::HotLead]),
            &warm
        ));
        assert!(tab_matches(
            &path(&[TabLabel::Contacted, TabLabel::NotAnswered]),
            &unanswered
        ));
        assert!(tab_matches(&path(&[TabLabel::Contacted]), &unanswered));
        assert!(tab_matches(&path(&[TabLabel::Pending]), &fresh));
        assert!(!tab_matches(&path(&[TabLabel::Contacted]), &fresh));
    }

    #[test]
    fn test_deeper_flags_ignored_when_not_contacted() {
        let corrupt = lead_with(FlagVector {
            contacted: false,
            answered: true,
            interested: true,
            hot: true,
            ..Default::default()
        });
        assert!(tab_matches(&path(&[TabLabel::Pending]), &corrupt));
        assert!(!tab_matches(
            &path(&[TabLabel::Contacted, TabLabel::Interested]),
            &corrupt
        ));
    }

    #[test]
    fn test_assignment_tabs() {
        fn admin(labels: &[TabLabel]) -> TabPath {
            TabPath::from_labels(LeadRoute::LeadsAdmin, labels).unwrap()
        }

        let mut lead = lead_with(FlagVector::default());

        assert!(tab_matches(&admin(&[TabLabel::NotAssigned]), &lead));
        lead.lead_agent_id = Some(4);
        assert!(tab_matches(&admin(&[TabLabel::Assigned]), &lead));
        assert!(!tab_matches(&admin(&[TabLabel::NotAssigned]), &lead));
    }

    #[test]
    fn test_search_is_case_insensitive_or_across_fields() {
        let lead = lead_with(FlagVector::default());
        assert!(search_matches(&lead, "LINA"));
        assert!(search_matches(&lead, "egy"));
        assert!(search_matches(&lead, "facebook"));
        assert!(search_matches(&lead, "   "));
        assert!(!search_matches(&lead, "instagram"));
    }

    #[test]
    fn test_filter_ands_search_with_tab() {
        let leads = vec![
            lead_with(FlagVector::default()),
            lead_with(FlagVector {
                contacted: true,
                ..Default::default()
            }),
        ];
        let mut filter = LeadFilter::new(LeadRoute::Leads);
        filter.path = filter.path.select(1, TabLabel::Contacted).unwrap();
        filter.search = "lina".to_string();
        assert_eq!(filter.apply(&leads).len(), 1);

        filter.search = "nobody".to_string();
        assert!(filter.apply(&leads).is_empty());
    }

    #[test]
    fn test_tab_counts_for_next_level() {
        let leads = vec![
            lead_with(FlagVector::default()),
            lead_with(FlagVector {
                contacted: true,
                ..Default::default()
            }),
            lead_with(FlagVector {
                contacted: true,
                answered: true,
                ..Default::default()
            }),
        ];
        let filter = LeadFilter::new(LeadRoute::Leads);
        let counts = tab_counts(&filter, &leads);
        assert_eq!(
            counts,
            vec![
                (TabLabel::All, 3),
                (TabLabel::Pending, 1),
                (TabLabel::Contacted, 2)
            ]
        );
    }

    #[test]
    fn test_pipeline_labels_select_a_matching_leaf() {
        let stage = PipelineStage::from_flags(&FlagVector {
            contacted: true,
            answered: true,
            interested: true,
            hot: true,
            real: true,
            ..Default::default()
        });
        let labels = pipeline_labels(&stage);
        assert_eq!(labels.last(), Some(&TabLabel::NotDeposit));
        let lead = lead_with(stage.to_flags());
        assert!(tab_matches(&path(&labels), &lead));
    }

    #[test]
    fn test_all_paths_covers_hierarchy() {
        let paths = all_paths(LeadRoute::Leads);
        assert!(paths.iter().all(|p| p.depth() <= 5));
        assert_eq!(paths.iter().filter(|p| p.depth() == 5).count(), 2);
        assert_eq!(paths.first().map(TabPath::depth), Some(1));
    }
}
