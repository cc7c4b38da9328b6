use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

pub const MAX_TAB_DEPTH: usize = 5;

/// Every label that can appear in the lead tab hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TabLabel {
    All,
    Pending,
    Assigned,
    #[serde(rename = "Not Assigned")]
    NotAssigned,
    Contacted,
    Interested,
    #[serde(rename = "Not Interested")]
    NotInterested,
    #[serde(rename = "Not Answered")]
    NotAnswered,
    #[serde(rename = "Warm Lead")]
    WarmLead,
    #[serde(rename = "Hot Lead")]
    HotLead,
    Demo,
    Real,
    Deposit,
    #[serde(rename = "Not Deposit")]
    NotDeposit,
}

const ALL_LABELS: [TabLabel; 14] = [
    TabLabel::All,
    TabLabel::Pending,
    TabLabel::Assigned,
    TabLabel::NotAssigned,
    TabLabel::Contacted,
    TabLabel::Interested,
    TabLabel::NotInterested,
    TabLabel::NotAnswered,
    TabLabel::WarmLead,
    TabLabel::HotLead,
    TabLabel::Demo,
    TabLabel::Real,
    TabLabel::Deposit,
    TabLabel::NotDeposit,
];

impl TabLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabLabel::All => "All",
            TabLabel::Pending => "Pending",
            TabLabel::Assigned => "Assigned",
            TabLabel::NotAssigned => "Not Assigned",
            TabLabel::Contacted => "Contacted",
            TabLabel::Interested => "Interested",
            TabLabel::NotInterested => "Not Interested",
            TabLabel::NotAnswered => "Not Answered",
            TabLabel::WarmLead => "Warm Lead",
            TabLabel::HotLead => "Hot Lead",
            TabLabel::Demo => "Demo",
            TabLabel::Real => "Real",
            TabLabel::Deposit => "Deposit",
            TabLabel::NotDeposit => "Not Deposit",
        }
    }

    /// Labels rendered one level below this one. Empty for leaves.
    pub fn children(&self) -> &'static [TabLabel] {
        match self {
            TabLabel::Contacted => &[
                TabLabel::Interested,
                TabLabel::NotInterested,
                TabLabel::NotAnswered,
            ],
            TabLabel::Interested => &[TabLabel::WarmLead, TabLabel::HotLead],
            TabLabel::HotLead => &[TabLabel::Demo, TabLabel::Real],
            TabLabel::Real => &[TabLabel::Deposit, TabLabel::NotDeposit],
            _ => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

impl fmt::Display for TabLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabLabel {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_LABELS
            .iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| TabError::UnknownLabel(wanted.to_string()))
    }
}

/// The four lead list screens. They share the hierarchy below level 1 and
/// differ only in their top-level queue tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum LeadRoute {
    Leads,
    LeadsAdmin,
    BranchLeads,
    SalesManagerLeads,
}

impl LeadRoute {
    pub fn root_labels(&self) -> &'static [TabLabel] {
        match self {
            LeadRoute::Leads | LeadRoute::SalesManagerLeads => {
                &[TabLabel::All, TabLabel::Pending, TabLabel::Contacted]
            }
            LeadRoute::LeadsAdmin => &[
                TabLabel::All,
                TabLabel::NotAssigned,
                TabLabel::Assigned,
                TabLabel::Contacted,
            ],
            LeadRoute::BranchLeads => &[TabLabel::All, TabLabel::NotAssigned, TabLabel::Contacted],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadRoute::Leads => "leads",
            LeadRoute::LeadsAdmin => "leads-admin",
            LeadRoute::BranchLeads => "branch-leads",
            LeadRoute::SalesManagerLeads => "sales-manager-leads",
        }
    }
}

impl FromStr for LeadRoute {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leads" => Ok(LeadRoute::Leads),
            "leads-admin" => Ok(LeadRoute::LeadsAdmin),
            "branch-leads" => Ok(LeadRoute::BranchLeads),
            "sales-manager-leads" => Ok(LeadRoute::SalesManagerLeads),
            other => Err(TabError::UnknownRoute(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabError {
    #[error("Tab level {0} is out of range (1-5)")]
    InvalidLevel(usize),

    #[error("Cannot select level {level} before the level above it is selected")]
    SkippedLevel { level: usize },

    #[error("'{label}' is not available at level {level}")]
    NotAnOption { level: usize, label: TabLabel },

    #[error("Unknown tab label '{0}'")]
    UnknownLabel(String),

    #[error("Unknown lead route '{0}'")]
    UnknownRoute(String),
}

/// Selected path through the tab hierarchy of one lead route.
///
/// Levels are 1-based. The path is always a valid prefix: each selection is an
/// option of the one above it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabPath {
    route: LeadRoute,
    selections: Vec<TabLabel>,
}

impl TabPath {
    pub fn new(route: LeadRoute) -> Self {
        Self {
            route,
            selections: Vec::new(),
        }
    }

    /// Builds a path by selecting each label in order.
    pub fn from_labels(route: LeadRoute, labels: &[TabLabel]) -> Result<Self, TabError> {
        labels
            .iter()
            .enumerate()
            .try_fold(Self::new(route), |path, (idx, label)| {
                path.select(idx + 1, *label)
            })
    }

    /// Parses `"Contacted > Interested > Hot Lead"`. An empty string is the
    /// empty path.
    pub fn parse(route: LeadRoute, raw: &str) -> Result<Self, TabError> {
        let labels = raw
            .split('>')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(TabLabel::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_labels(route, &labels)
    }

    pub fn route(&self) -> LeadRoute {
        self.route
    }

    pub fn labels(&self) -> &[TabLabel] {
        &self.selections
    }

    pub fn depth(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn level(&self, level: usize) -> Option<TabLabel> {
        level
            .checked_sub(1)
            .and_then(|idx| self.selections.get(idx))
            .copied()
    }

    pub fn leaf(&self) -> Option<TabLabel> {
        self.selections.last().copied()
    }

    /// Labels to render at `level` given the selections above it.
    pub fn options(&self, level: usize) -> &'static [TabLabel] {
        match level {
            1 => self.route.root_labels(),
            2..=MAX_TAB_DEPTH => match self.level(level - 1) {
                Some(parent) => parent.children(),
                None => &[],
            },
            _ => &[],
        }
    }

    /// Options for the level right below the current leaf.
    pub fn next_options(&self) -> &'static [TabLabel] {
        self.options(self.depth() + 1)
    }

    /// Selects `label` at `level`, clearing every deeper level.
    pub fn select(&self, level: usize, label: TabLabel) -> Result<Self, TabError> {
        if level == 0 || level > MAX_TAB_DEPTH {
            return Err(TabError::InvalidLevel(level));
        }
        if level > self.depth() + 1 {
            return Err(TabError::SkippedLevel { level });
        }
        if !self.options(level).contains(&label) {
            return Err(TabError::NotAnOption { level, label });
        }

        let mut selections = self.selections[..level - 1].to_vec();
        selections.push(label);

        Ok(Self {
            route: self.route,
            selections,
        })
    }

    /// Drops the selection at `level` and everything below it.
    pub fn clear_from(&self, level: usize) -> Self {
        let keep = level.saturating_sub(1).min(self.depth());
        Self {
            route: self.route,
            selections: self.selections[..keep].to_vec(),
        }
    }
}

/// Reducer form of [`TabPath::select`].
pub fn apply_selection(path: &TabPath, level: usize, label: TabLabel) -> Result<TabPath, TabError> {
    path.select(level, label)
}

impl fmt::Display for TabPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.selections.iter().map(TabLabel::as_str).collect();
        f.write_str(&parts.join(" > "))
    }
}
