use chrono::NaiveDate;
use shared_types::{
    tab_counts, DateRange, DateRangeError, Lead, LeadFilter, LeadRoute, ListQuery,
    StatusError, StatusSelection, TabError, TabLabel, TabPath, UpdateLeadStatusRequest,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};

use crate::client::LeadFetcher;
use crate::error::{ApiOutcome, ClientError};

/// View state of one lead list screen. All four lead routes use this type;
/// they differ only in their [`LeadRoute`].
///
/// A refresh walks every server page of the date range, so the tab path,
/// search text, badge counts and paging all run locally over the complete
/// set and switching tabs never refetches.
#[derive(Debug, Clone)]
pub struct LeadBoard {
    filter: LeadFilter,
    range: DateRange,
    branch_id: Option<i64>,
    page: u32,
    leads: Vec<Lead>,
    total: u64,
    last_error: Option<String>,
}

impl LeadBoard {
    pub fn new(route: LeadRoute, range: DateRange) -> Self {
        Self {
            filter: LeadFilter::new(route),
            range,
            branch_id: None,
            page: 1,
            leads: Vec::new(),
            total: 0,
            last_error: None,
        }
    }

    pub fn route(&self) -> LeadRoute {
        self.filter.path.route()
    }

    pub fn path(&self) -> &TabPath {
        &self.filter.path
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn search(&self) -> &str {
        &self.filter.search
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Server-side total for the date range, before tab and search.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Selects `label` at `level` and clears every deeper level.
    pub fn select_tab(&mut self, level: usize, label: TabLabel) -> Result<(), TabError> {
        self.filter.path = self.filter.path.select(level, label)?;
        Ok(())
    }

    pub fn set_path(&mut self, path: TabPath) -> Result<(), TabError> {
        if path.route() != self.route() {
            return Err(TabError::UnknownRoute(path.route().as_str().to_string()));
        }
        self.filter.path = path;
        Ok(())
    }

    pub fn clear_tabs_from(&mut self, level: usize) {
        self.filter.path = self.filter.path.clear_from(level);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_branch(&mut self, branch_id: Option<i64>) {
        self.branch_id = branch_id;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Rejects a start after the current end without touching either bound.
    pub fn set_start_date(&mut self, start: NaiveDate) -> Result<(), DateRangeError> {
        self.range.set_start(start)
    }

    /// Rejects an end before the current start without touching either bound.
    pub fn set_end_date(&mut self, end: NaiveDate) -> Result<(), DateRangeError> {
        self.range.set_end(end)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Query for one server page of the date range. Tab and search are not
    /// sent; they are applied locally.
    pub fn query(&self, server_page: u32) -> ListQuery {
        let (from_date, to_date) = self.range.query_params();
        ListQuery {
            param_page: Some(server_page),
            param_limit: Some(MAX_PAGE_LIMIT),
            from_date: Some(from_date),
            to_date: Some(to_date),
            branch_id: self.branch_id,
            ..Default::default()
        }
    }

    /// Leads under the selected tab path that match the search text.
    pub fn visible(&self) -> Vec<&Lead> {
        self.filter.apply(&self.leads)
    }

    /// The current page of [`LeadBoard::visible`], `DEFAULT_PAGE_LIMIT` rows
    /// per page.
    pub fn visible_page(&self) -> Vec<&Lead> {
        let limit = DEFAULT_PAGE_LIMIT as usize;
        self.visible()
            .into_iter()
            .skip((self.page as usize - 1) * limit)
            .take(limit)
            .collect()
    }

    /// Badge counts for the options one level below the selected path.
    pub fn counts(&self) -> Vec<(TabLabel, usize)> {
        tab_counts(&self.filter, &self.leads)
    }

    /// Loads every lead in the date range, one server page at a time. On
    /// failure the previously loaded leads stay in place and the error
    /// message is kept for display.
    pub async fn refresh(&mut self, fetcher: &dyn LeadFetcher) -> ApiOutcome<usize> {
        let route = self.route();
        let mut leads = Vec::new();
        let mut server_page = 1;

        let total = loop {
            let page = match fetcher.fetch_leads(route, &self.query(server_page)).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!("Refreshing {} failed: {}", route.as_str(), err);
                    self.last_error = Some(err.to_string());
                    return ApiOutcome::failure(&err);
                }
            };

            let fetched = page.items.len();
            leads.extend(page.items);

            if fetched == 0 || leads.len() as u64 >= page.total || server_page >= page.total_pages {
                break page.total;
            }
            server_page += 1;
        };

        self.leads = leads;
        self.total = total;
        self.last_error = None;
        tracing::debug!(
            "Loaded {} of {} leads for {} in {} requests",
            self.leads.len(),
            self.total,
            route.as_str(),
            server_page
        );
        ApiOutcome::from_result(Ok(self.leads.len()), "Leads fetched")
    }

    /// Swaps in a lead returned by a mutation so the board reflects it
    /// without refetching.
    pub fn replace_lead(&mut self, lead: Lead) {
        if let Some(existing) = self.leads.iter_mut().find(|l| l.id == lead.id) {
            *existing = lead;
        }
    }

    pub fn remove_lead(&mut self, id: i64) {
        let before = self.leads.len();
        self.leads.retain(|lead| lead.id != id);
        if self.leads.len() < before {
            self.total = self.total.saturating_sub(1);
        }
    }

    /// Builds the status update for a lead on this board from the modal's
    /// selection.
    pub fn status_request(
        &self,
        lead_id: i64,
        selection: &StatusSelection,
        remarks: &str,
        now: i64,
    ) -> Result<UpdateLeadStatusRequest, ClientError> {
        let lead = self
            .leads
            .iter()
            .find(|lead| lead.id == lead_id)
            .ok_or_else(|| ClientError::NotFound("Lead not found".to_string()))?;

        let update = selection
            .encode(remarks)
            .map_err(|e: StatusError| ClientError::Validation(e.to_string()))?;

        Ok(update.into_request(lead_id, lead.lead_agent_id, now))
    }
}
