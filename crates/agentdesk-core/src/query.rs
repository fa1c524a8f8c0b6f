// Query pipeline
//
// Derives the visible page, match counts and summary counters from a
// snapshot of the directory plus the user's search/filter/page state.
// Everything here is recomputed on demand; nothing is cached.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::agent::Agent;

/// Agents shown per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(6) {
    Some(size) => size,
    None => unreachable!(),
};

/// Status filter applied to the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn matches(&self, agent: &Agent) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => agent.is_active,
            StatusFilter::Inactive => !agent.is_active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Inactive => "inactive",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// Counters over the whole, unfiltered collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

impl Summary {
    pub fn of(agents: &[Agent]) -> Self {
        let active = agents.iter().filter(|a| a.is_active).count();
        Summary {
            total: agents.len(),
            active,
            inactive: agents.len() - active,
        }
    }
}

/// One page of the filtered listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub items: Vec<Agent>,
    /// Agents matching search and filter, across all pages
    pub total_matching: usize,
    /// Always at least 1
    pub total_pages: usize,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    pub summary: Summary,
}

impl PageView {
    /// Page numbers for pagination controls
    pub fn page_numbers(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.total_pages
    }

    /// (first shown, last shown, total matching), 1-based; (0, 0, 0) when empty
    pub fn range(&self) -> (usize, usize, usize) {
        if self.items.is_empty() {
            return (0, 0, 0);
        }
        let first = (self.page - 1) * self.page_size + 1;
        (first, first + self.items.len() - 1, self.total_matching)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Case-insensitive match against name, description, model display name and owner name.
/// Blank search text matches everything. Otherwise the text is matched as typed,
/// surrounding spaces included.
pub fn matches_search(agent: &Agent, search: &str) -> bool {
    if search.trim().is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [
        Some(agent.name.as_str()),
        Some(agent.description()),
        Some(agent.model_name()),
        agent.owner_name(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Agents matching both the search text and the status filter, in collection order
pub fn filter_agents<'a>(agents: &'a [Agent], search: &str, status: StatusFilter) -> Vec<&'a Agent> {
    agents
        .iter()
        .filter(|a| status.matches(a) && matches_search(a, search))
        .collect()
}

/// ceil(count / page_size), minimum 1
pub fn total_pages(count: usize, page_size: NonZeroUsize) -> usize {
    count.div_ceil(page_size.get()).max(1)
}

/// Run the full pipeline for a given page.
///
/// The page is used as given; out-of-range pages yield an empty item list.
/// Use [`QueryState::view`] to get the clamping behavior of the console.
pub fn run_query(
    agents: &[Agent],
    search: &str,
    status: StatusFilter,
    page: usize,
    page_size: NonZeroUsize,
) -> PageView {
    let filtered = filter_agents(agents, search, status);
    let size = page_size.get();
    let start = page.saturating_sub(1).saturating_mul(size).min(filtered.len());
    let end = start.saturating_add(size).min(filtered.len());

    PageView {
        items: filtered[start..end].iter().map(|a| (*a).clone()).collect(),
        total_matching: filtered.len(),
        total_pages: total_pages(filtered.len(), page_size),
        page,
        page_size: size,
        summary: Summary::of(agents),
    }
}

/// Search, filter and pagination state owned by the listing view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    search: String,
    status: StatusFilter,
    page: usize,
    page_size: NonZeroUsize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            page: 1,
            page_size,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status(&self) -> StatusFilter {
        self.status
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Change the search text; always returns to page 1
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// Change the status filter; always returns to page 1
    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.status = status;
        self.page = 1;
    }

    /// Jump to a page if it is within `1..=total_pages`. Returns whether the page changed.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) -> bool {
        if page >= 1 && page <= total_pages && page != self.page {
            self.page = page;
            return true;
        }
        false
    }

    pub fn next_page(&mut self, total_pages: usize) -> bool {
        self.go_to_page(self.page + 1, total_pages)
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            return true;
        }
        false
    }

    /// Derive the current page, clamping the stored page to `[1, total_pages]` first
    pub fn view(&mut self, agents: &[Agent]) -> PageView {
        let matching = filter_agents(agents, &self.search, self.status).len();
        self.page = self.page.clamp(1, total_pages(matching, self.page_size));
        run_query(agents, &self.search, self.status, self.page, self.page_size)
    }

    /// Total pages for the current search and filter
    pub fn total_pages(&self, agents: &[Agent]) -> usize {
        total_pages(
            filter_agents(agents, &self.search, self.status).len(),
            self.page_size,
        )
    }
}
