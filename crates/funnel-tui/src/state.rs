//! Client-side investor cache with filtering and pagination.
//!
//! [`Dashboard`] owns the nested investors fetched from the server. The
//! renderer only sees [`PageView`] snapshots; the sync layer mirrors confirmed
//! writes back through [`Dashboard::apply_progress`] and
//! [`Dashboard::apply_note`].

use std::collections::BTreeSet;
use std::fmt;

use funnel_core::model::{Investor, Owner, ProgressEntry, Stage};

/// Investors shown per page.
pub const PAGE_SIZE: usize = 100;

/// Which ownership states pass the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerFilter {
    #[default]
    All,
    /// No owner has an active entry.
    Unowned,
    /// This owner has an active entry.
    Owner(Owner),
    /// Every recognized owner has an active entry.
    Both,
}

impl OwnerFilter {
    #[must_use]
    pub fn matches(self, investor: &Investor) -> bool {
        match self {
            Self::All => true,
            Self::Unowned => !Owner::ALL.iter().any(|o| investor.is_owned_by(*o)),
            Self::Owner(owner) => investor.is_owned_by(owner),
            Self::Both => Owner::ALL.iter().all(|o| investor.is_owned_by(*o)),
        }
    }

    /// All → each owner → Both → Unowned → All.
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Owner(Owner::ALL[0]),
            Self::Owner(owner) => Owner::ALL
                .iter()
                .skip_while(|o| **o != owner)
                .nth(1)
                .map_or(Self::Both, |next| Self::Owner(*next)),
            Self::Both => Self::Unowned,
            Self::Unowned => Self::All,
        }
    }
}

impl fmt::Display for OwnerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Unowned => f.write_str("none"),
            Self::Owner(owner) => write!(f, "{owner}"),
            Self::Both => f.write_str("both"),
        }
    }
}

/// The three filter predicates, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub owner: OwnerFilter,
    pub stages: BTreeSet<Stage>,
}

impl Filters {
    #[must_use]
    pub fn matches(&self, investor: &Investor) -> bool {
        self.matches_search(investor)
            && self.owner.matches(investor)
            && self.matches_stages(investor)
    }

    fn matches_search(&self, investor: &Investor) -> bool {
        // Whitespace in the term is significant; only case is folded
        let term = self.search.to_lowercase();
        if term.is_empty() {
            return true;
        }
        let haystack = format!(
            "{} {} {}",
            investor.name,
            investor.title.as_deref().unwrap_or_default(),
            investor.company.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        haystack.contains(&term)
    }

    fn matches_stages(&self, investor: &Investor) -> bool {
        self.stages.is_empty()
            || investor
                .owner_progress
                .iter()
                .any(|p| p.is_active && self.stages.contains(&p.stage))
    }
}

/// Read-only snapshot of the current page.
#[derive(Debug)]
pub struct PageView<'a> {
    pub items: Vec<&'a Investor>,
    /// 1-indexed.
    pub page: usize,
    /// Zero when nothing matches.
    pub total_pages: usize,
    pub filtered: usize,
    pub total: usize,
}

/// Investor cache plus filter and page state.
#[derive(Debug)]
pub struct Dashboard {
    investors: Vec<Investor>,
    filters: Filters,
    /// Indices into `investors` that pass `filters`, in cache order.
    visible: Vec<usize>,
    page: usize,
}

impl Default for Dashboard {
    /// Empty cache on page 1.
    fn default() -> Self {
        Self {
            investors: Vec::new(),
            filters: Filters::default(),
            visible: Vec::new(),
            page: 1,
        }
    }
}

impl Dashboard {
    #[must_use]
    pub fn new(investors: Vec<Investor>) -> Self {
        let mut dashboard = Self {
            investors,
            ..Self::default()
        };
        dashboard.apply_filters();
        dashboard
    }

    /// Swap in a freshly fetched cache, keeping the current filters.
    pub fn replace_investors(&mut self, investors: Vec<Investor>) {
        self.investors = investors;
        self.apply_filters();
    }

    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filters.search = term.into();
        self.apply_filters();
    }

    pub fn set_owner_filter(&mut self, owner: OwnerFilter) {
        self.filters.owner = owner;
        self.apply_filters();
    }

    pub fn toggle_stage_filter(&mut self, stage: Stage) {
        if !self.filters.stages.remove(&stage) {
            self.filters.stages.insert(stage);
        }
        self.apply_filters();
    }

    pub fn clear_stage_filter(&mut self) {
        self.filters.stages.clear();
        self.apply_filters();
    }

    /// Recompute the visible set and return to page 1.
    pub fn apply_filters(&mut self) {
        self.visible = self
            .investors
            .iter()
            .enumerate()
            .filter(|(_, investor)| self.filters.matches(investor))
            .map(|(i, _)| i)
            .collect();
        self.page = 1;
    }

    /// Investors in the cache, filtered or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.investors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.investors.is_empty()
    }

    #[must_use]
    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(PAGE_SIZE)
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.last_page());
    }

    /// Advance one page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let before = self.page;
        self.go_to_page(self.page + 1);
        self.page != before
    }

    /// Go back one page. Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        let before = self.page;
        self.go_to_page(self.page.saturating_sub(1));
        self.page != before
    }

    #[must_use]
    pub fn page_view(&self) -> PageView<'_> {
        let start = self.page.saturating_sub(1) * PAGE_SIZE;
        let items = self
            .visible
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .filter_map(|i| self.investors.get(*i))
            .collect();

        PageView {
            items,
            page: self.page,
            total_pages: self.total_pages(),
            filtered: self.visible.len(),
            total: self.investors.len(),
        }
    }

    #[must_use]
    pub fn investor(&self, investor_id: i64) -> Option<&Investor> {
        self.investors.iter().find(|i| i.id == investor_id)
    }

    fn investor_mut(&mut self, investor_id: i64) -> Option<&mut Investor> {
        self.investors.iter_mut().find(|i| i.id == investor_id)
    }

    /// Mirror a confirmed progress write: the owner's entries are replaced by
    /// `entry`, or removed when it is `None`.
    ///
    /// The visible set is not recomputed, so the record stays on screen even
    /// if it no longer matches the filters.
    pub fn apply_progress(&mut self, investor_id: i64, owner: Owner, entry: Option<ProgressEntry>) {
        if let Some(investor) = self.investor_mut(investor_id) {
            investor.owner_progress.retain(|p| p.owner_name != owner);
            investor.owner_progress.extend(entry);
        }
    }

    /// Mirror a confirmed note write.
    pub fn apply_note(&mut self, investor_id: i64, note: Option<String>) {
        if let Some(investor) = self.investor_mut(investor_id) {
            investor.notes = note;
        }
    }
}
