//! Task query engine
//!
//! Turns list parameters into a [`TaskQueryPlan`] that every store executes
//! with the same semantics:
//!
//! - the owner filter is always present
//! - an optional status filter
//! - an optional full-text search, matching any search term against the
//!   words of title and description and producing a relevance score
//! - ordering by score (descending, only when searching), then the requested
//!   field and direction, then task id ascending
//! - 1-indexed page number and page size
//!
//! The ordering and scoring used by the in-memory store live here so the
//! rules are defined (and tested) in one place.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::models::{Task, TaskStatus, UserId};

/// Default page number
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size
pub const DEFAULT_LIMIT: u64 = 10;

/// Fields a task listing can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    Status,
}

impl SortField {
    /// Column the field maps to in SQL
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            // enum order is declaration order; sort on the label instead
            SortField::Status => "status::text",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Caller-facing list parameters, all optional
#[derive(Debug, Clone, Default)]
pub struct ListTasksParams {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<SortField>,
    pub sort_type: Option<SortDirection>,
}

/// Fully resolved query, ready for a store
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQueryPlan {
    pub owner: UserId,
    pub status: Option<TaskStatus>,
    /// `Some` when searching; the terms are lowercase, unique and non-empty
    /// unless the search string had no usable words
    pub terms: Option<Vec<String>>,
    pub sort_by: SortField,
    pub sort_type: SortDirection,
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl TaskQueryPlan {
    /// Resolves defaults and validates paging
    ///
    /// # Errors
    ///
    /// `InvalidInput` when page or limit is zero or the offset overflows.
    pub fn build(owner: UserId, params: ListTasksParams) -> CoreResult<Self> {
        let page = params.page.unwrap_or(DEFAULT_PAGE);
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 || limit == 0 {
            return Err(CoreError::InvalidInput(
                "Page And Limit Must Be At Least 1!".to_string(),
            ));
        }

        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| CoreError::InvalidInput("Page Is Out Of Range!".to_string()))?;

        Ok(Self {
            owner,
            status: params.status,
            terms: params.search.as_deref().map(search_terms),
            sort_by: params.sort_by.unwrap_or_default(),
            sort_type: params.sort_type.unwrap_or_default(),
            page,
            limit,
            offset,
        })
    }

    /// True when the listing is a text search
    pub fn is_search(&self) -> bool {
        self.terms.is_some()
    }

    /// True when the plan cannot match anything (a search with no words)
    pub fn matches_nothing(&self) -> bool {
        matches!(&self.terms, Some(terms) if terms.is_empty())
    }
}

/// A task together with its relevance score (search only)
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ScoredTask {
    #[sqlx(flatten)]
    pub task: Task,
    pub score: Option<f64>,
}

/// Splits a search string into unique lowercase words
pub fn search_terms(search: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();

    for word in words(search) {
        if !terms.contains(&word) {
            terms.push(word);
        }
    }

    terms
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Relevance of a task for the given terms
///
/// Counts how many words of title and description equal one of the terms.
/// Returns `None` when nothing matches, which excludes the task.
pub fn relevance_score(task: &Task, terms: &[String]) -> Option<f64> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let description = task.description.as_deref().unwrap_or_default();

    for word in words(&task.title).chain(words(description)) {
        *counts.entry(word).or_default() += 1;
    }

    let hits: u32 = terms.iter().filter_map(|term| counts.get(term)).sum();

    (hits > 0).then_some(f64::from(hits))
}

/// Orders two results according to the plan
pub fn compare(a: &ScoredTask, b: &ScoredTask, plan: &TaskQueryPlan) -> Ordering {
    let by_score = if plan.is_search() {
        let left = a.score.unwrap_or_default();
        let right = b.score.unwrap_or_default();
        right.total_cmp(&left)
    } else {
        Ordering::Equal
    };

    let by_field = match plan.sort_by {
        SortField::CreatedAt => a.task.created_at.cmp(&b.task.created_at),
        SortField::UpdatedAt => a.task.updated_at.cmp(&b.task.updated_at),
        SortField::Status => a.task.status.as_str().cmp(b.task.status.as_str()),
    };
    let by_field = match plan.sort_type {
        SortDirection::Asc => by_field,
        SortDirection::Desc => by_field.reverse(),
    };

    by_score
        .then(by_field)
        .then_with(|| a.task.id.cmp(&b.task.id))
}

/// Executes a plan over tasks held in memory
///
/// Returns the requested page and the total number of matching tasks.
pub fn run_in_memory<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    plan: &TaskQueryPlan,
) -> (Vec<ScoredTask>, u64) {
    if plan.matches_nothing() {
        return (Vec::new(), 0);
    }

    let mut matched: Vec<ScoredTask> = tasks
        .into_iter()
        .filter(|task| task.owner_id == plan.owner)
        .filter(|task| plan.status.map_or(true, |status| task.status == status))
        .filter_map(|task| {
            let score = match &plan.terms {
                Some(terms) => Some(relevance_score(task, terms)?),
                None => None,
            };
            Some(ScoredTask {
                task: task.clone(),
                score,
            })
        })
        .collect();

    matched.sort_by(|a, b| compare(a, b, plan));

    let total = matched.len() as u64;
    let page = matched
        .into_iter()
        .skip(usize::try_from(plan.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(plan.limit).unwrap_or(usize::MAX))
        .collect();

    (page, total)
}

/// One page of results plus paging metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Page<T> {
    /// Wraps a page of documents
    ///
    /// `total_pages` is never below 1, so an empty listing is page 1 of 1.
    pub fn new(docs: Vec<T>, total_docs: u64, page: u64, limit: u64) -> Self {
        let total_pages = total_docs.div_ceil(limit.max(1)).max(1);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            paging_counter: (page - 1).saturating_mul(limit).saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }

    /// Converts the documents, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            paging_counter: self.paging_counter,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}
