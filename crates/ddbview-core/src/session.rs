//! Paginated browse sessions.
//!
//! A [`BrowseSession`] owns everything one browse tab needs: the selected
//! table, Scan or Query mode, filters, page size and the cursor history used
//! for previous/next navigation.
//!
//! The cursor history always starts as `[None]` (the first page has no start
//! key). Entry `i` is the start key of page `i`. Moving forward appends the
//! start key of the new page unless it is already known; moving back replays
//! the stored key.
//!
//! State is only mutated after a successful response. A response that arrives
//! after the session was reconfigured is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ddbview_model::input::{QueryInput, ScanInput};
use ddbview_model::operations::DynamoDBOperation;
use ddbview_model::output::{QueryOutput, ScanOutput};
use ddbview_model::Item;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BrowseError, BrowseResult, remote_error_to_browse};
use crate::expression::{
    compile_filters, compile_key_condition, merge_expression_names, merge_expression_values,
};
use crate::filter::{FilterExpression, FilterOperator, KeyCondition};
use crate::schema::{IndexSelector, KeySchemaResolver};

/// Page sizes offered to the user.
pub const PAGE_SIZE_OPTIONS: [u32; 3] = [10, 30, 50];

/// Start key of a page: the `LastEvaluatedKey` of the page before it.
pub type PageCursor = Item;

/// How items are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowseMode {
    /// Full table scan with optional filters.
    #[default]
    Scan,
    /// Key lookup against the base table or an index, with optional filters.
    Query {
        /// The base table or a secondary index.
        index: IndexSelector,
        /// Partition key value and optional sort key comparison.
        #[serde(rename = "keyCondition")]
        key_condition: KeyCondition,
    },
}

impl BrowseMode {
    /// Query mode against the base table with an empty key condition.
    #[must_use]
    pub fn query() -> Self {
        Self::Query {
            index: IndexSelector::Primary,
            key_condition: KeyCondition::default(),
        }
    }

    /// Whether this is a Query.
    #[must_use]
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

/// One fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowsePage {
    /// Items in store order.
    pub items: Vec<Item>,
    /// Start key of the following page, if there is one.
    pub next_cursor: Option<PageCursor>,
    /// Items returned.
    pub count: i32,
    /// Items evaluated before filtering.
    pub scanned_count: i32,
}

impl BrowsePage {
    /// Encode the page as a DynamoDB `Scan` response body (`Items`, `Count`,
    /// `ScannedCount`, `LastEvaluatedKey`).
    pub fn to_dynamodb_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ScanOutput::from(self.clone()))
    }

    /// Decode a page saved by [`BrowsePage::to_dynamodb_json`], or any
    /// `Scan`/`Query` response body.
    pub fn from_dynamodb_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<ScanOutput>(json).map(Self::from)
    }
}

impl From<ScanOutput> for BrowsePage {
    fn from(output: ScanOutput) -> Self {
        Self {
            items: output.items,
            next_cursor: non_empty(output.last_evaluated_key),
            count: output.count,
            scanned_count: output.scanned_count,
        }
    }
}

impl From<QueryOutput> for BrowsePage {
    fn from(output: QueryOutput) -> Self {
        Self {
            items: output.items,
            next_cursor: non_empty(output.last_evaluated_key),
            count: output.count,
            scanned_count: output.scanned_count,
        }
    }
}

impl From<BrowsePage> for ScanOutput {
    fn from(page: BrowsePage) -> Self {
        Self {
            items: page.items,
            count: page.count,
            scanned_count: page.scanned_count,
            last_evaluated_key: page.next_cursor.unwrap_or_default(),
        }
    }
}

/// Persistable part of a session. Restoring it starts from the first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Selected table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Scan or Query.
    #[serde(default)]
    pub mode: BrowseMode,
    /// Filters in order.
    #[serde(default)]
    pub filters: Vec<FilterExpression>,
    /// Page size.
    pub page_size: u32,
}

#[derive(Debug)]
struct SessionState {
    table_name: Option<String>,
    mode: BrowseMode,
    filters: Vec<FilterExpression>,
    page_size: u32,
    history: Vec<Option<PageCursor>>,
    position: usize,
    last_page: Option<BrowsePage>,
    generation: u64,
}

impl SessionState {
    fn reset_pagination(&mut self) {
        self.history = vec![None];
        self.position = 0;
        self.last_page = None;
        self.generation += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    Fresh,
    Refresh,
    Next,
    Previous,
}

/// Everything a fetch needs, captured under the lock.
struct FetchPlan {
    table_name: String,
    mode: BrowseMode,
    filters: Vec<FilterExpression>,
    limit: i32,
    cursor: Option<PageCursor>,
    target: usize,
    cached: bool,
    generation: u64,
}

/// Sets the loading flag for its lifetime.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> BrowseResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BrowseError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One browse tab.
#[derive(Debug)]
pub struct BrowseSession {
    resolver: Arc<KeySchemaResolver>,
    state: Mutex<SessionState>,
    loading: AtomicBool,
}

impl BrowseSession {
    /// A session with no table selected, in Scan mode.
    #[must_use]
    pub fn new(resolver: Arc<KeySchemaResolver>, page_size: u32) -> Self {
        Self {
            resolver,
            state: Mutex::new(SessionState {
                table_name: None,
                mode: BrowseMode::Scan,
                filters: Vec::new(),
                page_size: page_size.max(1),
                history: vec![None],
                position: 0,
                last_page: None,
                generation: 0,
            }),
            loading: AtomicBool::new(false),
        }
    }

    /// A session restored from a snapshot.
    pub fn from_snapshot(
        resolver: Arc<KeySchemaResolver>,
        snapshot: SessionSnapshot,
    ) -> BrowseResult<Self> {
        let session = Self::new(resolver, snapshot.page_size.max(1));
        session.restore(snapshot)?;
        Ok(session)
    }

    // -- Observers --

    /// The resolver shared with other sessions.
    #[must_use]
    pub fn resolver(&self) -> &Arc<KeySchemaResolver> {
        &self.resolver
    }

    /// Selected table.
    #[must_use]
    pub fn table_name(&self) -> Option<String> {
        self.state.lock().table_name.clone()
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> BrowseMode {
        self.state.lock().mode.clone()
    }

    /// Filters in order.
    #[must_use]
    pub fn filters(&self) -> Vec<FilterExpression> {
        self.state.lock().filters.clone()
    }

    /// Page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.state.lock().page_size
    }

    /// The last page applied to the session.
    #[must_use]
    pub fn current_page(&self) -> Option<BrowsePage> {
        self.state.lock().last_page.clone()
    }

    /// One-based number of the current page.
    #[must_use]
    pub fn page_number(&self) -> usize {
        self.state.lock().position + 1
    }

    /// Number of known page start keys, including the first page's `None`.
    #[must_use]
    pub fn cursor_history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Whether the last response said there are more items.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.state
            .lock()
            .last_page
            .as_ref()
            .is_some_and(|p| p.next_cursor.is_some())
    }

    /// Whether the current page is not the first.
    #[must_use]
    pub fn has_previous_page(&self) -> bool {
        self.state.lock().position > 0
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    // -- Configuration; every change resets pagination --

    /// Select a table. Mode goes back to Scan and filters are cleared. A blank
    /// name clears the selection.
    pub fn set_table(&self, table_name: impl Into<String>) {
        let mut state = self.state.lock();
        state.table_name = selected_table(Some(table_name.into()));
        state.mode = BrowseMode::Scan;
        state.filters.clear();
        state.reset_pagination();
        debug!(table = ?state.table_name, "table selected");
    }

    /// Switch between Scan and Query.
    pub fn set_mode(&self, mode: BrowseMode) {
        let mut state = self.state.lock();
        state.mode = mode;
        state.reset_pagination();
    }

    /// Choose the index to query. Switches to Query mode if needed and keeps
    /// the current key condition.
    pub fn set_index(&self, index: IndexSelector) {
        let mut state = self.state.lock();
        let key_condition = match std::mem::take(&mut state.mode) {
            BrowseMode::Query { key_condition, .. } => key_condition,
            BrowseMode::Scan => KeyCondition::default(),
        };
        state.mode = BrowseMode::Query {
            index,
            key_condition,
        };
        state.reset_pagination();
    }

    /// Set the key condition. Switches to Query mode on the base table if needed.
    pub fn set_key_condition(&self, key_condition: KeyCondition) {
        let mut state = self.state.lock();
        let index = match std::mem::take(&mut state.mode) {
            BrowseMode::Query { index, .. } => index,
            BrowseMode::Scan => IndexSelector::Primary,
        };
        state.mode = BrowseMode::Query {
            index,
            key_condition,
        };
        state.reset_pagination();
    }

    /// Set the page size. Zero is rejected.
    pub fn set_page_size(&self, page_size: u32) -> BrowseResult<()> {
        if page_size == 0 {
            return Err(BrowseError::validation("page size must be at least 1"));
        }
        let mut state = self.state.lock();
        state.page_size = page_size;
        state.reset_pagination();
        Ok(())
    }

    /// Append a filter and return its id.
    pub fn add_filter(&self, filter: FilterExpression) -> String {
        let mut state = self.state.lock();
        let id = filter.id.clone();
        state.filters.push(filter);
        state.reset_pagination();
        id
    }

    /// Replace the fields of the filter with `id`.
    pub fn update_filter(
        &self,
        id: &str,
        attribute_name: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> BrowseResult<()> {
        let mut state = self.state.lock();
        let filter = state
            .filters
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| BrowseError::validation(format!("no filter with id {id}")))?;
        filter.attribute_name = attribute_name.into();
        filter.operator = operator;
        filter.value = value.into();
        state.reset_pagination();
        Ok(())
    }

    /// Remove the filter with `id`. Returns whether it existed.
    pub fn remove_filter(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.filters.len();
        state.filters.retain(|f| f.id != id);
        let removed = state.filters.len() != before;
        if removed {
            state.reset_pagination();
        }
        removed
    }

    /// Remove every filter.
    pub fn clear_filters(&self) {
        let mut state = self.state.lock();
        state.filters.clear();
        state.reset_pagination();
    }

    /// Persistable state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            table_name: state.table_name.clone(),
            mode: state.mode.clone(),
            filters: state.filters.clone(),
            page_size: state.page_size,
        }
    }

    /// Replace the configuration with a snapshot and start from the first page.
    pub fn restore(&self, snapshot: SessionSnapshot) -> BrowseResult<()> {
        if snapshot.page_size == 0 {
            return Err(BrowseError::validation("page size must be at least 1"));
        }
        let mut state = self.state.lock();
        state.table_name = selected_table(snapshot.table_name);
        state.mode = snapshot.mode;
        state.filters = snapshot.filters;
        state.page_size = snapshot.page_size;
        state.reset_pagination();
        Ok(())
    }

    // -- Fetching --

    /// Run the current request.
    ///
    /// A fresh execution starts from the first page. Otherwise the current
    /// page is fetched again with its stored start key.
    pub async fn execute(&self, is_fresh_query: bool) -> BrowseResult<BrowsePage> {
        let nav = if is_fresh_query {
            Navigation::Fresh
        } else {
            Navigation::Refresh
        };
        self.fetch(nav).await
    }

    /// Fetch the following page.
    pub async fn next(&self) -> BrowseResult<BrowsePage> {
        self.fetch(Navigation::Next).await
    }

    /// Fetch the preceding page.
    pub async fn previous(&self) -> BrowseResult<BrowsePage> {
        self.fetch(Navigation::Previous).await
    }

    async fn fetch(&self, nav: Navigation) -> BrowseResult<BrowsePage> {
        let _guard = LoadingGuard::acquire(&self.loading)?;
        let plan = self.plan(nav)?;
        debug!(
            table = %plan.table_name,
            ?nav,
            target = plan.target,
            cached = plan.cached,
            "fetching page"
        );

        let page = match &plan.mode {
            BrowseMode::Scan => self.run_scan(&plan).await?,
            BrowseMode::Query {
                index,
                key_condition,
            } => self.run_query(&plan, index, key_condition).await?,
        };

        let mut state = self.state.lock();
        if state.generation != plan.generation {
            warn!(table = %plan.table_name, "discarding response for a superseded request");
            return Err(BrowseError::Superseded);
        }
        match nav {
            Navigation::Fresh => {
                state.history = vec![None];
                state.position = 0;
            }
            Navigation::Refresh => {}
            Navigation::Next => {
                if !plan.cached {
                    state.history.truncate(plan.target);
                    state.history.push(plan.cursor);
                }
                state.position = plan.target;
            }
            Navigation::Previous => state.position = plan.target,
        }
        state.last_page = Some(page.clone());
        debug!(
            table = %plan.table_name,
            page = state.position + 1,
            history = state.history.len(),
            has_next = page.next_cursor.is_some(),
            "page applied"
        );
        Ok(page)
    }

    fn plan(&self, nav: Navigation) -> BrowseResult<FetchPlan> {
        let state = self.state.lock();
        let table_name = state
            .table_name
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BrowseError::validation("no table selected"))?;
        if state.page_size == 0 {
            return Err(BrowseError::validation("page size must be at least 1"));
        }
        if let BrowseMode::Query { key_condition, .. } = &state.mode {
            if key_condition.partition_value.is_empty() {
                return Err(BrowseError::validation(
                    "a partition key value is required to query",
                ));
            }
        }

        let (target, cursor, cached) = match nav {
            Navigation::Fresh => (0, None, false),
            Navigation::Refresh => (
                state.position,
                state.history.get(state.position).cloned().flatten(),
                true,
            ),
            Navigation::Next => {
                let target = state.position + 1;
                if let Some(cursor) = state.history.get(target) {
                    (target, cursor.clone(), true)
                } else {
                    let next = state
                        .last_page
                        .as_ref()
                        .and_then(|p| p.next_cursor.clone())
                        .ok_or_else(|| BrowseError::validation("there is no next page"))?;
                    (target, Some(next), false)
                }
            }
            Navigation::Previous => {
                let target = state
                    .position
                    .checked_sub(1)
                    .ok_or_else(|| BrowseError::validation("there is no previous page"))?;
                (target, state.history.get(target).cloned().flatten(), true)
            }
        };

        Ok(FetchPlan {
            table_name,
            mode: state.mode.clone(),
            filters: state.filters.clone(),
            limit: i32::try_from(state.page_size).unwrap_or(i32::MAX),
            cursor,
            target,
            cached,
            generation: state.generation,
        })
    }

    async fn run_scan(&self, plan: &FetchPlan) -> BrowseResult<BrowsePage> {
        let filter = compile_filters(&plan.filters);
        let input = ScanInput {
            table_name: plan.table_name.clone(),
            filter_expression: filter.expression,
            expression_attribute_names: filter.names,
            expression_attribute_values: filter.values,
            limit: Some(plan.limit),
            exclusive_start_key: plan.cursor.clone().unwrap_or_default(),
        };
        debug!(
            table = %plan.table_name,
            operation = %DynamoDBOperation::Scan,
            filter = ?input.filter_expression,
            limit = plan.limit,
            "submitting request"
        );

        let output = self
            .resolver
            .store()
            .scan(input)
            .await
            .map_err(|e| remote_error_to_browse(e.for_operation(DynamoDBOperation::Scan)))?;
        Ok(BrowsePage::from(output))
    }

    async fn run_query(
        &self,
        plan: &FetchPlan,
        index: &IndexSelector,
        key_condition: &KeyCondition,
    ) -> BrowseResult<BrowsePage> {
        let schema = self.resolver.resolve(&plan.table_name).await?;
        let keys = schema.keys_for(index).ok_or_else(|| {
            BrowseError::validation(format!(
                "index {index} does not exist on table {}",
                plan.table_name
            ))
        })?;

        let partition_value =
            schema.key_literal(&keys.partition_key, &key_condition.partition_value)?;
        let sort = match (keys.sort_key.as_deref(), key_condition.effective_sort()) {
            (Some(sort_key), Some(cond)) => Some((
                sort_key,
                cond.operator,
                schema.key_literal(sort_key, &cond.value)?,
            )),
            (None, Some(_)) => {
                debug!(
                    table = %plan.table_name,
                    %index,
                    "index has no sort key, ignoring sort condition"
                );
                None
            }
            _ => None,
        };

        let key = compile_key_condition(&keys.partition_key, partition_value, sort);
        let filter = compile_filters(&plan.filters);
        let mut names = key.names;
        let mut values = key.values;
        merge_expression_names(&mut names, filter.names);
        merge_expression_values(&mut values, filter.values);

        let input = QueryInput {
            table_name: plan.table_name.clone(),
            index_name: index.index_name().map(str::to_owned),
            key_condition_expression: key.expression,
            filter_expression: filter.expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            limit: Some(plan.limit),
            exclusive_start_key: plan.cursor.clone().unwrap_or_default(),
        };
        debug!(
            table = %plan.table_name,
            operation = %DynamoDBOperation::Query,
            index = ?input.index_name,
            key_condition = ?input.key_condition_expression,
            filter = ?input.filter_expression,
            limit = plan.limit,
            "submitting request"
        );

        let output = self
            .resolver
            .store()
            .query(input)
            .await
            .map_err(|e| remote_error_to_browse(e.for_operation(DynamoDBOperation::Query)))?;
        Ok(BrowsePage::from(output))
    }
}

fn selected_table(name: Option<String>) -> Option<String> {
    name.filter(|t| !t.trim().is_empty())
}

fn non_empty(key: Item) -> Option<PageCursor> {
    (!key.is_empty()).then_some(key)
}
