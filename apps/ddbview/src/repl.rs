//! Line-oriented front end over one browse session.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use ddbview_core::filter::SortKeyCondition;
use ddbview_core::schema::IndexKeys;
use ddbview_core::view::{column_names, row_cells};
use ddbview_core::{
    BrowseError, BrowseMode, BrowsePage, BrowseSession, FilterExpression, FilterOperator,
    IndexSelector, KeyCondition, PRIMARY_INDEX_NAME, TableCatalog,
};

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  tables                          list tables
  use <table>                     select a table (resets mode and filters)
  attrs                           sample attribute names of the table
  indexes                         show the table's key schema options
  scan | query                    switch mode
  index <name>                    query an index ('Primary Key' for the table)
  pk <value>                      partition key value
  sk <op> <value> | sk            sort key condition, or clear it
  filter <attr> <op> <value>      add a filter (ops: = < <= > >= begins_with)
  filters                         list filters
  rm <id>                         remove a filter
  clear                           remove all filters
  limit <n>                       page size (10, 30, 50 or any n >= 1)
  run | refresh | next | prev     fetch pages
  save                            print the session as JSON
  export <file>                   write the current page as DynamoDB JSON
  open <file>                     show a page written by 'export'
  quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tables,
    Use(String),
    Attributes,
    Indexes,
    Scan,
    Query,
    Index(IndexSelector),
    PartitionKey(String),
    SortKey(Option<(FilterOperator, String)>),
    Filter {
        attribute: String,
        operator: FilterOperator,
        value: String,
    },
    Filters,
    Remove(String),
    Clear,
    Limit(u32),
    Run,
    Refresh,
    Next,
    Previous,
    Save,
    Export(String),
    Open(String),
    Help,
    Quit,
    Empty,
}

/// Parse one line. Values may contain spaces; everything after the last
/// positional argument belongs to the value.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let cmd = match word {
        "" => Command::Empty,
        "tables" => Command::Tables,
        "use" => Command::Use(required(rest, "use <table>")?),
        "attrs" => Command::Attributes,
        "indexes" => Command::Indexes,
        "scan" => Command::Scan,
        "query" => Command::Query,
        "index" => Command::Index(IndexSelector::from_option(&required(rest, "index <name>")?)),
        "pk" => Command::PartitionKey(required(rest, "pk <value>")?),
        "sk" if rest.is_empty() => Command::SortKey(None),
        "sk" => {
            let (op, value) = rest
                .split_once(char::is_whitespace)
                .context("usage: sk <op> <value>")?;
            Command::SortKey(Some((op.parse()?, value.trim().to_owned())))
        }
        "filter" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let (Some(attribute), Some(op), Some(value)) =
                (parts.next(), parts.next(), parts.next())
            else {
                bail!("usage: filter <attr> <op> <value>");
            };
            Command::Filter {
                attribute: attribute.to_owned(),
                operator: op.parse()?,
                value: value.trim().to_owned(),
            }
        }
        "filters" => Command::Filters,
        "rm" => Command::Remove(required(rest, "rm <id>")?),
        "clear" => Command::Clear,
        "limit" => Command::Limit(
            required(rest, "limit <n>")?
                .parse()
                .with_context(|| format!("invalid page size: {rest}"))?,
        ),
        "run" => Command::Run,
        "refresh" => Command::Refresh,
        "next" => Command::Next,
        "prev" => Command::Previous,
        "save" => Command::Save,
        "export" => Command::Export(required(rest, "export <file>")?),
        "open" => Command::Open(required(rest, "open <file>")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };
    Ok(cmd)
}

fn required(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(rest.to_owned())
}

/// Drives a session from parsed commands.
#[derive(Debug)]
pub struct Repl {
    catalog: TableCatalog,
    session: BrowseSession,
}

impl Repl {
    /// Create a front end for one session.
    #[must_use]
    pub fn new(catalog: TableCatalog, session: BrowseSession) -> Self {
        Self { catalog, session }
    }

    /// Run a command and return the text to print. Errors are rendered as
    /// text so the loop keeps going.
    pub async fn handle(&self, cmd: Command) -> String {
        match self.dispatch(cmd).await {
            Ok(out) => out,
            Err(e) => format!("error: {e:#}"),
        }
    }

    async fn dispatch(&self, cmd: Command) -> Result<String> {
        let s = &self.session;
        let out = match cmd {
            Command::Empty | Command::Quit => String::new(),
            Command::Help => HELP.to_owned(),
            Command::Tables => self.catalog.list_tables().await?.join("\n"),
            Command::Use(table) => {
                s.set_table(table.clone());
                format!("using {table}")
            }
            Command::Attributes => {
                let table = self.table()?;
                self.catalog.sample_attribute_names(&table).await?.join(", ")
            }
            Command::Indexes => {
                let table = self.table()?;
                let info = s.resolver().resolve(&table).await?;
                let mut out = format!("{PRIMARY_INDEX_NAME}: {}", key_pair(&info.primary));
                for index in &info.indexes {
                    let _ = write!(
                        out,
                        "\n{} ({}): {}",
                        index.name,
                        index.kind.as_str(),
                        key_pair(&index.keys)
                    );
                }
                out
            }
            Command::Scan => {
                s.set_mode(BrowseMode::Scan);
                "mode: scan".to_owned()
            }
            Command::Query => {
                if !s.mode().is_query() {
                    s.set_mode(BrowseMode::query());
                }
                "mode: query".to_owned()
            }
            Command::Index(index) => {
                let label = index.to_string();
                s.set_index(index);
                format!("index: {label}")
            }
            Command::PartitionKey(value) => {
                let sort = current_key_condition(s).sort;
                s.set_key_condition(KeyCondition {
                    partition_value: value,
                    sort,
                });
                "partition key set".to_owned()
            }
            Command::SortKey(cond) => {
                let mut key = current_key_condition(s);
                key.sort = cond.map(|(operator, value)| SortKeyCondition { operator, value });
                s.set_key_condition(key);
                "sort key condition set".to_owned()
            }
            Command::Filter {
                attribute,
                operator,
                value,
            } => {
                let id = s.add_filter(FilterExpression::with(attribute, operator, value));
                format!("added filter {id}")
            }
            Command::Filters => s
                .filters()
                .iter()
                .map(|f| format!("{} {} {} {}", f.id, f.attribute_name, f.operator, f.value))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Remove(id) => {
                if s.remove_filter(&id) {
                    format!("removed {id}")
                } else {
                    format!("no filter {id}")
                }
            }
            Command::Clear => {
                s.clear_filters();
                "filters cleared".to_owned()
            }
            Command::Limit(n) => {
                s.set_page_size(n)?;
                format!("page size: {n}")
            }
            Command::Run => self.render(&s.execute(true).await?),
            Command::Refresh => self.render(&s.execute(false).await?),
            Command::Next => self.render(&s.next().await?),
            Command::Previous => self.render(&s.previous().await?),
            Command::Save => serde_json::to_string_pretty(&s.snapshot())?,
            Command::Export(path) => {
                let page = s
                    .current_page()
                    .ok_or_else(|| BrowseError::validation("no page fetched yet, try 'run'"))?;
                tokio::fs::write(&path, page.to_dynamodb_json()?)
                    .await
                    .with_context(|| format!("failed to write {path}"))?;
                format!("wrote {} items to {path}", page.items.len())
            }
            Command::Open(path) => {
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {path}"))?;
                let page = BrowsePage::from_dynamodb_json(&text)
                    .with_context(|| format!("{path} is not a DynamoDB JSON page"))?;
                let mut out = self.render_rows(&page);
                let _ = write!(out, "-- {path} | {} items", page.items.len());
                out
            }
        };
        Ok(out)
    }

    fn table(&self) -> Result<String> {
        self.session
            .table_name()
            .ok_or_else(|| BrowseError::validation("no table selected, try 'use <table>'"))
            .map_err(Into::into)
    }

    fn render(&self, page: &BrowsePage) -> String {
        let mut out = self.render_rows(page);
        let _ = write!(
            out,
            "-- page {} | {} items ({} scanned){}{}",
            self.session.page_number(),
            page.count,
            page.scanned_count,
            if self.session.has_previous_page() { " | prev" } else { "" },
            if self.session.has_next_page() { " | next" } else { "" },
        );
        out
    }

    fn render_rows(&self, page: &BrowsePage) -> String {
        let keys = self
            .session
            .table_name()
            .and_then(|t| self.session.resolver().cached(&t));
        let key_attrs = keys
            .as_deref()
            .map(|k| k.primary_key_attributes())
            .unwrap_or_default();
        let columns = column_names(&page.items, &key_attrs);

        let mut out = String::new();
        let _ = writeln!(out, "{}", columns.join("\t"));
        for item in &page.items {
            let _ = writeln!(out, "{}", row_cells(item, &columns).join("\t"));
        }
        out
    }
}

fn key_pair(keys: &IndexKeys) -> String {
    match &keys.sort_key {
        Some(sort) => format!("{} / {sort}", keys.partition_key),
        None => keys.partition_key.clone(),
    }
}

fn current_key_condition(session: &BrowseSession) -> KeyCondition {
    match session.mode() {
        BrowseMode::Query { key_condition, .. } => key_condition,
        BrowseMode::Scan => KeyCondition::default(),
    }
}
