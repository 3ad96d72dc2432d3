//! Helpers for rendering a page of items as a table.

use std::collections::HashSet;

use ddbview_model::Item;

/// Column names for a page: the given key attributes first, then every other
/// attribute in first-seen order.
///
/// Items are maps, so "first-seen" within one item follows sorted key order.
#[must_use]
pub fn column_names(items: &[Item], key_attributes: &[&str]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();

    for &key in key_attributes {
        if seen.insert(key) {
            columns.push(key.to_owned());
        }
    }
    for item in items {
        let mut names: Vec<&str> = item.keys().map(String::as_str).collect();
        names.sort_unstable();
        for name in names {
            if seen.insert(name) {
                columns.push(name.to_owned());
            }
        }
    }
    columns
}

/// One row of cells aligned with `columns`; missing attributes are empty.
#[must_use]
pub fn row_cells(item: &Item, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| item.get(c).map(|v| v.display_value()).unwrap_or_default())
        .collect()
}
