//! Pages picked by hand, independent of any strategy.

use crate::error::{Result, SplitError};
use std::collections::BTreeSet;

/// Set of 1-based page numbers.
///
/// Knows nothing about documents; callers validate indices against the page count
/// before mutating (see `SplitSession::toggle_page`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    selected: BTreeSet<u32>,
}

impl PageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `page` if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, page: u32) -> bool {
        if self.selected.remove(&page) {
            false
        } else {
            self.selected.insert(page);
            true
        }
    }

    pub fn add(&mut self, page: u32) {
        self.selected.insert(page);
    }

    pub fn remove(&mut self, page: u32) -> bool {
        self.selected.remove(&page)
    }

    /// Selects every page of a `page_count`-page document.
    pub fn select_all(&mut self, page_count: u32) {
        self.selected.extend(1..=page_count);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, page: u32) -> bool {
        self.selected.contains(&page)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn sorted_selection(&self) -> Vec<u32> {
        self.selected.iter().copied().collect()
    }
}

impl FromIterator<u32> for PageSelection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self { selected: iter.into_iter().collect() }
    }
}

/// Parses a page list such as `1,3,5-7` into page numbers, in the order written.
///
/// Every page must lie in `1..=page_count`; ranges must not run backwards.
pub fn parse_page_list(spec: &str, page_count: u32) -> Result<Vec<u32>> {
    let mut pages = Vec::new();

    for token in spec.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_page(start, page_count)?, parse_page(end, page_count)?),
            None => {
                let page = parse_page(token, page_count)?;
                (page, page)
            }
        };

        if start > end {
            return Err(SplitError::InvalidParameters(format!(
                "range {token} runs backwards"
            )));
        }
        pages.extend(start..=end);
    }

    if pages.is_empty() {
        return Err(SplitError::InvalidParameters("page list is empty".to_owned()));
    }

    Ok(pages)
}

fn parse_page(raw: &str, page_count: u32) -> Result<u32> {
    let raw = raw.trim();
    let page = raw
        .parse::<u32>()
        .map_err(|_| SplitError::InvalidParameters(format!("'{raw}' is not a page number")))?;

    if page == 0 || page > page_count {
        return Err(SplitError::InvalidParameters(format!(
            "page {page} is outside the document ({page_count} pages)"
        )));
    }

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = PageSelection::new();

        assert!(selection.toggle(4));
        assert!(selection.contains(4));
        assert!(!selection.toggle(4));
        assert!(selection.is_empty());
    }

    #[test]
    fn sorted_selection_ignores_insertion_order_and_duplicates() {
        let mut selection = PageSelection::new();
        for page in [5, 2, 2, 9] {
            selection.add(page);
        }

        assert_eq!(selection.sorted_selection(), vec![2, 5, 9]);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn select_all_then_clear() {
        let mut selection = PageSelection::new();
        selection.select_all(4);
        assert_eq!(selection.sorted_selection(), vec![1, 2, 3, 4]);

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn parses_single_pages_and_ranges() {
        let pages = parse_page_list("1, 3,5-7", 10).expect("list should parse");
        assert_eq!(pages, vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn rejects_out_of_range_zero_and_backwards() {
        assert!(matches!(parse_page_list("11", 10), Err(SplitError::InvalidParameters(_))));
        assert!(matches!(parse_page_list("0", 10), Err(SplitError::InvalidParameters(_))));
        assert!(matches!(parse_page_list("7-5", 10), Err(SplitError::InvalidParameters(_))));
        assert!(matches!(parse_page_list("two", 10), Err(SplitError::InvalidParameters(_))));
        assert!(matches!(parse_page_list(" , ", 10), Err(SplitError::InvalidParameters(_))));
    }
}
