//! Page slicing for post listings.
//!
//! The requested page comes straight from the `page` query parameter, so it
//! may be missing, malformed or out of range. None of these are errors: a
//! missing or malformed value means the first page and out-of-range values
//! clamp to the nearest existing page.

use std::num::IntErrorKind;

use serde::Serialize;

/// Items shown on every listing page.
pub const POSTS_PER_PAGE: u64 = 10;

/// Position of one page within a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl PageMeta {
    /// Index of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// A page of items together with its position.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Splits collections into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(POSTS_PER_PAGE)
    }
}

impl Paginator {
    /// `per_page` of zero is treated as one.
    pub const fn new(per_page: u64) -> Self {
        Self {
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Parse the raw `page` query value. Anything unparsable is page 1;
    /// numbers too large for `i64` saturate so they still clamp.
    pub fn parse_page(raw: Option<&str>) -> i64 {
        let Some(value) = raw else {
            return 1;
        };
        match value.trim().parse::<i64>() {
            Ok(number) => number,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => 1,
            },
        }
    }

    /// Number of pages needed for `count` items. Never less than one.
    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.per_page).max(1)
    }

    /// Resolve the requested page against a collection of `count` items.
    pub fn locate(&self, count: u64, raw_page: Option<&str>) -> PageMeta {
        let num_pages = self.num_pages(count);
        let requested = Self::parse_page(raw_page);
        let number = requested.clamp(1, num_pages as i64) as u64;

        PageMeta {
            number,
            num_pages,
            count,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
        }
    }

    /// Slice an already ordered in-memory collection.
    pub fn paginate<T: Clone>(&self, items: &[T], raw_page: Option<&str>) -> Page<T> {
        let meta = self.locate(items.len() as u64, raw_page);
        let start = (meta.offset() as usize).min(items.len());
        let end = (start + meta.limit() as usize).min(items.len());

        Page {
            items: items[start..end].to_vec(),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thirteen() -> Vec<u32> {
        (0..13).collect()
    }

    #[test]
    fn first_page_holds_ten_items() {
        let page = Paginator::default().paginate(&thirteen(), None);
        assert_eq!(page.len(), 10);
        assert_eq!(page.meta.number, 1);
        assert_eq!(page.meta.num_pages, 2);
        assert!(page.meta.has_next);
        assert!(!page.meta.has_previous);
        assert_eq!(page.meta.next_page_number, Some(2));
    }

    #[test]
    fn second_page_holds_the_rest() {
        let page = Paginator::default().paginate(&thirteen(), Some("2"));
        assert_eq!(page.items, vec![10, 11, 12]);
        assert!(!page.meta.has_next);
        assert_eq!(page.meta.previous_page_number, Some(1));
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let paginator = Paginator::default();
        assert_eq!(paginator.locate(13, Some("99")).number, 2);
        assert_eq!(paginator.locate(13, Some("0")).number, 1);
        assert_eq!(paginator.locate(13, Some("-4")).number, 1);
        assert_eq!(paginator.locate(13, Some("99999999999999999999")).number, 2);
        assert_eq!(paginator.locate(13, Some("-99999999999999999999")).number, 1);
    }

    #[test]
    fn malformed_page_means_first() {
        let paginator = Paginator::default();
        assert_eq!(paginator.locate(13, Some("abc")).number, 1);
        assert_eq!(paginator.locate(13, Some("")).number, 1);
        assert_eq!(paginator.locate(13, Some(" 2 ")).number, 2);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let page = Paginator::default().paginate::<u32>(&[], Some("3"));
        assert!(page.is_empty());
        assert_eq!(page.meta.number, 1);
        assert_eq!(page.meta.num_pages, 1);
        assert!(!page.meta.has_next);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let paginator = Paginator::default();
        assert_eq!(paginator.num_pages(20), 2);
        assert_eq!(paginator.locate(20, Some("2")).offset(), 10);
    }
}
