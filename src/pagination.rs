//! Stable paging over the filtered readings.
//!
//! Requests are never rejected: any page number, including zero, negative or
//! past the end, is clamped into `[1, max(total_pages, 1)]`.

use std::num::NonZeroUsize;
use std::str::FromStr;

use anyhow::{anyhow, Result};

// ---

/// Navigation request from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    First,
    Prev,
    Next,
    Last,
    Number(i64),
}

impl PageRequest {
    // ---
    /// Page number this request points at before clamping.
    pub fn resolve(self, current: usize, total_pages: usize) -> i64 {
        // ---
        let current = current as i64;
        match self {
            PageRequest::First => 1,
            PageRequest::Prev => current.saturating_sub(1),
            PageRequest::Next => current.saturating_add(1),
            PageRequest::Last => total_pages as i64,
            PageRequest::Number(n) => n,
        }
    }
}

impl FromStr for PageRequest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(PageRequest::First),
            "prev" | "previous" => Ok(PageRequest::Prev),
            "next" => Ok(PageRequest::Next),
            "last" => Ok(PageRequest::Last),
            other => other
                .parse::<i64>()
                .map(PageRequest::Number)
                .map_err(|_| anyhow!("Invalid page request '{}'", s)),
        }
    }
}

/// One page of results plus the bounds it was computed against.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    // ---
    pub items: Vec<T>,
    pub effective_page: usize,
    pub total_pages: usize,
}

/// `ceil(len / page_size)`; zero when there is nothing to show.
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

/// Clamp `requested` into `[1, max(total_pages, 1)]`.
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    // ---
    let last = total_pages.max(1) as i64;
    requested.clamp(1, last) as usize
}

/// Cut the requested page out of `filtered`.
pub fn slice<T: Clone>(filtered: &[T], page_size: NonZeroUsize, requested: i64) -> Page<T> {
    // ---
    let total_pages = total_pages(filtered.len(), page_size);
    let effective_page = clamp_page(requested, total_pages);

    let start = (effective_page - 1).saturating_mul(page_size.get());
    let items = filtered
        .iter()
        .skip(start)
        .take(page_size.get())
        .cloned()
        .collect();

    Page {
        items,
        effective_page,
        total_pages,
    }
}
