use std::num::IntErrorKind;
use std::ops::Range;

use super::error::QueryError;
use super::filter::{filtered_indices, identifier_matches, Filter};
use super::model::{Lookup, Page, SortKey, Table};

/// Rows per page when the request does not say.
pub const DEFAULT_PAGE_SIZE: usize = 30;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Query string of a listing request, kept as raw text so that numeric
/// parameters can be rejected with a useful message.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub name: Option<String>,
    pub sn: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Validated pagination request. `page` is clamped later, once the number
/// of pages is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: usize,
}

impl QueryParams {
    /// Build from decoded query-string pairs. When a key repeats, its first
    /// value wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut params.name,
                "sn" => &mut params.sn,
                "search" => &mut params.search,
                "sort" => &mut params.sort,
                "page" => &mut params.page,
                "page_size" => &mut params.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    pub fn filter(&self) -> Filter {
        Filter::new(self.name.as_deref(), self.sn.as_deref(), self.search.as_deref())
    }

    pub fn sort_key(&self, table: &Table) -> Option<SortKey> {
        self.sort.as_deref().and_then(|s| SortKey::resolve(s, table))
    }

    /// Parse `page` and `page_size`. Any integer `page` is accepted;
    /// `page_size` must be positive. Integers beyond the native range
    /// saturate instead of being rejected.
    pub fn page_request(&self, default_page_size: usize) -> Result<PageRequest, QueryError> {
        let page = match self.page.as_deref() {
            Some(raw) => parse_int("page", raw)?,
            None => 1,
        };
        let page_size = match self.page_size.as_deref() {
            Some(raw) => {
                if parse_int("page_size", raw)? <= 0 {
                    return Err(QueryError::BadRequest {
                        param: "page_size",
                        value: raw.to_string(),
                        reason: "must be a positive integer",
                    });
                }
                // Known to be a positive integer, so only overflow can fail.
                raw.trim().parse::<usize>().unwrap_or(usize::MAX)
            }
            None => default_page_size,
        };
        Ok(PageRequest { page, page_size })
    }
}

/// Parse an integer, saturating at the `i64` bounds.
fn parse_int(param: &'static str, raw: &str) -> Result<i64, QueryError> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(QueryError::BadRequest {
                param,
                value: raw.to_string(),
                reason: "not an integer",
            }),
        },
    }
}

// ---------------------------------------------------------------------------
// Query engine: filter → sort → paginate
// ---------------------------------------------------------------------------

/// Run a listing query against a table snapshot.
pub fn query<'a>(
    table: &'a Table,
    params: &QueryParams,
    default_page_size: usize,
) -> Result<Page<'a>, QueryError> {
    let request = params.page_request(default_page_size)?;

    let mut indices = filtered_indices(table, &params.filter());

    if let Some(key) = params.sort_key(table) {
        // `sort_by` is stable: ties keep their filtered order.
        indices.sort_by(|&a, &b| key.compare(&table.rows[a], &table.rows[b]));
    }

    let total = indices.len();
    let window = paginate(total, request.page, request.page_size);
    let data = indices[window.rows]
        .iter()
        .map(|&i| table.view(&table.rows[i]))
        .collect();

    Ok(Page {
        page: window.page,
        page_size: request.page_size,
        total,
        total_pages: window.total_pages,
        data,
    })
}

/// All rows whose identifier contains `sn`, in table order.
pub fn lookup_by_sn<'a>(table: &'a Table, sn: &str) -> Lookup<'a> {
    let data: Vec<_> = identifier_matches(table, sn)
        .into_iter()
        .map(|i| table.view(&table.rows[i]))
        .collect();
    Lookup {
        total: data.len(),
        data,
    }
}

/// Resolved page position within a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Requested page clamped into `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty result.
    pub total_pages: usize,
    /// Slice of the result set shown on `page`.
    pub rows: Range<usize>,
}

/// Compute the page window for `total` results. `page_size` must be > 0.
pub fn paginate(total: usize, page: i64, page_size: usize) -> Window {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let page = usize::try_from(page).unwrap_or(0).clamp(1, total_pages);

    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    Window {
        page,
        total_pages,
        rows: start..end,
    }
}
