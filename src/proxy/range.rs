//! Reconciliation of the `?range=` query parameter with the `Range` header.
//!
//! The query parameter is explicit client intent and must agree with any
//! header the client also sent. A request with neither is sent upstream as
//! `bytes=0-` so origins answer every request with the same representation.

/// Range sent when the client expressed none.
pub const DEFAULT_RANGE: &str = "bytes=0-";

/// Length of the `bytes=` unit prefix dropped from the header before comparing.
const UNIT_PREFIX_LEN: usize = "bytes=".len();

/// Outcome of reconciling the two range sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeResult {
    /// Send this value as the `Range` header.
    Rewritten(String),
    /// Forward the client's `Range` header unchanged.
    Passthrough,
    /// Query and header disagree; answer 416 without contacting the origin.
    Rejected,
}

/// Decide the upstream `Range` header from the query and header values.
///
/// Empty values count as absent.
pub fn reconcile(query_range: Option<&str>, header_range: Option<&str>) -> RangeResult {
    let query_range = query_range.filter(|q| !q.is_empty());
    let header_range = header_range.filter(|h| !h.is_empty());

    match (query_range, header_range) {
        (None, None) => RangeResult::Rewritten(DEFAULT_RANGE.to_string()),
        (None, Some(_)) => RangeResult::Passthrough,
        (Some(query), Some(header)) if strip_unit(header) != query => RangeResult::Rejected,
        (Some(query), _) => RangeResult::Rewritten(header_from_query(query)),
    }
}

/// First `range` parameter of a raw query string, percent-decoded.
pub fn query_range(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "range")
        .map(|(_, value)| value.into_owned())
}

fn strip_unit(header: &str) -> &str {
    header.get(UNIT_PREFIX_LEN..).unwrap_or("").trim()
}

// `100` and `100-` both mean "from byte 100"; a value that already carries
// the separator (`0-99`) is used as is.
fn header_from_query(query: &str) -> String {
    if query.contains('-') {
        format!("bytes={}", query)
    } else {
        format!("bytes={}-", query)
    }
}
