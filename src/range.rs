//! HTTP Range header resolution.
//!
//! Turns an optional `Range` header into a concrete, size-clamped byte
//! interval. Open-ended requests (`bytes=X-`) are bounded to a fixed chunk
//! size so a single request can never force a full read of a large file.
//! Parsing never fails: anything malformed degrades to the full interval.

/// Default chunk size for open-ended range requests (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// A resolved, inclusive byte interval within a resource of known size.
///
/// Invariant: `start <= end <= total - 1` whenever `total > 0`. For an
/// empty resource (`total == 0`) the range is the degenerate `[0, 0]` with
/// zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Inclusive end offset.
    pub end: u64,
    /// Total size of the underlying resource in bytes.
    pub total: u64,
}

impl ByteRange {
    /// Full interval `[0, total-1]` covering the whole resource.
    pub fn full(total: u64) -> Self {
        Self {
            start: 0,
            end: total.saturating_sub(1),
            total,
        }
    }

    /// Number of bytes in the range.
    pub fn length(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// True when the range covers less than the whole resource.
    pub fn is_partial(&self) -> bool {
        if self.total == 0 {
            return false;
        }
        self.start > 0 || self.end < self.total - 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Result of resolving a request's `Range` header.
///
/// `has_range_header` records whether the client sent a header at all.
/// It is tracked separately from [`ByteRange::is_partial`] — the two are
/// not always equal (an open-ended header yields a partial chunk, a header
/// covering the whole file does not). Response status is driven by
/// `is_partial` uniformly; see `server::routes_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub range: ByteRange,
    pub has_range_header: bool,
}

/// Resolve an optional `Range` header against a resource of `total` bytes.
///
/// Accepts the form `bytes=<start>-<end>` where either bound may be
/// omitted. An omitted start defaults to 0; an omitted or over-large end is
/// clamped to `total - 1`. When the header ends in `-` (no end bound), the
/// interval is additionally bounded to `chunk_size` bytes. Malformed or
/// unsatisfiable headers resolve to the full interval.
pub fn resolve(header: Option<&str>, total: u64, chunk_size: u64) -> ResolvedRange {
    let Some(header) = header else {
        return ResolvedRange {
            range: ByteRange::full(total),
            has_range_header: false,
        };
    };

    let range = parse(header, total).map_or_else(
        || ByteRange::full(total),
        |r| {
            if header.trim_end().ends_with('-') {
                clamp_open_ended(r, chunk_size)
            } else {
                r
            }
        },
    );

    ResolvedRange {
        range,
        has_range_header: true,
    }
}

/// Bound an open-ended range to at most `chunk_size` bytes.
fn clamp_open_ended(r: ByteRange, chunk_size: u64) -> ByteRange {
    if r.total == 0 || chunk_size == 0 {
        return r;
    }
    let end = (r.start + chunk_size - 1).min(r.total - 1);
    ByteRange { end, ..r }
}

/// Parse `bytes=<start>-<end>` with optional bounds, clamped to `total`.
///
/// Returns `None` for malformed input and for unsatisfiable intervals
/// (`start >= total` or `start > end`), which callers degrade to the full
/// interval.
fn parse(header: &str, total: u64) -> Option<ByteRange> {
    let spec = header.trim().strip_prefix("bytes=")?;
    let (start_s, end_s) = spec.split_once('-')?;

    let start = if start_s.trim().is_empty() {
        0
    } else {
        start_s.trim().parse::<u64>().ok()?
    };
    let end = if end_s.trim().is_empty() {
        total.saturating_sub(1)
    } else {
        end_s.trim().parse::<u64>().ok()?.min(total.saturating_sub(1))
    };

    if total == 0 {
        return Some(ByteRange::full(0));
    }
    if start >= total || start > end {
        return None;
    }

    Some(ByteRange { start, end, total })
}
