//! Relay cursor pagination over an ordered result set.
//!
//! `first`/`after` page forward, `last`/`before` page backward. Cursors are
//! opaque: base64 (URL-safe, unpadded) JSON holding the item's offset in the
//! full result set.

use async_graphql::Value;
use tracing::trace;

use super::object;
use crate::config::SchemaConfig;
use crate::registry::Arguments;

/// Cursor encoding/decoding utilities.
mod cursor {
    use base64::Engine;
    use serde::{Deserialize, Serialize};

    /// Cursor data encoded in the cursor string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CursorData {
        /// Offset into the result set.
        pub offset: usize,
    }

    impl CursorData {
        pub fn new(offset: usize) -> Self {
            Self { offset }
        }

        /// Encode cursor data to a base64 string.
        pub fn encode(self) -> String {
            let json = serde_json::to_string(&self).unwrap_or_default();
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
        }

        /// Decode cursor data from a base64 string.
        pub fn decode(cursor: &str) -> Option<Self> {
            let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(cursor)
                .ok()?;
            let json = String::from_utf8(bytes).ok()?;
            serde_json::from_str(&json).ok()
        }
    }
}

pub use cursor::CursorData;

/// Pagination arguments of a connection field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageArgs {
    /// Items to return from the start of the window.
    pub first: Option<usize>,
    /// Items to return from the end of the window.
    pub last: Option<usize>,
    /// Only items after this cursor.
    pub after: Option<CursorData>,
    /// Only items before this cursor.
    pub before: Option<CursorData>,
}

impl PageArgs {
    /// Reads `first`, `last`, `after` and `before` from resolver arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for negative counts or cursors that cannot be decoded.
    pub fn from_args(args: &Arguments) -> async_graphql::Result<Self> {
        Ok(Self {
            first: count(args, "first")?,
            last: count(args, "last")?,
            after: cursor(args, "after")?,
            before: cursor(args, "before")?,
        })
    }
}

fn count(args: &Arguments, name: &str) -> async_graphql::Result<Option<usize>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(n) if n >= 0 => Ok(Some(n as usize)),
            _ => Err(async_graphql::Error::new(format!("`{name}` must be a non-negative integer"))),
        },
        Some(_) => Err(async_graphql::Error::new(format!("`{name}` must be an integer"))),
    }
}

fn cursor(args: &Arguments, name: &str) -> async_graphql::Result<Option<CursorData>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => CursorData::decode(s)
            .map(Some)
            .ok_or_else(|| async_graphql::Error::new(format!("Invalid `{name}` cursor"))),
        Some(_) => Err(async_graphql::Error::new(format!("`{name}` must be a cursor string"))),
    }
}

/// Pages `items` and builds the connection value
/// `{ edges: [{cursor, node}], nodes, pageInfo }`.
#[must_use]
pub fn paginate(items: Vec<Value>, args: &PageArgs, config: &SchemaConfig) -> Value {
    let total = items.len();

    let window_start = args.after.map_or(0, |c| c.offset.saturating_add(1)).min(total);
    let window_end = args.before.map_or(total, |c| c.offset).clamp(window_start, total);

    let first = match (args.first, args.last) {
        (None, None) => Some(config.page_size(None)),
        (first, _) => first.map(|n| config.page_size(Some(n))),
    };
    let last = args.last.map(|n| config.page_size(Some(n)));

    let mut start = window_start;
    let mut end = window_end;
    if let Some(first) = first {
        end = end.min(start + first);
    }
    if let Some(last) = last {
        start = start.max(end.saturating_sub(last));
    }

    let has_next_page = if first.is_some() {
        end < window_end
    } else {
        window_end < total
    };
    let has_previous_page = if last.is_some() {
        start > window_start
    } else {
        window_start > 0
    };

    trace!(total, start, end, has_next_page, has_previous_page, "Paginated connection");

    let mut edges = Vec::with_capacity(end - start);
    let mut nodes = Vec::with_capacity(end - start);
    for (offset, node) in items.into_iter().enumerate().take(end).skip(start) {
        edges.push(object([
            ("cursor", Value::String(CursorData::new(offset).encode())),
            ("node", node.clone()),
        ]));
        nodes.push(node);
    }

    let cursor_at = |offset: usize| Value::String(CursorData::new(offset).encode());
    let (start_cursor, end_cursor) = if start < end {
        (cursor_at(start), cursor_at(end - 1))
    } else {
        (Value::Null, Value::Null)
    };

    object([
        ("edges", Value::List(edges)),
        ("nodes", Value::List(nodes)),
        (
            "pageInfo",
            object([
                ("hasNextPage", Value::Boolean(has_next_page)),
                ("hasPreviousPage", Value::Boolean(has_previous_page)),
                ("startCursor", start_cursor),
                ("endCursor", end_cursor),
            ]),
        ),
    ])
}
