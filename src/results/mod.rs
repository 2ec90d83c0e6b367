//! Result iteration engine
//!
//! [`SearchResults`] turns the stateless request/response API into a single
//! lazy sequence over every record matching a query. It owns all pagination
//! state and re-dispatches transparently as the consumer advances, picking a
//! continuation strategy per page:
//!
//! - a known continuation cursor wins (`from=0` plus the cursor token),
//! - otherwise the offset of the next unread record (`from=current`).
//!
//! Continuation requests always bypass the response cache and ask for the
//! bulk page size. An empty page is treated as authoritative end-of-data even
//! when the advertised total says more remain, which protects against
//! total/cursor desynchronization on the server side.
//!
//! One engine serves one consumer; it is not a shared handle. After a
//! transport failure during continuation the engine is indeterminate and
//! should be discarded.

use crate::connection::Connection;
use crate::envelope::Meta;
use crate::error::Result;
use crate::types::{JsonValue, Method, ParamValue, Params};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;


/// Lifecycle of an iteration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, no query issued yet
    Unbound,
    /// At least one dispatch issued; total and buffer known
    Active,
    /// Every record yielded; terminal until re-invoked
    Exhausted,
}

/// Restartable lazy sequence over the records matching one query
pub struct SearchResults<'a> {
    conn: &'a Connection,
    endpoint: String,
    method: Method,
    active_params: Params,
    buffer: VecDeque<JsonValue>,
    total: u64,
    current: u64,
    cursor: Option<String>,
    meta: Meta,
    invoked: bool,
}

impl<'a> SearchResults<'a> {
    /// Create an unbound engine for an endpoint. No network call happens
    /// until [`invoke`](Self::invoke).
    pub fn new(conn: &'a Connection, endpoint: impl Into<String>, method: Method) -> Self {
        Self {
            conn,
            endpoint: endpoint.into(),
            method,
            active_params: Params::new(),
            buffer: VecDeque::new(),
            total: 0,
            current: 0,
            cursor: None,
            meta: Meta::default(),
            invoked: false,
        }
    }

    /// Issue the first dispatch for a parameter set. Also the restart entry
    /// point: calling it again on an active or exhausted engine starts over
    /// from offset zero with the prior cursor discarded.
    ///
    /// The observed total is fixed here: `meta.total` when the server
    /// reports one, else the length of the first page. When the server
    /// advertises a `size` knob and the caller did not pin one, the bulk
    /// page size is injected into all future requests.
    pub async fn invoke(&mut self, params: Params) -> Result<&mut SearchResults<'a>> {
        self.active_params = params;
        self.cursor = None;

        let envelope = self
            .conn
            .dispatch(&self.endpoint, self.method, &self.active_params)
            .await?;
        let (records, meta) = envelope.into_parts();

        self.current = 0;
        self.total = meta.total.unwrap_or(records.len() as u64);
        self.cursor = meta.next.clone();

        if meta.size.is_some() && !self.active_params.contains_key("size") {
            self.active_params.insert(
                "size".to_string(),
                ParamValue::from(self.conn.config().bulk_page_size),
            );
        }

        debug!(
            endpoint = %self.endpoint,
            total = self.total,
            first_page = records.len(),
            "query invoked"
        );

        self.buffer = records.into();
        self.meta = meta;
        self.invoked = true;
        Ok(self)
    }

    /// Apply additional filters and restart the query with the merged
    /// parameter set.
    ///
    /// Every new filter is validated first; on the first invalid one the
    /// call fails without touching `active_params` (no partial application).
    pub async fn filter(&mut self, filters: Params) -> Result<&mut SearchResults<'a>> {
        if filters.is_empty() {
            return Ok(self);
        }

        for (name, value) in &filters {
            self.conn
                .schema()
                .validate(&self.endpoint, self.method, name, value)?;
        }

        let mut merged = self.active_params.clone();
        merged.extend(filters);
        self.invoke(merged).await
    }

    /// Fetch the next page. Called only when the buffer is empty and
    /// `current < total`.
    async fn advance(&mut self) -> Result<()> {
        let mut params = self.active_params.clone();

        if let Some(cursor) = &self.cursor {
            // Cursor-based continuation takes precedence over the offset
            params.insert("from".to_string(), ParamValue::from(0u64));
            params.insert("next".to_string(), ParamValue::from(cursor.clone()));
        } else {
            params.insert("from".to_string(), ParamValue::from(self.current));
        }
        params.insert("no_cache".to_string(), ParamValue::from(true));
        params.insert(
            "size".to_string(),
            ParamValue::from(self.conn.config().bulk_page_size),
        );

        let envelope = self
            .conn
            .dispatch(&self.endpoint, self.method, &params)
            .await?;
        let (records, meta) = envelope.into_parts();

        if records.is_empty() {
            // An empty page is authoritative end-of-data even if the total
            // promised more
            debug!(
                endpoint = %self.endpoint,
                yielded = self.current,
                expected = self.total,
                "empty page, terminating iteration"
            );
            self.total = self.current;
            return Ok(());
        }

        if meta.next.is_some() {
            self.cursor = meta.next;
        }
        self.buffer = records.into();
        Ok(())
    }

    /// Yield the next record, fetching the next page when the buffer runs
    /// dry. `Ok(None)` signals exhaustion.
    pub async fn next_record(&mut self) -> Result<Option<JsonValue>> {
        if self.current >= self.total {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            self.advance().await?;
        }

        let Some(record) = self.buffer.pop_front() else {
            return Ok(None);
        };
        self.current += 1;
        Ok(Some(record))
    }

    /// Record at position `index` relative to the current position. This is
    /// sequential consumption, not random access: records before `index` are
    /// consumed and discarded.
    pub async fn nth(&mut self, index: u64) -> Result<Option<JsonValue>> {
        for _ in 0..index {
            if self.next_record().await?.is_none() {
                return Ok(None);
            }
        }
        self.next_record().await
    }

    /// Records in `[start, stop)` with the given step, relative to the
    /// current position. Defined purely in terms of sequential consumption.
    pub async fn slice(
        &mut self,
        start: u64,
        stop: Option<u64>,
        step: u64,
    ) -> Result<Vec<JsonValue>> {
        let step = step.max(1);
        let mut collected = Vec::new();
        let mut position = 0u64;

        while stop.map_or(true, |stop| position < stop) {
            let Some(record) = self.next_record().await? else {
                break;
            };
            if position >= start && (position - start) % step == 0 {
                collected.push(record);
            }
            position += 1;
        }

        Ok(collected)
    }

    /// Drain the remaining records into a vector
    pub async fn collect_remaining(&mut self) -> Result<Vec<JsonValue>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Consume the engine into a `futures::Stream` of records
    pub fn into_stream(self) -> impl Stream<Item = Result<JsonValue>> + 'a {
        stream::try_unfold(self, |mut results| async move {
            let record = results.next_record().await?;
            Ok(record.map(|record| (record, results)))
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        if !self.invoked {
            EngineState::Unbound
        } else if self.current >= self.total {
            EngineState::Exhausted
        } else {
            EngineState::Active
        }
    }

    /// Total matching records as observed at invocation
    pub fn len(&self) -> u64 {
        self.total
    }

    /// True when the query matched nothing (or nothing was invoked yet)
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Records yielded so far
    pub fn current(&self) -> u64 {
        self.current
    }

    /// The active filter set
    pub fn active_params(&self) -> &Params {
        &self.active_params
    }

    /// Last known continuation cursor
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Pagination metadata from the most recent invocation
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Endpoint this engine queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Display for SearchResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.invoked {
            return write!(f, "pending query against {}", self.endpoint);
        }
        write!(f, "{} results found", self.total)?;
        if !self.active_params.is_empty() {
            let rendered = serde_json::to_string(&self.active_params).unwrap_or_default();
            write!(f, " | parameters: {rendered}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SearchResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResults")
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("state", &self.state())
            .field("total", &self.total)
            .field("current", &self.current)
            .field("buffered", &self.buffer.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
