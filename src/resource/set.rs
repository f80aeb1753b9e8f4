//! The lazy resource set.
//!
//! A `ResourceSet` represents an unresolved or partially-resolved collection
//! of remote records. It moves through three states:
//!
//! - **Unresolved**: no fetch attempted yet (`cache` is `None`).
//! - **Resolving**: a producer is live and the cache holds a strict prefix
//!   of the eventual result.
//! - **Resolved**: the producer is exhausted and dropped; size queries,
//!   indexing and iteration are pure cache reads from here on.
//!
//! Slicing an unresolved set does not fetch: it clones the set with
//! `limit_start`/`limit_stop` bounds recorded as query parameters so the
//! server performs the pagination. Clones always start unresolved and never
//! share cache or producer state.

use log::debug;
use reqwest::Method;
use serde_json::{Map, Value};

use super::RecordProducer;
use crate::client::RestClient;
use crate::config::ClientConfig;
use crate::constants::{CHUNK_SIZE, envelope, params, status};
use crate::error::{Error, Result};
use crate::model::{Model, is_falsy, value_text};

/// Opaque pagination metadata reported by the server alongside a page.
#[derive(Debug, Clone, Default)]
pub struct Meta(Map<String, Value>);

impl Meta {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.0.get("total_count").and_then(Value::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Single-record lookup key for [`ResourceSet::get`]. Whichever variant is
/// used, the value becomes an extra path segment on the resource URL.
#[derive(Debug, Clone)]
pub enum Lookup {
    Pk(String),
    Slug(String),
    Code(String),
}

impl Lookup {
    pub fn pk(value: impl ToString) -> Self {
        Self::Pk(value.to_string())
    }

    pub fn slug(value: impl ToString) -> Self {
        Self::Slug(value.to_string())
    }

    pub fn code(value: impl ToString) -> Self {
        Self::Code(value.to_string())
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Pk(v) | Self::Slug(v) | Self::Code(v) => v,
        }
    }
}

pub struct ResourceSet<M: Model> {
    config: ClientConfig,
    client: RestClient,
    filters: Vec<(String, String)>,
    limit_start: Option<usize>,
    limit_stop: Option<usize>,
    token: Option<String>,
    cache: Option<Vec<M>>,
    producer: Option<RecordProducer<M>>,
    meta: Option<Meta>,
}

impl<M: Model> ResourceSet<M> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(config, RestClient::new())
    }

    pub fn with_client(config: ClientConfig, client: RestClient) -> Self {
        Self {
            config,
            client,
            filters: Vec::new(),
            limit_start: None,
            limit_stop: None,
            token: None,
            cache: None,
            producer: None,
            meta: None,
        }
    }

    /// Cache an auth token on the set; it is sent as an authorization header
    /// on every request this set issues, never as a query parameter.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Merge a key/value constraint into the filter mapping, in place.
    /// Chained calls accumulate constraints on the same set; this is a
    /// mutation-based builder, not copy-on-write.
    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.filters.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((key.to_string(), value)),
        }
        self
    }

    /// The whole collection, still unresolved.
    pub fn all(self) -> Self {
        self
    }

    // ---- URL construction -------------------------------------------------

    /// The model's URL template for this configuration.
    pub fn url(&self) -> String {
        M::url(&self.config)
    }

    /// Build the request path: optional lookup appended as a path segment,
    /// then every filter whose `{key}` placeholder appears in the template
    /// substituted into it.
    pub fn build_url(&self, lookup: Option<&str>) -> String {
        let mut url = self.url();
        if let Some(lookup) = lookup {
            url = format!("{}{}/", url, lookup);
        }
        for (key, value) in &self.filters {
            let placeholder = format!("{{{}}}", key);
            if url.contains(&placeholder) {
                url = url.replace(&placeholder, value);
            }
        }
        url
    }

    /// Query parameters: filters not consumed by a placeholder, in insertion
    /// order, followed by the slice bounds.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let template = self.url();
        let mut query: Vec<(String, String)> = self
            .filters
            .iter()
            .filter(|(key, _)| !template.contains(&format!("{{{}}}", key)))
            .cloned()
            .collect();
        if let Some(start) = self.limit_start {
            query.push((params::LIMIT_START.to_string(), start.to_string()));
        }
        if let Some(stop) = self.limit_stop {
            query.push((params::LIMIT_STOP.to_string(), stop.to_string()));
        }
        query
    }

    pub fn query_string(&self) -> String {
        self.query_params()
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn list_url(&self) -> String {
        let url = self.build_url(None);
        let query = self.query_string();
        if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query)
        }
    }

    // ---- resolution machinery ---------------------------------------------

    pub(crate) fn set_limits(&mut self, start: Option<usize>, stop: Option<usize>) {
        self.limit_start = start;
        self.limit_stop = stop;
    }

    /// An independent set carrying forward filter/bound/token state. The
    /// clone starts unresolved regardless of this set's state.
    pub fn clone_unresolved(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: self.client.clone(),
            filters: self.filters.clone(),
            limit_start: self.limit_start,
            limit_stop: self.limit_stop,
            token: self.token.clone(),
            cache: None,
            producer: None,
            meta: None,
        }
    }

    fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, Vec::len)
    }

    /// Unresolved -> Resolving: issue the page request and install the
    /// producer. No-op once a cache exists.
    fn start_producer(&mut self) -> Result<()> {
        if self.cache.is_some() {
            return Ok(());
        }
        let producer = self.fetch_page()?;
        self.cache = Some(Vec::new());
        self.producer = Some(producer);
        Ok(())
    }

    /// Fetch the page for the current filters/bounds and parse the envelope:
    /// a bare list is all records with no metadata; a mapping carries records
    /// under `objects` (the mapping itself is the record if absent) and
    /// metadata under `meta`.
    fn fetch_page(&mut self) -> Result<RecordProducer<M>> {
        let url = self.list_url();
        let response = self
            .client
            .send(Method::GET, &url, self.token.as_deref(), None)?;
        let Some(json) = response.json else {
            return Err(Error::UnexpectedBody(response.body));
        };

        let raw_records = match json {
            Value::Array(items) => items,
            Value::Object(map) => {
                let meta = map
                    .get(envelope::META)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                self.meta = Some(Meta(meta));
                match map.get(envelope::OBJECTS).cloned() {
                    Some(Value::Array(items)) => items,
                    Some(other) => return Err(Error::UnexpectedBody(other.to_string())),
                    None => vec![Value::Object(map)],
                }
            }
            other => return Err(Error::UnexpectedBody(other.to_string())),
        };

        let mut records = Vec::with_capacity(raw_records.len());
        for raw in &raw_records {
            let map = raw
                .as_object()
                .ok_or_else(|| Error::UnexpectedBody(raw.to_string()))?;
            let mut instance = M::default();
            instance.deserialize(map)?;
            records.push(instance);
        }
        debug!("fetched {} {} records from {}", records.len(), M::resource_name(), url);
        Ok(RecordProducer::new(records))
    }

    /// Move up to `want` records (one chunk if unspecified) from the live
    /// producer into the cache, dropping the producer on exhaustion.
    fn fill_cache(&mut self, want: Option<usize>) {
        let want = want.unwrap_or(CHUNK_SIZE);
        if let (Some(producer), Some(cache)) = (self.producer.as_mut(), self.cache.as_mut()) {
            for _ in 0..want {
                match producer.next_record() {
                    Some(record) => cache.push(record),
                    None => break,
                }
            }
            if !producer.has_more() {
                self.producer = None;
            }
        }
    }

    fn resolve_all(&mut self) -> Result<()> {
        self.start_producer()?;
        while self.producer.is_some() {
            self.fill_cache(None);
        }
        Ok(())
    }

    // ---- sequence surface -------------------------------------------------

    /// Number of records, resolving the set fully if needed. Once resolved,
    /// this never issues a network request.
    pub fn len(&mut self) -> Result<usize> {
        self.resolve_all()?;
        Ok(self.cached_len())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Resolve fully and clone out the records.
    pub fn to_vec(&mut self) -> Result<Vec<M>> {
        self.resolve_all()?;
        Ok(self.cache.clone().unwrap_or_default())
    }

    /// Iterate the records, fetching lazily. Re-iterating a resolved set
    /// yields the same records in the same order without further requests.
    pub fn iter(&mut self) -> Iter<'_, M> {
        Iter {
            set: self,
            pos: 0,
            failed: false,
        }
    }

    /// The record at position `k`.
    ///
    /// On a set with a cache this pulls from the live producer just far
    /// enough to cover `k`; on an unresolved set it sends a bounded request
    /// (`k..k+1`) instead of resolving everything. Negative indices are
    /// rejected outright; there are no wrap-around semantics.
    pub fn index(&mut self, k: i64) -> Result<M> {
        if k < 0 {
            return Err(Error::NegativeIndex);
        }
        let k = k as usize;

        if self.cache.is_some() {
            let cached = self.cached_len();
            if self.producer.is_some() && cached < k + 1 {
                self.fill_cache(Some(k + 1 - cached));
            }
            return self
                .cache
                .as_ref()
                .and_then(|cache| cache.get(k))
                .cloned()
                .ok_or(Error::IndexOutOfRange(k));
        }

        let mut bounded = self.clone_unresolved();
        bounded.set_limits(Some(k), Some(k + 1));
        bounded
            .to_vec()?
            .into_iter()
            .next()
            .ok_or(Error::IndexOutOfRange(k))
    }

    /// Slice the set.
    ///
    /// On an unresolved set this returns a new independent set with the
    /// bounds recorded as `limit_start`/`limit_stop` query parameters, ready
    /// for the server to paginate; no request is sent. On a set with a cache
    /// it fills up to `stop` (short reads allowed) and returns an
    /// already-resolved set over the cached window. Negative bounds are
    /// rejected.
    pub fn slice(&mut self, start: Option<i64>, stop: Option<i64>) -> Result<ResourceSet<M>> {
        let (start, stop) = validate_bounds(start, stop)?;

        if self.cache.is_some() {
            match stop {
                Some(stop) => {
                    let cached = self.cached_len();
                    if self.producer.is_some() && cached < stop {
                        self.fill_cache(Some(stop - cached));
                    }
                }
                None => self.resolve_all()?,
            }
            let cache = self.cache.as_deref().unwrap_or_default();
            let lo = start.unwrap_or(0).min(cache.len());
            let hi = stop.unwrap_or(cache.len()).min(cache.len()).max(lo);
            let mut resolved = self.clone_unresolved();
            resolved.cache = Some(cache[lo..hi].to_vec());
            return Ok(resolved);
        }

        let mut bounded = self.clone_unresolved();
        bounded.set_limits(start, stop);
        Ok(bounded)
    }

    /// Step-slicing cannot be expressed as a server-side bound, so a step
    /// other than 1 materializes the bounded window and re-slices locally.
    /// Negative steps walk the window backwards.
    pub fn slice_with_step(
        &mut self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    ) -> Result<Vec<M>> {
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let items = self.slice(start, stop)?.to_vec()?;
        if step == 1 {
            return Ok(items);
        }
        let stepped = if step > 0 {
            items.into_iter().step_by(step as usize).collect()
        } else {
            items.into_iter().rev().step_by(step.unsigned_abs() as usize).collect()
        };
        Ok(stepped)
    }

    /// Pagination metadata reported by the server. Only guaranteed populated
    /// once the set is resolved, so accessing it early forces resolution;
    /// stays `None` for bare-list responses.
    pub fn meta(&mut self) -> Result<Option<&Meta>> {
        if self.meta.is_none() {
            self.resolve_all()?;
        }
        Ok(self.meta.as_ref())
    }

    // ---- CRUD -------------------------------------------------------------

    /// Fetch a single record by lookup key. A token-carrying set may call
    /// this without a lookup (the server resolves the record from the
    /// token); otherwise the lookup is required.
    pub fn get(&mut self, lookup: impl Into<Option<Lookup>>) -> Result<M> {
        let lookup = lookup.into();
        let lookup_value = lookup.as_ref().map(Lookup::value);
        if lookup_value.is_none() && self.token.is_none() {
            return Err(Error::MissingLookup);
        }

        let url = self.build_url(lookup_value);
        let response = self
            .client
            .send(Method::GET, &url, self.token.as_deref(), None)?;
        let map = response
            .json_object()
            .ok_or_else(|| Error::UnexpectedBody(response.body.clone()))?;
        let mut instance = M::default();
        instance.deserialize(map)?;
        Ok(instance)
    }

    /// Persist a record: POST when it carries no identifier, delta PATCH
    /// otherwise.
    pub fn save(&mut self, instance: &M) -> Result<()> {
        if identifier(instance).is_ok() {
            return self.patch(instance);
        }
        let data = M::validate(instance.serialize())?;
        let response = self.client.send(
            Method::POST,
            &self.url(),
            self.token.as_deref(),
            Some(&Value::Object(data)),
        )?;
        expect_status(status::CREATE, response.status)
    }

    /// Partial update: sends only the changed fields. An empty delta issues
    /// no request at all.
    pub fn patch(&mut self, instance: &M) -> Result<()> {
        let pk = identifier(instance)?;
        let delta = M::validate(instance.serialize_changed())?;
        if delta.is_empty() {
            debug!("no changed fields on {} {}, skipping patch", M::resource_name(), pk);
            return Ok(());
        }
        let url = self.build_url(Some(&pk));
        let response = self.client.send(
            Method::PATCH,
            &url,
            self.token.as_deref(),
            Some(&Value::Object(delta)),
        )?;
        expect_status(status::PATCH, response.status)
    }

    /// Delete the record and invalidate this set's cache (it may no longer
    /// reflect the server).
    pub fn delete(&mut self, instance: &M) -> Result<()> {
        let pk = identifier(instance)?;
        let url = self.build_url(Some(&pk));
        let response = self
            .client
            .send(Method::DELETE, &url, self.token.as_deref(), None)?;
        expect_status(status::DELETE, response.status)?;
        self.cache = None;
        self.producer = None;
        self.meta = None;
        Ok(())
    }
}

/// Lazy iterator over a resource set. The first call may issue the page
/// request; a fetch failure is yielded once, then iteration ends.
pub struct Iter<'a, M: Model> {
    set: &'a mut ResourceSet<M>,
    pos: usize,
    failed: bool,
}

impl<M: Model> Iterator for Iter<'_, M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.set.cache.is_none() {
            if let Err(err) = self.set.start_producer() {
                self.failed = true;
                return Some(Err(err));
            }
        }
        loop {
            if self.pos < self.set.cached_len() {
                let record = self
                    .set
                    .cache
                    .as_ref()
                    .and_then(|cache| cache.get(self.pos))
                    .cloned();
                self.pos += 1;
                return record.map(Ok);
            }
            if self.set.producer.is_none() {
                return None;
            }
            self.set.fill_cache(None);
        }
    }
}

/// The record's identifier as URL text, required for update/delete.
fn identifier<M: Model>(instance: &M) -> Result<String> {
    match instance.pk() {
        Some(pk) if !is_falsy(&pk) => Ok(value_text(&pk)),
        _ => Err(Error::MissingIdentifier),
    }
}

fn expect_status(expected: &'static [u16], got: u16) -> Result<()> {
    if expected.contains(&got) {
        Ok(())
    } else {
        Err(Error::UnexpectedStatus { expected, got })
    }
}

fn validate_bounds(
    start: Option<i64>,
    stop: Option<i64>,
) -> Result<(Option<usize>, Option<usize>)> {
    let check = |bound: Option<i64>| match bound {
        Some(b) if b < 0 => Err(Error::NegativeIndex),
        Some(b) => Ok(Some(b as usize)),
        None => Ok(None),
    };
    Ok((check(start)?, check(stop)?))
}
