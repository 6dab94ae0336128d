//! Store - the in-memory list of one resource and its sync with the other tiers.
//!
//! The store owns the authoritative list. On `load` it takes the remote table
//! as the source of truth when it answers, and the local snapshot otherwise.
//! Mutations go to the remote table first and fall back to local-only when
//! it is missing or fails. Once loaded, every change is mirrored to the
//! local snapshot.

use crate::auth::{AuthPolicy, AuthProvider};
use crate::clock::{IdClock, SystemClock, TimeSource};
use crate::local::LocalStorage;
use crate::notice::{DegradeReason, Deletion, Notice, OpKind, Outcome, Tier};
use crate::reconcile;
use crate::remote::RemoteTable;
use crate::snapshot::Snapshot;
use crate::{error::Result, Error, Fields, Record, RecordId, ResourceSchema};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Uninitialized,
    Loading,
    Loaded,
}

/// Which tier the list came from on the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Remote,
    Local,
    /// Neither tier had usable data
    Empty,
}

/// Summary of the last load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub source: LoadSource,
    pub count: usize,
    /// Set when the remote tier was tried and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
}

/// An explicit yes/no decision before a destructive step.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// The list of one resource, kept in sync with a remote table and a local
/// snapshot.
pub struct ResourceStore {
    schema: ResourceSchema,
    remote: Option<Arc<dyn RemoteTable>>,
    local: Arc<dyn LocalStorage>,
    auth_policy: AuthPolicy,
    time: Arc<dyn TimeSource>,
    ids: IdClock,
    records: Vec<Record>,
    state: LoadState,
    last_load: Option<LoadReport>,
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("resource", &self.schema.name)
            .field("remote", &self.remote.is_some())
            .field("state", &self.state)
            .field("records", &self.records.len())
            .finish()
    }
}

impl ResourceStore {
    /// Create a store with no remote table. Mutations require a signed-in
    /// user unless another policy is set.
    pub fn new(schema: ResourceSchema, local: Arc<dyn LocalStorage>) -> Self {
        Self {
            schema,
            remote: None,
            local,
            auth_policy: AuthPolicy::default(),
            time: Arc::new(SystemClock),
            ids: IdClock::new(),
            records: Vec::new(),
            state: LoadState::Uninitialized,
            last_load: None,
        }
    }

    /// Builder-style method to attach the remote table.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteTable>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_auth_policy(mut self, policy: AuthPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn is_remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn last_load(&self) -> Option<&LoadReport> {
        self.last_load.as_ref()
    }

    /// The list, in display order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Get a record by identifier.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Populate the list.
    ///
    /// Tries the remote table first, then the local snapshot. Never fails:
    /// when neither tier has usable data the list is empty. The store is
    /// marked loaded once, and only then are snapshot writes allowed.
    pub async fn load(&mut self) -> LoadReport {
        if self.state == LoadState::Uninitialized {
            self.state = LoadState::Loading;
        }

        let remote_error = match self.fetch_remote().await {
            Ok(records) => {
                self.set_records(records);
                self.mark_loaded();
                // Mirror the fresh remote list into the local cache.
                self.persist();
                return self.finish_load(LoadSource::Remote, None);
            }
            Err(Error::RemoteUnavailable) => None,
            Err(e) => {
                warn!(resource = %self.schema.name, error = %e, "remote load failed, using local snapshot");
                Some(remote_message(e))
            }
        };

        let source = match Snapshot::read(self.local.as_ref(), &self.schema) {
            Some(snapshot) => {
                self.set_records(snapshot.records);
                LoadSource::Local
            }
            None => {
                self.set_records(Vec::new());
                LoadSource::Empty
            }
        };
        self.mark_loaded();
        self.finish_load(source, remote_error)
    }

    fn remote(&self) -> Result<Arc<dyn RemoteTable>> {
        self.remote.clone().ok_or(Error::RemoteUnavailable)
    }

    fn decode(&self, row: serde_json::Value) -> Result<Record> {
        self.schema
            .decode_row(row)
            .map_err(|e| Error::RemoteCallFailed(format!("malformed row: {e}")))
    }

    async fn fetch_remote(&self) -> Result<Vec<Record>> {
        let rows = self
            .remote()?
            .select(&self.schema.order, self.schema.limit)
            .await
            .map_err(|e| Error::RemoteCallFailed(e.message))?;

        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    fn set_records(&mut self, records: Vec<Record>) {
        let (records, dropped) = reconcile::dedupe(records);
        if dropped > 0 {
            warn!(resource = %self.schema.name, dropped, "dropped records with duplicate identifiers");
        }
        for record in &records {
            self.ids.observe(record.id);
        }
        self.records = records;
    }

    fn mark_loaded(&mut self) {
        if self.state != LoadState::Loaded {
            self.state = LoadState::Loaded;
            debug!(resource = %self.schema.name, "store loaded");
        }
    }

    fn finish_load(&mut self, source: LoadSource, remote_error: Option<String>) -> LoadReport {
        let report = LoadReport {
            source,
            count: self.records.len(),
            remote_error,
        };
        info!(resource = %self.schema.name, source = ?report.source, count = report.count, "loaded records");
        self.last_load = Some(report.clone());
        report
    }

    /// Create a record.
    pub async fn create(&mut self, auth: &dyn AuthProvider, input: Fields) -> Result<Outcome<Record>> {
        self.auth_policy.check(auth).await?;
        self.ensure_loaded()?;

        let fields = self
            .schema
            .validate_create(&input, &self.records)
            .map_err(Error::Validation)?;

        let (record, tier) = match self.remote_insert(&fields).await {
            Ok(record) => (record, Tier::Remote),
            Err(e) => {
                let reason = self.degrade("insert", e);
                (self.local_record(fields), Tier::LocalOnly(reason))
            }
        };

        self.ids.observe(record.id);
        reconcile::place(&mut self.records, record.clone(), self.schema.placement());
        self.persist();

        Ok(self.outcome(OpKind::Create, record, tier))
    }

    async fn remote_insert(&self, fields: &Fields) -> Result<Record> {
        let row = self
            .remote()?
            .insert(fields)
            .await
            .map_err(|e| Error::RemoteCallFailed(e.message))?;
        self.decode(row)
    }

    fn local_record(&mut self, fields: Fields) -> Record {
        let id = self.ids.next_id(self.time.now_millis());
        Record::new(id, fields)
    }

    /// Update a record.
    ///
    /// Only the submitted fields change. The remote row replaces the local
    /// entry when the remote update succeeds.
    pub async fn update(
        &mut self,
        auth: &dyn AuthProvider,
        id: RecordId,
        input: Fields,
    ) -> Result<Outcome<Record>> {
        self.auth_policy.check(auth).await?;
        self.ensure_loaded()?;

        let current = self.get(id).cloned().ok_or(Error::NotFound(id))?;
        let fields = self
            .schema
            .validate_update(&input, &current, &self.records)
            .map_err(Error::Validation)?;

        let (record, tier) = match self.remote_update(id, &fields).await {
            Ok(record) => {
                if !reconcile::replace(&mut self.records, id, record.clone()) {
                    return Err(Error::NotFound(id));
                }
                (record, Tier::Remote)
            }
            Err(e) => {
                let reason = self.degrade("update", e);
                let record =
                    reconcile::merge(&mut self.records, id, &fields).ok_or(Error::NotFound(id))?;
                (record, Tier::LocalOnly(reason))
            }
        };

        self.persist();
        Ok(self.outcome(OpKind::Update, record, tier))
    }

    async fn remote_update(&self, id: RecordId, fields: &Fields) -> Result<Record> {
        let row = self
            .remote()?
            .update(&self.schema.id_column, id, fields)
            .await
            .map_err(|e| Error::RemoteCallFailed(e.message))?;
        let record = self.decode(row)?;
        if record.id != id {
            return Err(Error::RemoteCallFailed(format!(
                "updated row has identifier {} instead of {id}",
                record.id
            )));
        }
        Ok(record)
    }

    /// Delete a record after an explicit confirmation.
    ///
    /// The record leaves the list whether or not the remote delete worked.
    pub async fn delete<C: Confirm>(
        &mut self,
        auth: &dyn AuthProvider,
        id: RecordId,
        confirm: C,
    ) -> Result<Deletion> {
        self.auth_policy.check(auth).await?;
        self.ensure_loaded()?;

        if self.get(id).is_none() {
            return Err(Error::NotFound(id));
        }

        let prompt = format!("Delete {} record {id}?", self.schema.name);
        if !confirm.confirm(&prompt) {
            debug!(resource = %self.schema.name, id, "delete cancelled");
            return Ok(Deletion::Cancelled);
        }

        let tier = match self.remote_delete(id).await {
            Ok(()) => Tier::Remote,
            Err(e) => Tier::LocalOnly(self.degrade("delete", e)),
        };

        let record = reconcile::remove(&mut self.records, id).ok_or(Error::NotFound(id))?;
        self.persist();

        Ok(Deletion::Removed(self.outcome(OpKind::Delete, record, tier)))
    }

    async fn remote_delete(&self, id: RecordId) -> Result<()> {
        self.remote()?
            .delete(&self.schema.id_column, id)
            .await
            .map_err(|e| Error::RemoteCallFailed(e.message))
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.state == LoadState::Loaded {
            Ok(())
        } else {
            Err(Error::NotLoaded)
        }
    }

    /// Why a remote step fell back to local-only.
    fn degrade(&self, step: &str, err: Error) -> DegradeReason {
        match err {
            Error::RemoteUnavailable => DegradeReason::Unconfigured,
            other => {
                warn!(resource = %self.schema.name, step, error = %other, "remote call failed, keeping change locally");
                DegradeReason::CallFailed(remote_message(other))
            }
        }
    }

    /// Mirror the list into the local snapshot. No-op until loaded.
    fn persist(&self) {
        if self.state != LoadState::Loaded {
            return;
        }
        Snapshot::new(self.records.clone()).write(self.local.as_ref(), &self.schema);
    }

    fn outcome(&self, kind: OpKind, record: Record, tier: Tier) -> Outcome<Record> {
        let notice = Notice::new(kind, self.schema.name.clone(), tier);
        info!(resource = %self.schema.name, id = record.id, degraded = notice.is_degraded(), "{}", notice);
        Outcome {
            value: record,
            notice,
        }
    }
}

fn remote_message(err: Error) -> String {
    match err {
        Error::RemoteCallFailed(message) => message,
        other => other.to_string(),
    }
}
