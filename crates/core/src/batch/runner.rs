//! Batch orchestrator implementation.
//!
//! Drives the items of one session through submit and poll, one item at a
//! time in insertion order. A failing item never stops the batch.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::error::ConversionError;
use crate::files::{SelectedFile, MAX_UPLOAD_BYTES};
use crate::formats::FormatCatalog;
use crate::host::{FileSelector, HostError, ResultDownloader};
use crate::metrics;
use crate::normalize::normalize_result_url;
use crate::service::ConversionService;
use crate::task::{ConversionRequest, PollConfig, TaskHandle, TaskPoller, TaskStatus};

use super::config::BatchConfig;
use super::types::{
    AddFilesOutcome, BatchError, BatchEvent, BatchItem, BatchProgress, BatchSummary, ItemStatus,
    RequestTemplate, SkipReason, SkippedFile,
};

/// Clears the cancel and running flags when a run or retry ends.
///
/// A cancel requested before a run starts stays set until that run ends.
struct RunGuard {
    running: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }
}

/// The batch orchestrator - owns the item list of one conversion session.
pub struct BatchOrchestrator<S>
where
    S: ConversionService + 'static,
{
    config: BatchConfig,
    service: Arc<S>,
    poller: TaskPoller,

    // Runtime state
    items: Arc<RwLock<Vec<BatchItem>>>,
    running: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
    events: broadcast::Sender<BatchEvent>,
}

impl<S> BatchOrchestrator<S>
where
    S: ConversionService + 'static,
{
    /// Create a new orchestrator.
    pub fn new(config: BatchConfig, poll_config: PollConfig, service: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));

        Self {
            config,
            service,
            poller: TaskPoller::new(poll_config),
            items: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Subscribe to batch events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Snapshot of all items in order.
    pub async fn items(&self) -> Vec<BatchItem> {
        self.items.read().await.clone()
    }

    /// Snapshot of one item.
    pub async fn item(&self, id: &str) -> Option<BatchItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Append a pending item and return its id.
    pub async fn add_item(&self, request: ConversionRequest, name: &str, size: u64) -> String {
        let item = BatchItem::new(request, name, size);
        let id = item.id.clone();
        debug!(item_id = %id, file = %name, "Item added");

        self.items.write().await.push(item.clone());
        self.emit(BatchEvent::ItemAdded { item });
        id
    }

    /// Append one pending item per acceptable file.
    ///
    /// Files whose extension does not match the template's source format, or
    /// that exceed the upload limit, are skipped and reported.
    pub async fn add_files(
        &self,
        files: Vec<SelectedFile>,
        template: &RequestTemplate,
        catalog: &FormatCatalog,
    ) -> AddFilesOutcome {
        let mut outcome = AddFilesOutcome::default();

        for file in files {
            if let Some(source) = template.source_format.as_deref() {
                if !catalog.accepts_file(source, &file.name) {
                    let expected = catalog.allowed_extensions(source);
                    warn!(file = %file.name, source, "Skipping file with unexpected extension");
                    outcome.skipped.push(SkippedFile {
                        name: file.name,
                        reason: SkipReason::ExtensionMismatch { expected },
                    });
                    continue;
                }
            }

            if file.size > MAX_UPLOAD_BYTES {
                warn!(file = %file.name, size = file.size, "Skipping file over the upload limit");
                outcome.skipped.push(SkippedFile {
                    name: file.name,
                    reason: SkipReason::TooLarge {
                        size: file.size,
                        limit: MAX_UPLOAD_BYTES,
                    },
                });
                continue;
            }

            let request = template.request_for(&file.path);
            let id = self.add_item(request, &file.name, file.size).await;
            outcome.added.push(id);
        }

        outcome
    }

    /// Ask the host for files and add them.
    ///
    /// A dismissed picker adds nothing and is not an error.
    pub async fn add_selected(
        &self,
        selector: &dyn FileSelector,
        template: &RequestTemplate,
        catalog: &FormatCatalog,
    ) -> Result<AddFilesOutcome, BatchError> {
        let allowed = template
            .source_format
            .as_deref()
            .map(|source| catalog.allowed_extensions(source))
            .unwrap_or_default();

        let files = match selector
            .choose_files(&allowed, self.config.max_selection)
            .await
        {
            Ok(files) => files,
            Err(HostError::Cancelled) => {
                debug!("File selection cancelled");
                return Ok(AddFilesOutcome::default());
            }
            Err(e) => return Err(e.into()),
        };

        let files = files.into_iter().take(self.config.max_selection).collect();
        Ok(self.add_files(files, template, catalog).await)
    }

    /// Remove an item that is not being converted.
    pub async fn remove_item(&self, id: &str) -> Result<BatchItem, BatchError> {
        let removed = {
            let mut items = self.items.write().await;
            let index = items
                .iter()
                .position(|i| i.id == id)
                .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))?;
            if items[index].status == ItemStatus::Processing {
                return Err(BatchError::ItemProcessing(id.to_string()));
            }
            items.remove(index)
        };

        debug!(item_id = %id, "Item removed");
        self.emit(BatchEvent::ItemRemoved { id: id.to_string() });
        Ok(removed)
    }

    /// Stop the current run after the in-flight status query.
    ///
    /// The item being polled ends in `error`; items not yet started stay
    /// `pending`.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            info!("Batch cancellation requested");
        }
    }

    /// Convert every item that is `pending` right now, in order.
    pub async fn run(&self) -> Result<BatchSummary, BatchError> {
        let _guard = self.try_start()?;

        let pending: Vec<String> = self
            .items
            .read()
            .await
            .iter()
            .filter(|i| i.status == ItemStatus::Pending)
            .map(|i| i.id.clone())
            .collect();

        let mut progress = BatchProgress::new(pending.len());
        let mut summary = BatchSummary::default();

        info!(total = progress.total, "Starting batch");
        self.emit(BatchEvent::Started {
            total: progress.total,
        });

        for id in &pending {
            if self.is_cancelled() {
                info!(
                    done = progress.done,
                    total = progress.total,
                    "Batch cancelled, leaving remaining items pending"
                );
                summary.cancelled = true;
                break;
            }

            match self.process_item(id).await {
                Some(ItemStatus::Success) => {
                    summary.succeeded += 1;
                    progress.done += 1;
                }
                Some(_) => {
                    summary.failed += 1;
                    progress.done += 1;
                }
                None => {
                    debug!(item_id = %id, "Item removed before it started");
                    progress.total -= 1;
                }
            }

            self.emit(BatchEvent::Progress {
                done: progress.done,
                total: progress.total,
                percent: progress.percent(),
            });
        }

        summary.total = progress.total;
        summary.cancelled |= self.is_cancelled();

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Batch finished"
        );
        self.emit(BatchEvent::Completed {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Convert a failed item again.
    pub async fn retry_item(&self, id: &str) -> Result<BatchItem, BatchError> {
        let _guard = self.try_start()?;

        let item = self
            .item(id)
            .await
            .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))?;
        if item.status != ItemStatus::Error {
            return Err(BatchError::InvalidState {
                expected: ItemStatus::Error.to_string(),
                actual: item.status.to_string(),
            });
        }

        info!(item_id = %id, file = %item.name, "Retrying item");
        self.process_item(id).await;

        self.item(id)
            .await
            .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))
    }

    /// Hand a successful item's result URL to the host downloader.
    pub async fn download_result(
        &self,
        id: &str,
        downloader: &dyn ResultDownloader,
    ) -> Result<PathBuf, BatchError> {
        let item = self
            .item(id)
            .await
            .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))?;

        let url = match (item.status, item.result_url.as_deref()) {
            (ItemStatus::Success, Some(url)) => url,
            _ => {
                return Err(BatchError::InvalidState {
                    expected: ItemStatus::Success.to_string(),
                    actual: item.status.to_string(),
                })
            }
        };

        let path = downloader.download(url).await?;
        info!(item_id = %id, path = %path.display(), "Result downloaded");
        Ok(path)
    }

    fn try_start(&self) -> Result<RunGuard, BatchError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Batch already running");
            return Err(BatchError::AlreadyRunning);
        }
        Ok(RunGuard {
            running: Arc::clone(&self.running),
            cancelled: Arc::clone(&self.cancelled),
        })
    }

    /// Submit and poll one item. Returns its final status, or `None` if the
    /// item no longer exists.
    async fn process_item(&self, id: &str) -> Option<ItemStatus> {
        let item = self.update_item(id, BatchItem::begin).await?;
        info!(
            item_id = %id,
            file = %item.name,
            category = %item.request.category,
            target = %item.request.target_format,
            "Converting item"
        );

        let handle = match self.service.submit(&item.request).await {
            Ok(handle) => handle,
            Err(e) => return Some(self.fail_item(&item, &e).await),
        };
        self.update_item(id, |i| i.attach_task(handle.clone())).await;

        let result = self
            .poller
            .poll_until_complete(handle.as_str(), self.query_fn(), self.progress_fn(id))
            .await;

        match result {
            Ok(completed) => {
                let url = normalize_result_url(&completed.result_url);
                info!(
                    item_id = %id,
                    task_id = %handle,
                    polls = completed.polls,
                    url = %url,
                    "Item converted"
                );
                self.update_item(id, |i| i.succeed(url)).await;
                metrics::BATCH_ITEMS.with_label_values(&["success"]).inc();
                Some(ItemStatus::Success)
            }
            Err(e) => Some(self.fail_item(&item, &e).await),
        }
    }

    async fn fail_item(&self, item: &BatchItem, err: &ConversionError) -> ItemStatus {
        warn!(
            item_id = %item.id,
            file = %item.name,
            kind = err.kind(),
            error = %err,
            "Item conversion failed"
        );

        let message = err.to_string();
        self.update_item(&item.id, |i| i.fail(message.clone())).await;
        metrics::BATCH_ITEMS.with_label_values(&["error"]).inc();
        self.emit(BatchEvent::ItemFailed {
            id: item.id.clone(),
            name: item.name.clone(),
            message,
        });
        ItemStatus::Error
    }

    /// Status query that refuses to run once the batch is cancelled.
    fn query_fn(
        &self,
    ) -> impl FnMut(&str) -> BoxFuture<'static, Result<TaskStatus, ConversionError>> {
        let service = Arc::clone(&self.service);
        let cancelled = Arc::clone(&self.cancelled);

        move |task_id: &str| {
            let service = Arc::clone(&service);
            let cancelled = Arc::clone(&cancelled);
            let handle = TaskHandle::new(task_id);
            async move {
                if cancelled.load(Ordering::SeqCst) {
                    return Err(ConversionError::Cancelled);
                }
                service.query_task(&handle).await
            }
            .boxed()
        }
    }

    fn progress_fn(&self, id: &str) -> impl FnMut(u8) + Send {
        let events = self.events.clone();
        let id = id.to_string();
        move |percent| {
            let _ = events.send(BatchEvent::ItemProgress {
                id: id.clone(),
                percent,
            });
        }
    }

    /// Apply `change` to the item with `id` and publish its new state.
    async fn update_item<F>(&self, id: &str, change: F) -> Option<BatchItem>
    where
        F: FnOnce(&mut BatchItem),
    {
        let snapshot = {
            let mut items = self.items.write().await;
            let item = items.iter_mut().find(|i| i.id == id)?;
            change(item);
            item.clone()
        };

        self.emit(BatchEvent::ItemUpdated {
            item: snapshot.clone(),
        });
        Some(snapshot)
    }

    /// Publish an event. Having no subscriber is fine.
    fn emit(&self, event: BatchEvent) {
        let _ = self.events.send(event);
    }
}
