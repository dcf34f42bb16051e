pub mod batch;
pub mod config;
pub mod error;
pub mod files;
pub mod formats;
pub mod host;
pub mod metrics;
pub mod normalize;
pub mod service;
pub mod task;
pub mod testing;
pub mod transport;

pub use batch::{
    AddFilesOutcome, BatchConfig, BatchError, BatchEvent, BatchItem, BatchOrchestrator,
    BatchProgress, BatchSummary, ItemStatus, RequestTemplate, SkipReason, SkippedFile,
};
pub use config::{
    load_config, load_config_from_str, resolve_base_url, validate_config, ApiConfig, Config,
    ConfigError, PRODUCTION_BASE_URL,
};
pub use error::ConversionError;
pub use files::{format_size, SelectedFile, MAX_UPLOAD_BYTES};
pub use formats::{FormatCatalog, FormatTable};
pub use host::{FileSelector, HostError, ResultDownloader};
pub use normalize::{normalize_optional, normalize_result_url};
pub use service::{ConversionService, ConvertClient};
pub use task::{
    estimate_progress, Category, CompletedTask, ConversionRequest, PollConfig, TaskHandle,
    TaskPoller, TaskState, TaskStatus,
};
pub use transport::{HttpTransport, Transport};
