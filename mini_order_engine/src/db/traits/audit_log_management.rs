use crate::{
    db_types::{LogOptions, NewOperationLog, OperationLog, OperationLogEntry},
    mo_api::{
        errors::EngineError,
        query_objects::{LogQueryFilter, Page, Pagination},
    },
};

/// The append-only operation log.
#[allow(async_fn_in_trait)]
pub trait AuditLogManagement {
    async fn insert_log(&self, log: NewOperationLog) -> Result<OperationLog, EngineError>;

    async fn search_logs(
        &self,
        filter: LogQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OperationLogEntry>, EngineError>;

    /// The distinct modules and actions that appear in the log.
    async fn fetch_log_options(&self) -> Result<LogOptions, EngineError>;
}
