use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::AuditLogManagement,
    db_types::{Actor, LogAction, LogModule, LogOptions, NewOperationLog, OperationLogEntry},
    helpers::locate_ip,
    mo_api::{
        errors::EngineError,
        query_objects::{LogQueryFilter, Page, Pagination},
    },
};

/// Where a logged request came from.
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    pub ip: String,
    pub user_agent: String,
}

impl RequestOrigin {
    pub fn new<S: Into<String>>(ip: S, user_agent: S) -> Self {
        Self { ip: ip.into(), user_agent: user_agent.into() }
    }
}

/// Writes and reads the operation log.
pub struct AuditApi<B> {
    db: B,
}

impl<B> Debug for AuditApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuditApi")
    }
}

impl<B> AuditApi<B>
where B: AuditLogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Appends an entry to the operation log.
    ///
    /// The operation being logged has already happened by the time this is called, so a failure here is logged and
    /// otherwise ignored.
    pub async fn record<S: Into<String>>(
        &self,
        actor: Actor,
        action: LogAction,
        module: LogModule,
        description: S,
        origin: &RequestOrigin,
    ) {
        let log = NewOperationLog {
            actor,
            action,
            module,
            description: description.into(),
            ip: origin.ip.clone(),
            area: locate_ip(&origin.ip),
            user_agent: origin.user_agent.clone(),
        };
        match self.db.insert_log(log).await {
            Ok(entry) => trace!("🔄️📝️ Operation log #{} written", entry.id),
            Err(e) => error!("🔄️📝️ Could not write {} {} operation log. {e}", module.as_str(), action.as_str()),
        }
    }

    pub async fn search(
        &self,
        filter: LogQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OperationLogEntry>, EngineError> {
        self.db.search_logs(filter, pagination).await
    }

    pub async fn options(&self) -> Result<LogOptions, EngineError> {
        self.db.fetch_log_options().await
    }
}
