use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{db_types::OrderStatusType, mo_api::errors::EngineError};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

//--------------------------------------      Pagination       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Builds a pagination window. Missing values fall back to page 1 and the default page size.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, EngineError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(EngineError::validation(format!("page must be at least 1, got {page}")));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(EngineError::validation(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let page_size = pagination.page_size();
        let total_pages = (total + page_size - 1) / page_size;
        Self { items, total, page: pagination.page(), page_size, total_pages }
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

//--------------------------------------   OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub store_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the buyer's name
    pub buyer_name: Option<String>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_store_id(mut self, store_id: i64) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_buyer_name<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.buyer_name = Some(name.trim().to_string());
        }
        self
    }

    /// Parses the optional `status`, `startDate` and `endDate` query parameters into this filter.
    pub fn with_query_params(
        mut self,
        status: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, EngineError> {
        if let Some(s) = status.filter(|s| !s.trim().is_empty()) {
            let status = s.parse::<OrderStatusType>().map_err(|e| EngineError::validation(e.to_string()))?;
            self.status = Some(status);
        }
        if let Some(d) = start_date.filter(|s| !s.trim().is_empty()) {
            self.since = Some(parse_date_bound(d, false)?);
        }
        if let Some(d) = end_date.filter(|s| !s.trim().is_empty()) {
            self.until = Some(parse_date_bound(d, true)?);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.store_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.buyer_name.is_none()
    }
}

//--------------------------------------    LogQueryFilter     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogSortField {
    #[default]
    CreatedAt,
    Id,
}

impl LogSortField {
    pub fn column(&self) -> &'static str {
        match self {
            LogSortField::CreatedAt => "l.created_at",
            LogSortField::Id => "l.id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQueryFilter {
    /// Matches the email of either the user or the admin that performed the operation
    pub email: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub order_by: LogSortField,
    pub ascending: bool,
}

impl LogQueryFilter {
    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_module<S: Into<String>>(mut self, module: S) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_action<S: Into<String>>(mut self, action: S) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn order_by(mut self, field: LogSortField, ascending: bool) -> Self {
        self.order_by = field;
        self.ascending = ascending;
        self
    }

    /// Parses the string query parameters accepted by the log search endpoint.
    pub fn from_query_params(
        email: Option<&str>,
        module: Option<&str>,
        action: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        order_by: Option<&str>,
        order: Option<&str>,
    ) -> Result<Self, EngineError> {
        let non_empty = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        let order_by = match order_by.map(str::trim) {
            None | Some("") | Some("createdAt") => LogSortField::CreatedAt,
            Some("id") => LogSortField::Id,
            Some(other) => return Err(EngineError::validation(format!("Cannot order logs by {other}"))),
        };
        let ascending = match order.map(|s| s.trim().to_ascii_lowercase()) {
            None => false,
            Some(o) if o.is_empty() || o == "desc" => false,
            Some(o) if o == "asc" => true,
            Some(o) => return Err(EngineError::validation(format!("Sort order must be asc or desc, not {o}"))),
        };
        let since = non_empty(start_date).map(|d| parse_date_bound(&d, false)).transpose()?;
        let until = non_empty(end_date).map(|d| parse_date_bound(&d, true)).transpose()?;
        Ok(Self {
            email: non_empty(email),
            module: non_empty(module),
            action: non_empty(action),
            since,
            until,
            order_by,
            ascending,
        })
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date. A plain date used as an upper bound covers the whole day.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, EngineError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("{value} is not a valid date")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| EngineError::validation(format!("{value} is not a valid date")))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod test {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn pagination_defaults_and_bounds() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!((p.page(), p.page_size(), p.offset()), (1, 10, 0));
        let p = Pagination::new(Some(3), Some(20)).unwrap();
        assert_eq!(p.offset(), 40);
        assert!(matches!(Pagination::new(Some(0), None), Err(EngineError::Validation(_))));
        assert!(matches!(Pagination::new(Some(1), Some(0)), Err(EngineError::Validation(_))));
        assert!(matches!(Pagination::new(Some(1), Some(MAX_PAGE_SIZE + 1)), Err(EngineError::Validation(_))));
    }

    #[test]
    fn page_counts() {
        let p = Pagination::new(Some(2), Some(10)).unwrap();
        let page = Page::new(vec![1, 2, 3], 23, p);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        let empty: Page<i32> = Page::empty(p);
        assert_eq!(empty.total_pages, 0);
        let json = serde_json::to_value(page.map(|v| v * 2)).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["items"][2], 6);
    }

    #[test]
    fn date_bounds() {
        let start = parse_date_bound("2024-03-01", false).unwrap();
        assert_eq!((start.day(), start.hour()), (1, 0));
        let end = parse_date_bound("2024-03-01", true).unwrap();
        assert_eq!((end.day(), end.hour(), end.minute()), (1, 23, 59));
        let ts = parse_date_bound("2024-03-01T12:30:00+02:00", true).unwrap();
        assert_eq!(ts.hour(), 10);
        assert!(parse_date_bound("yesterday", false).is_err());
    }

    #[test]
    fn order_filter_from_params() {
        let f = OrderQueryFilter::default()
            .with_buyer_id(4)
            .with_query_params(Some("Completed"), Some("2024-01-01"), None)
            .unwrap();
        assert_eq!(f.status, Some(OrderStatusType::Completed));
        assert!(f.since.is_some() && f.until.is_none());
        let err = OrderQueryFilter::default().with_query_params(Some("lost"), None, None);
        assert!(matches!(err, Err(EngineError::Validation(_))));
        assert!(OrderQueryFilter::default().with_buyer_name("  ").is_empty());
    }

    #[test]
    fn log_filter_from_params() {
        let f =
            LogQueryFilter::from_query_params(Some(""), Some("USER"), None, None, None, Some("id"), Some("asc")).unwrap();
        assert_eq!(f.email, None);
        assert_eq!(f.module.as_deref(), Some("USER"));
        assert_eq!(f.order_by, LogSortField::Id);
        assert!(f.ascending);
        assert!(LogQueryFilter::from_query_params(None, None, None, None, None, Some("name"), None).is_err());
        assert!(LogQueryFilter::from_query_params(None, None, None, None, None, None, Some("up")).is_err());
    }
}
