//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a store query took.
pub fn record_query_duration(query_name: &str, table: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string(),
        "table" => table.to_string()
    )
    .record(duration_secs);
}

/// Count a failed store query.
pub fn record_query_error(query_name: &str, table: &str) {
    counter!(
        "database_query_errors_total",
        "query" => query_name.to_string(),
        "table" => table.to_string()
    )
    .increment(1);
}

/// Record connection pool gauges. Called when metrics are scraped.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one query and records it under the query and table names.
///
/// ```ignore
/// let timer = QueryTimer::new("settings_fetch", "display_settings");
/// let result = query.fetch_all(&mut *conn).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query_name: String,
    table: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            table: table.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, &self.table, duration);
    }

    /// Record the elapsed duration, and an error count if the query failed.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        if result.is_err() {
            record_query_error(&self.query_name, &self.table);
        }
        self.record();
    }
}
