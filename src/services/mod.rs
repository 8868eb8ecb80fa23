// Cross-cutting helpers
pub mod audit;
pub mod codes;

// Status lifecycle shared by quote requests and purchase orders
pub mod lifecycle;

// Catalog
pub mod companies;
pub mod materials;
pub mod suppliers;

// Documents
pub mod purchase_orders;
pub mod quote_comparisons;
pub mod quote_requests;
pub mod technical_sheets;

// Pricing
pub mod price_history;

// Account settings and data management
pub mod admin;
pub mod bulk_import;
pub mod exports;
pub mod profiles;

use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition,
};

const LIKE_ESCAPE: char = '\\';

/// Escapes `%`, `_` and the escape character so they match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive `LIKE %term%` over any of `columns`; the term is matched literally.
pub(crate) fn contains_any<C>(columns: &[C], term: &str) -> Condition
where
    C: ColumnTrait,
{
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));
    columns.iter().fold(Condition::any(), |cond, col| {
        let lowered = Func::lower(Expr::col(col.as_column_ref()));
        cond.add(Expr::expr(lowered).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)))
    })
}

/// Trims a free-text field, mapping blank values to `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        db::{establish_connection, run_migrations, DbPool},
        events::{process_events, EventSender},
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    /// A migrated SQLite database in a temporary directory. Keep the
    /// `TempDir` alive for as long as the pool is used.
    pub async fn setup_db() -> (TempDir, Arc<DbPool>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.sqlite").display());
        let db = establish_connection(&url).await.expect("connect");
        run_migrations(&db).await.expect("migrate");
        (dir, Arc::new(db))
    }

    /// An event sender whose events are drained by the logging processor
    pub fn event_sender() -> Arc<EventSender> {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(process_events(rx));
        Arc::new(EventSender::new(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("cemento"), "cemento");
    }
}
