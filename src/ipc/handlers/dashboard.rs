use crate::ipc::error::{err, ok};
use crate::ipc::params::opt_date_param;
use crate::ipc::types::{AppState, Request};
use crate::page::PageOps;
use chrono::Utc;
use serde_json::{json, Value};

fn count(stats: &Value, key: &str) -> u64 {
    stats.get(key).and_then(|v| v.as_u64()).unwrap_or(0)
}

fn handle_admin_dashboard(state: &mut AppState, req: &Request) -> Value {
    let pages = &state.pages;
    let queries = pages.queries.stats();
    let announcements = pages.announcements.stats();
    ok(
        &req.id,
        json!({
            "summary": {
                "students": pages.students.store().len(),
                "courses": pages.courses.store().len(),
                "departments": pages.departments.store().len(),
                "activeAnnouncements": count(&announcements, "active"),
                "openQueries": count(&queries, "open") + count(&queries, "inProgress"),
            },
            "announcements": announcements,
            "courses": pages.courses.stats(),
            "departments": pages.departments.stats(),
            "events": pages.events.stats(),
            "queries": queries,
            "students": pages.students.stats(),
        }),
    )
}

fn handle_clerk_dashboard(state: &mut AppState, req: &Request) -> Value {
    let as_of = match opt_date_param(&req.params, "asOf") {
        Ok(d) => d.unwrap_or_else(|| Utc::now().date_naive()),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let pages = &state.pages;
    let verification = pages.verification.stats();
    let documents = pages.documents.stats();
    let library = pages.library.stats();
    let overdue = pages
        .loans
        .store()
        .records()
        .iter()
        .filter(|l| l.is_overdue(as_of))
        .count();
    ok(
        &req.id,
        json!({
            "asOf": as_of,
            "summary": {
                "pendingVerifications": count(&verification, "pending"),
                "pendingDocuments": count(&documents, "pending"),
                "booksOnLoan": count(&library, "onLoan"),
                "overdueLoans": overdue,
            },
            "verification": verification,
            "documents": documents,
            "library": library,
            "loans": pages.loans.stats(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "admin.dashboard" => Some(handle_admin_dashboard(state, req)),
        "clerk.dashboard" => Some(handle_clerk_dashboard(state, req)),
        _ => None,
    }
}
