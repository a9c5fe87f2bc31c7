//! Circulation: issuing and returning books keeps the loan list and the
//! shelf counts in step.

use crate::domain::catalog::LoanStatus;
use crate::domain::library::DEFAULT_LOAN_DAYS;
use crate::domain::{Loan, Record, RecordId};
use crate::ipc::error::{err, ok};
use crate::ipc::params::{id_param, opt_date_param, opt_u64_param, str_param};
use crate::ipc::types::{AppState, Request};
use crate::page::{to_json, PageOps};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::convert::Infallible;
use tracing::{debug, info};

const MAX_LOAN_DAYS: u64 = 90;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn handle_issue(state: &mut AppState, req: &Request) -> Value {
    let p = &req.params;
    let parsed = id_param(p, "bookId").and_then(|book_id| {
        let student_name = str_param(p, "studentName")?.trim();
        let roll_number = str_param(p, "rollNumber")?.trim();
        if student_name.is_empty() || roll_number.is_empty() {
            return Err("studentName and rollNumber must not be empty".to_string());
        }
        let days = opt_u64_param(p, "days")?.unwrap_or(DEFAULT_LOAN_DAYS as u64);
        if !(1..=MAX_LOAN_DAYS).contains(&days) {
            return Err(format!("days must be in 1..={}", MAX_LOAN_DAYS));
        }
        let issued = opt_date_param(p, "issueDate")?.unwrap_or_else(today);
        Ok((book_id, student_name, roll_number, days as i64, issued))
    });
    let (book_id, student_name, roll_number, days, issued) = match parsed {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let books = state.pages.library.store_mut();
    let Some(book) = books.get(book_id) else {
        debug!(%book_id, "issue skipped, no such book");
        return ok(&req.id, json!({ "applied": false, "bookId": book_id }));
    };
    if book.available_copies == 0 {
        return err(
            &req.id,
            "unavailable",
            format!("no copies of \"{}\" are available", book.title),
            Some(json!({ "bookId": book_id, "totalCopies": book.total_copies })),
        );
    }
    let taken = books
        .update(book_id, |b| {
            b.take_copy();
            Ok::<(), Infallible>(())
        })
        .unwrap_or(false);
    let Some(book) = books.get(book_id).filter(|_| taken).cloned() else {
        return ok(&req.id, json!({ "applied": false, "bookId": book_id }));
    };

    let loan = Loan::issue(&book, student_name, roll_number, issued, days);
    let loans = state.pages.loans.store_mut();
    let loan_id = loans.insert(loan);
    info!(%book_id, %loan_id, roll_number, "book issued");
    ok(
        &req.id,
        json!({
            "applied": true,
            "loanId": loan_id,
            "loan": loans.get(loan_id).map(to_json),
            "book": to_json(&book),
        }),
    )
}

/// Closes a loan and puts the copy back. `None` when the loan is unknown.
fn return_loan(state: &mut AppState, loan_id: RecordId) -> Option<Value> {
    let loans = state.pages.loans.store_mut();
    let loan = loans.get(loan_id)?.clone();
    if !loan.is_open() {
        return Some(json!({
            "applied": false,
            "loanId": loan_id,
            "reason": "already returned",
        }));
    }
    let _ = loans.update(loan_id, |l| {
        l.mark_returned();
        Ok::<(), Infallible>(())
    });
    let record = loans.get(loan_id).map(to_json);
    let restocked = state
        .pages
        .library
        .store_mut()
        .update(loan.book_id, |b| {
            b.put_back_copy();
            Ok::<(), Infallible>(())
        })
        .unwrap_or(false);
    info!(%loan_id, book_id = %loan.book_id, restocked, "book returned");
    Some(json!({
        "applied": true,
        "loanId": loan_id,
        "loan": record,
        "restocked": restocked,
    }))
}

fn handle_return(state: &mut AppState, req: &Request) -> Value {
    let loan_id = match id_param(&req.params, "loanId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match return_loan(state, loan_id) {
        Some(v) => ok(&req.id, v),
        None => {
            debug!(%loan_id, "return skipped, no such loan");
            ok(&req.id, json!({ "applied": false, "loanId": loan_id }))
        }
    }
}

fn handle_mark_overdue(state: &mut AppState, req: &Request) -> Value {
    let as_of = match opt_date_param(&req.params, "asOf") {
        Ok(d) => d.unwrap_or_else(today),
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let loans = state.pages.loans.store_mut();
    let due: Vec<RecordId> = loans
        .records()
        .iter()
        .filter(|l| l.status == LoanStatus::Issued && l.is_overdue(as_of))
        .map(|l| l.id())
        .collect();
    for id in &due {
        let _ = loans.update(*id, |l| {
            l.status = LoanStatus::Overdue;
            Ok::<(), Infallible>(())
        });
    }
    if !due.is_empty() {
        info!(count = due.len(), %as_of, "loans marked overdue");
    }
    ok(
        &req.id,
        json!({ "marked": due.len(), "loanIds": due, "asOf": as_of }),
    )
}

/// Puts a returned loan back into circulation. The copy comes off the shelf
/// again, so this fails with `unavailable` when none is left.
fn reopen_loan(state: &mut AppState, req: &Request, loan: &Loan, next: LoanStatus) -> Value {
    let loan_id = loan.id();
    let book_id = loan.book_id;
    let books = state.pages.library.store_mut();
    let available = books.get(book_id).map(|b| b.available_copies);
    if available.unwrap_or(0) == 0 {
        let message = match available {
            None => format!("book {} is no longer in the catalogue", book_id),
            Some(_) => format!("no copies of \"{}\" are available", loan.book_title),
        };
        return err(
            &req.id,
            "unavailable",
            message,
            Some(json!({ "loanId": loan_id, "bookId": book_id })),
        );
    }
    let _ = books.update(book_id, |b| {
        b.take_copy();
        Ok::<(), Infallible>(())
    });
    let loans = state.pages.loans.store_mut();
    let _ = loans.update(loan_id, |l| {
        l.set_open_status(next);
        Ok::<(), Infallible>(())
    });
    info!(%loan_id, %book_id, status = next.as_str(), "loan reopened");
    ok(
        &req.id,
        json!({ "applied": true, "id": loan_id, "record": loans.get(loan_id).map(to_json) }),
    )
}

/// Status changes that cross the returned/open line move a copy between
/// the loan and the shelf. Everything else is left to the generic handler.
fn handle_loans_set_status(state: &mut AppState, req: &Request) -> Option<Value> {
    let status = req.params.get("status").and_then(|v| v.as_str())?;
    let next = LoanStatus::parse(status)?;
    let loan_id = match id_param(&req.params, "id") {
        Ok(v) => v,
        Err(msg) => return Some(err(&req.id, "bad_params", msg, None)),
    };
    if next == LoanStatus::Returned {
        let result = return_loan(state, loan_id)
            .unwrap_or_else(|| json!({ "applied": false, "loanId": loan_id }));
        return Some(ok(&req.id, result));
    }
    let loan = state.pages.loans.store().get(loan_id)?.clone();
    if loan.is_open() {
        return None;
    }
    Some(reopen_loan(state, req, &loan, next))
}

/// A book with copies out on loan stays in the catalogue.
fn handle_library_delete(state: &mut AppState, req: &Request) -> Value {
    let book_id = match id_param(&req.params, "id") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let open: Vec<RecordId> = state
        .pages
        .loans
        .store()
        .records()
        .iter()
        .filter(|l| l.book_id == book_id && l.is_open())
        .map(|l| l.id())
        .collect();
    if !open.is_empty() {
        return err(
            &req.id,
            "validation_failed",
            format!("book {} has {} open loan(s)", book_id, open.len()),
            Some(json!({ "bookId": book_id, "openLoans": open })),
        );
    }
    ok(&req.id, state.pages.library.delete(book_id))
}

/// Deleting an open loan puts its copy back on the shelf.
fn handle_loans_delete(state: &mut AppState, req: &Request) -> Value {
    let loan_id = match id_param(&req.params, "id") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let open_book = state
        .pages
        .loans
        .store()
        .get(loan_id)
        .filter(|l| l.is_open())
        .map(|l| l.book_id);
    let result = state.pages.loans.delete(loan_id);
    if let Some(book_id) = open_book {
        let _ = state.pages.library.store_mut().update(book_id, |b| {
            b.put_back_copy();
            Ok::<(), Infallible>(())
        });
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "library.issue" => Some(handle_issue(state, req)),
        "library.return" => Some(handle_return(state, req)),
        "library.markOverdue" => Some(handle_mark_overdue(state, req)),
        "loans.setStatus" => handle_loans_set_status(state, req),
        "loans.delete" => Some(handle_loans_delete(state, req)),
        "library.delete" => Some(handle_library_delete(state, req)),
        _ => None,
    }
}
