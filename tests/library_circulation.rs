mod test_support;

use serde_json::json;
use test_support::spawn_sidecar;

#[test]
fn issuing_and_returning_moves_copies() {
    let mut sc = spawn_sidecar();
    let book = sc.request_ok("1", "library.get", json!({ "id": 2 }));
    let available = book["availableCopies"].as_u64().expect("copies");

    let issued = sc.request_ok(
        "2",
        "library.issue",
        json!({ "bookId": 2, "studentName": "Neha Singh", "rollNumber": "22me014", "issueDate": "2024-02-01", "days": 7 }),
    );
    assert_eq!(issued["applied"], true);
    assert_eq!(issued["book"]["availableCopies"], available - 1);
    assert_eq!(issued["loan"]["status"], "issued");
    assert_eq!(issued["loan"]["rollNumber"], "22ME014");
    assert_eq!(issued["loan"]["dueDate"], "2024-02-08");
    assert_eq!(issued["loan"]["bookTitle"], book["title"]);
    let loan_id = issued["loanId"].as_u64().expect("loan id");

    let returned = sc.request_ok("3", "library.return", json!({ "loanId": loan_id }));
    assert_eq!(returned["applied"], true);
    assert_eq!(returned["loan"]["status"], "returned");
    assert!(returned["loan"]["returnedAt"].is_string());
    let book = sc.request_ok("4", "library.get", json!({ "id": 2 }));
    assert_eq!(book["availableCopies"], available);

    let again = sc.request_ok("5", "library.return", json!({ "loanId": loan_id }));
    assert_eq!(again["applied"], false);
    let book = sc.request_ok("6", "library.get", json!({ "id": 2 }));
    assert_eq!(book["availableCopies"], available);
}

#[test]
fn books_without_copies_cannot_be_issued() {
    let mut sc = spawn_sidecar();
    let (code, error) = sc.request_err(
        "1",
        "library.issue",
        json!({ "bookId": 3, "studentName": "Neha Singh", "rollNumber": "22ME014" }),
    );
    assert_eq!(code, "unavailable");
    assert_eq!(error["details"]["bookId"], 3);

    let missing = sc.request_ok(
        "2",
        "library.issue",
        json!({ "bookId": 404, "studentName": "Neha Singh", "rollNumber": "22ME014" }),
    );
    assert_eq!(missing["applied"], false);

    let (code, _) = sc.request_err(
        "3",
        "library.issue",
        json!({ "bookId": 1, "studentName": "Neha Singh", "rollNumber": "22ME014", "days": 365 }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn overdue_marking_and_clerk_dashboard_agree() {
    let mut sc = spawn_sidecar();
    let before = sc.request_ok("1", "clerk.dashboard", json!({ "asOf": "2024-03-01" }));
    let overdue = before["summary"]["overdueLoans"].as_u64().expect("overdue");
    assert!(overdue > 0);
    assert_eq!(before["summary"]["booksOnLoan"], 6);

    let marked = sc.request_ok("2", "library.markOverdue", json!({ "asOf": "2024-03-01" }));
    assert_eq!(marked["marked"], overdue);
    let again = sc.request_ok("3", "library.markOverdue", json!({ "asOf": "2024-03-01" }));
    assert_eq!(again["marked"], 0);

    let loans = sc.request_ok("4", "loans.list", json!({ "filters": { "status": "overdue" } }));
    assert_eq!(loans["matched"], overdue);
    let stats = sc.request_ok("5", "loans.stats", json!({}));
    assert_eq!(stats["overdue"], overdue);
}

#[test]
fn loans_stay_in_step_with_shelf_counts() {
    let mut sc = spawn_sidecar();
    let (code, _) = sc.request_err("1", "loans.form.create", json!({}));
    assert_eq!(code, "not_supported");

    let book = sc.request_ok("2", "library.get", json!({ "id": 1 }));
    let available = book["availableCopies"].as_u64().expect("copies");
    let out = sc.request_ok("3", "loans.setStatus", json!({ "id": 1, "status": "returned" }));
    assert_eq!(out["applied"], true);
    let book = sc.request_ok("4", "library.get", json!({ "id": 1 }));
    assert_eq!(book["availableCopies"], available + 1);

    let out = sc.request_ok("5", "loans.delete", json!({ "id": 2 }));
    assert_eq!(out["applied"], true);
    let book = sc.request_ok("6", "library.get", json!({ "id": 1 }));
    assert_eq!(book["availableCopies"], available + 2);
}

#[test]
fn editing_total_copies_keeps_loans_outstanding() {
    let mut sc = spawn_sidecar();
    let _ = sc.request_ok("1", "library.form.edit", json!({ "id": 1 }));
    let (code, _) = sc.request_err(
        "2",
        "library.form.patch",
        json!({ "fields": { "availableCopies": 50 } }),
    );
    assert_eq!(code, "validation_failed");
    let _ = sc.request_ok("3", "library.form.patch", json!({ "fields": { "totalCopies": 10 } }));
    let commit = sc.request_ok("4", "library.form.commit", json!({}));
    assert_eq!(commit["record"]["totalCopies"], 10);
    assert_eq!(commit["record"]["availableCopies"], 8);
}

fn assert_shelf_matches_loans(sc: &mut test_support::Sidecar, book_id: u64) {
    let book = sc.request_ok("shelf-book", "library.get", json!({ "id": book_id }));
    let loans = sc.request_ok("shelf-loans", "loans.list", json!({}));
    let open = loans["records"]
        .as_array()
        .expect("records")
        .iter()
        .filter(|l| l["bookId"] == book_id && l["status"] != "returned")
        .count() as u64;
    let total = book["totalCopies"].as_u64().expect("total");
    let available = book["availableCopies"].as_u64().expect("available");
    assert_eq!(total - available, open, "book {}", book_id);
}

#[test]
fn reopening_a_returned_loan_takes_the_copy_back() {
    let mut sc = spawn_sidecar();
    let issued = sc.request_ok(
        "1",
        "library.issue",
        json!({ "bookId": 2, "studentName": "Neha Singh", "rollNumber": "22ME014" }),
    );
    let loan_id = issued["loanId"].as_u64().expect("loan id");
    let _ = sc.request_ok("2", "library.return", json!({ "loanId": loan_id }));
    assert_shelf_matches_loans(&mut sc, 2);

    let out = sc.request_ok("3", "loans.setStatus", json!({ "id": loan_id, "status": "issued" }));
    assert_eq!(out["applied"], true);
    assert_eq!(out["record"]["status"], "issued");
    assert!(out["record"]["returnedAt"].is_null());
    assert_shelf_matches_loans(&mut sc, 2);

    // Moving between open statuses leaves the shelf alone.
    let out = sc.request_ok("4", "loans.setStatus", json!({ "id": loan_id, "status": "overdue" }));
    assert_eq!(out["record"]["status"], "overdue");
    assert_shelf_matches_loans(&mut sc, 2);
}

#[test]
fn reopening_fails_when_the_shelf_is_empty() {
    let mut sc = spawn_sidecar();
    // Book 3 has every copy out; return one, lend it again, then try to
    // reopen the first loan.
    let _ = sc.request_ok("1", "loans.setStatus", json!({ "id": 3, "status": "returned" }));
    let _ = sc.request_ok(
        "2",
        "library.issue",
        json!({ "bookId": 3, "studentName": "Neha Singh", "rollNumber": "22ME014" }),
    );
    let (code, error) = sc.request_err("3", "loans.setStatus", json!({ "id": 3, "status": "issued" }));
    assert_eq!(code, "unavailable");
    assert_eq!(error["details"]["bookId"], 3);

    let loan = sc.request_ok("4", "loans.get", json!({ "id": 3 }));
    assert_eq!(loan["status"], "returned");
    assert_shelf_matches_loans(&mut sc, 3);

    let (code, _) = sc.request_err("5", "loans.setStatus", json!({ "id": 3, "status": "lost" }));
    assert_eq!(code, "validation_failed");
}

#[test]
fn books_with_open_loans_cannot_be_deleted() {
    let mut sc = spawn_sidecar();
    let (code, error) = sc.request_err("1", "library.delete", json!({ "id": 1 }));
    assert_eq!(code, "validation_failed");
    assert_eq!(error["details"]["openLoans"], json!([1, 2]));
    let book = sc.request_ok("2", "library.get", json!({ "id": 1 }));
    assert_eq!(book["id"], 1);

    // Book 2 has nothing out.
    let out = sc.request_ok("3", "library.delete", json!({ "id": 2 }));
    assert_eq!(out["applied"], true);
    let missing = sc.request_ok("4", "library.delete", json!({ "id": 2 }));
    assert_eq!(missing["applied"], false);
}
