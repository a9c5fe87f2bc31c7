mod test_support;

use serde_json::json;
use test_support::{ids, spawn_sidecar};

#[test]
fn creating_a_course_appends_with_fresh_id_and_no_assignments() {
    let mut sc = spawn_sidecar();
    let opened = sc.request_ok("1", "courses.form.create", json!({}));
    assert_eq!(opened["mode"], "creating");
    assert_eq!(opened["canCommit"], false);
    assert_eq!(opened["draft"]["assignments"], json!([]));

    let patched = sc.request_ok(
        "2",
        "courses.form.patch",
        json!({ "fields": { "name": "Compiler Design", "code": "cs401", "department": "CSE", "credits": 4 } }),
    );
    assert_eq!(patched["canCommit"], true);
    assert_eq!(patched["missing"], json!([]));

    let commit = sc.request_ok("3", "courses.form.commit", json!({}));
    assert_eq!(commit["applied"], true);
    assert_eq!(commit["id"], 6);
    assert_eq!(commit["record"]["code"], "CS401");
    assert_eq!(commit["record"]["assignments"], json!([]));
    assert_eq!(commit["record"]["enrolled"], 0);

    let list = sc.request_ok("4", "courses.list", json!({}));
    assert_eq!(ids(&list["records"]), vec![1, 2, 3, 4, 5, 6]);

    let form = sc.request_ok("5", "courses.form.get", json!({}));
    assert_eq!(form["mode"], "closed");
}

#[test]
fn commit_with_missing_fields_reports_them_and_keeps_the_draft() {
    let mut sc = spawn_sidecar();
    let _ = sc.request_ok("1", "courses.form.create", json!({}));
    let _ = sc.request_ok("2", "courses.form.patch", json!({ "fields": { "name": "Robotics" } }));
    let (code, error) = sc.request_err("3", "courses.form.commit", json!({}));
    assert_eq!(code, "validation_failed");
    assert_eq!(error["details"]["missing"], json!(["code", "department"]));

    let form = sc.request_ok("4", "courses.form.get", json!({}));
    assert_eq!(form["mode"], "creating");
    assert_eq!(form["draft"]["name"], "Robotics");

    let list = sc.request_ok("5", "courses.list", json!({}));
    assert_eq!(list["total"], 5);
}

#[test]
fn edit_preserves_identity_and_system_fields() {
    let mut sc = spawn_sidecar();
    let original = sc.request_ok("1", "courses.get", json!({ "id": 1 }));
    let _ = sc.request_ok("2", "courses.form.edit", json!({ "id": 1 }));

    let (code, error) = sc.request_err(
        "3",
        "courses.form.patch",
        json!({ "fields": { "enrolled": 999 } }),
    );
    assert_eq!(code, "validation_failed");
    assert_eq!(error["details"]["field"], "enrolled");
    let (code, _) = sc.request_err("4", "courses.form.patch", json!({ "fields": { "id": 77 } }));
    assert_eq!(code, "validation_failed");
    let (code, _) = sc.request_err(
        "5",
        "courses.form.patch",
        json!({ "fields": { "department": "Astronomy" } }),
    );
    assert_eq!(code, "validation_failed");

    let _ = sc.request_ok("6", "courses.form.patch", json!({ "fields": { "credits": 5 } }));
    let commit = sc.request_ok("7", "courses.form.commit", json!({}));
    assert_eq!(commit["action"], "updated");

    let updated = sc.request_ok("8", "courses.get", json!({ "id": 1 }));
    assert_eq!(updated["id"], original["id"]);
    assert_eq!(updated["createdAt"], original["createdAt"]);
    assert_eq!(updated["enrolled"], original["enrolled"]);
    assert_eq!(updated["assignments"], original["assignments"]);
    assert_eq!(updated["credits"], 5);
    assert!(updated["updatedAt"].is_string());

    let list = sc.request_ok("9", "courses.list", json!({}));
    assert_eq!(list["total"], 5);
}

#[test]
fn cancel_discards_the_draft() {
    let mut sc = spawn_sidecar();
    let _ = sc.request_ok("1", "courses.form.edit", json!({ "id": 2 }));
    let _ = sc.request_ok("2", "courses.form.patch", json!({ "fields": { "name": "Renamed" } }));
    let cancelled = sc.request_ok("3", "courses.form.cancel", json!({}));
    assert_eq!(cancelled["mode"], "closed");
    let (code, _) = sc.request_err("4", "courses.form.commit", json!({}));
    assert_eq!(code, "no_draft");
    let course = sc.request_ok("5", "courses.get", json!({ "id": 2 }));
    assert_eq!(course["name"], "Digital Electronics");
}

#[test]
fn assignments_are_added_outside_the_form() {
    let mut sc = spawn_sidecar();
    let out = sc.request_ok(
        "1",
        "courses.assignments.add",
        json!({ "id": 4, "title": "ER diagram", "dueDate": "2024-03-01", "maxMarks": 25 }),
    );
    assert_eq!(out["applied"], true);
    let assignments = out["record"]["assignments"].as_array().expect("assignments");
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["title"], "ER diagram");
    assert_eq!(assignments[0]["dueDate"], "2024-03-01");
    assert_eq!(assignments[0]["maxMarks"], 25);

    let missing = sc.request_ok(
        "2",
        "courses.assignments.add",
        json!({ "id": 99, "title": "Ghost" }),
    );
    assert_eq!(missing["applied"], false);

    let (code, _) = sc.request_err(
        "3",
        "courses.assignments.add",
        json!({ "id": 4, "title": "  " }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn courses_group_by_department() {
    let mut sc = spawn_sidecar();
    let out = sc.request_ok("1", "courses.groups", json!({ "by": "department" }));
    let groups = out["groups"].as_array().expect("groups");
    let keys: Vec<&str> = groups.iter().map(|g| g["key"].as_str().expect("key")).collect();
    assert_eq!(keys, vec!["CSE", "ECE", "ME", "CE"]);
    assert_eq!(ids(&groups[0]["records"]), vec![1, 4]);
}
