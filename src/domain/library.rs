//! Library catalogue and circulation.
//!
//! Books are edited through the regular form flow. Loans are only created
//! by issuing a book, and returning one puts the copy back on the shelf.

use super::catalog::{BookCategory, LoanStatus};
use super::record::{parse_status, Record, RecordError, RecordId, RecordMeta, SortValue};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_LOAN_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: BookCategory,
    pub total_copies: u32,
    #[serde(default = "copies_unknown")]
    pub available_copies: u32,
    #[serde(default)]
    pub shelf: String,
}

/// Stands in for an absent `availableCopies`; loading clamps it to the total.
fn copies_unknown() -> u32 {
    u32::MAX
}

impl Book {
    pub fn take_copy(&mut self) -> bool {
        if self.available_copies == 0 {
            return false;
        }
        self.available_copies -= 1;
        true
    }

    pub fn put_back_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1).min(self.total_copies);
    }
}

impl Record for Book {
    const KIND: &'static str = "library";
    const REQUIRED: &'static [&'static str] = &["title", "author", "isbn"];
    const SYSTEM_FIELDS: &'static [&'static str] = &["availableCopies"];
    const FACETS: &'static [&'static str] = &["category", "availability"];
    const SORT_KEYS: &'static [&'static str] = &["title", "author", "available"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        Self {
            meta: RecordMeta::draft(),
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            category: BookCategory::Textbook,
            total_copies: 1,
            available_copies: 0,
            shelf: String::new(),
        }
    }

    fn seed() -> Vec<Self> {
        [
            (1, "Introduction to Algorithms", "Cormen, Leiserson, Rivest, Stein", "9780262046305", BookCategory::Textbook, 5, 3, "A-12"),
            (2, "Engineering Thermodynamics", "P. K. Nag", "9789352606429", BookCategory::Textbook, 4, 4, "C-03"),
            (3, "Digital Design", "M. Morris Mano", "9780134549897", BookCategory::Reference, 3, 0, "B-07"),
            (4, "IEEE Transactions on Computers", "IEEE", "0018-9340", BookCategory::Journal, 2, 2, "J-01"),
            (5, "Wings of Fire", "A. P. J. Abdul Kalam", "9788173711466", BookCategory::Fiction, 6, 5, "F-02"),
        ]
        .into_iter()
        .map(|(id, title, author, isbn, category, total, available, shelf)| Self {
            meta: RecordMeta::seeded(id, "2023-07-01T08:00:00Z"),
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            category,
            total_copies: total,
            available_copies: available,
            shelf: shelf.to_string(),
        })
        .collect()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.author.as_str(), self.isbn.as_str()]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "category" => Some(self.category.as_str().to_string()),
            "availability" => Some(
                if self.available_copies > 0 {
                    "available"
                } else {
                    "unavailable"
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "title" => Some(SortValue::text(&self.title)),
            "author" => Some(SortValue::text(&self.author)),
            "available" => Some(SortValue::Count(self.available_copies as u64)),
            _ => None,
        }
    }

    /// Copies on loan stay on loan when the total is edited.
    fn preserve_system_fields(&mut self, original: &Self) {
        let on_loan = original
            .total_copies
            .saturating_sub(original.available_copies);
        self.available_copies = self.total_copies.saturating_sub(on_loan);
    }

    fn on_create(&mut self) {
        self.available_copies = self.total_copies;
    }

    fn on_load(&mut self) {
        self.available_copies = self.available_copies.min(self.total_copies);
    }

    fn stats(records: &[Self]) -> Value {
        let total_copies: u64 = records.iter().map(|b| b.total_copies as u64).sum();
        let available: u64 = records.iter().map(|b| b.available_copies as u64).sum();
        json!({
            "titles": records.len(),
            "totalCopies": total_copies,
            "availableCopies": available,
            "onLoan": total_copies.saturating_sub(available),
            "unavailableTitles": records.iter().filter(|b| b.available_copies == 0).count(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub book_id: RecordId,
    #[serde(default)]
    pub book_title: String,
    pub student_name: String,
    pub roll_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn issue(book: &Book, student_name: &str, roll_number: &str, issued: NaiveDate, days: i64) -> Self {
        Self {
            meta: RecordMeta::draft(),
            book_id: book.meta.id,
            book_title: book.title.clone(),
            student_name: student_name.trim().to_string(),
            roll_number: roll_number.trim().to_ascii_uppercase(),
            issue_date: issued,
            due_date: issued + Duration::days(days),
            returned_at: None,
            status: LoanStatus::Issued,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status != LoanStatus::Returned
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.is_open() && self.due_date < as_of
    }

    pub fn mark_returned(&mut self) {
        self.status = LoanStatus::Returned;
        self.returned_at = Some(Utc::now());
    }

    /// Moves the loan to `issued` or `overdue`, dropping any return stamp.
    pub fn set_open_status(&mut self, status: LoanStatus) {
        debug_assert!(status != LoanStatus::Returned);
        self.status = status;
        self.returned_at = None;
    }
}

impl Record for Loan {
    const KIND: &'static str = "loans";
    const REQUIRED: &'static [&'static str] = &["studentName", "rollNumber"];
    const FACETS: &'static [&'static str] = &["status"];
    const SORT_KEYS: &'static [&'static str] = &["dueDate", "name"];
    const FORM_ENABLED: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn template() -> Self {
        let today = Utc::now().date_naive();
        Self {
            meta: RecordMeta::draft(),
            book_id: RecordId(0),
            book_title: String::new(),
            student_name: String::new(),
            roll_number: String::new(),
            issue_date: today,
            due_date: today + Duration::days(DEFAULT_LOAN_DAYS),
            returned_at: None,
            status: LoanStatus::Issued,
        }
    }

    fn seed() -> Vec<Self> {
        let books = Book::seed();
        let date = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN);
        let mut loans = vec![
            Loan::issue(&books[0], "Aarav Sharma", "21CSE045", date("2024-01-10"), DEFAULT_LOAN_DAYS),
            Loan::issue(&books[0], "Sneha Reddy", "22CSE008", date("2024-01-15"), DEFAULT_LOAN_DAYS),
            Loan::issue(&books[2], "Priya Nair", "22ECE012", date("2024-01-02"), DEFAULT_LOAN_DAYS),
            Loan::issue(&books[2], "Vivek Kumar", "22ECE044", date("2024-01-05"), DEFAULT_LOAN_DAYS),
            Loan::issue(&books[2], "Ananya Das", "24CSE101", date("2024-01-20"), DEFAULT_LOAN_DAYS),
            Loan::issue(&books[4], "Rohan Verma", "21ME030", date("2024-01-12"), DEFAULT_LOAN_DAYS),
        ];
        for (i, loan) in loans.iter_mut().enumerate() {
            loan.meta = RecordMeta::seeded(i as u64 + 1, "2024-01-20T12:00:00Z");
        }
        loans
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.book_title.as_str(),
            self.student_name.as_str(),
            self.roll_number.as_str(),
        ]
    }

    fn facet(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "dueDate" => Some(SortValue::date(Some(self.due_date))),
            "name" => Some(SortValue::text(&self.student_name)),
            _ => None,
        }
    }

    fn set_status(&mut self, status: &str, _remarks: Option<&str>) -> Result<(), RecordError> {
        match parse_status(Self::KIND, status, LoanStatus::parse)? {
            LoanStatus::Returned if self.is_open() => self.mark_returned(),
            LoanStatus::Returned => {}
            open => self.set_open_status(open),
        }
        Ok(())
    }

    fn stats(records: &[Self]) -> Value {
        let count = |s: LoanStatus| records.iter().filter(|l| l.status == s).count();
        json!({
            "total": records.len(),
            "issued": count(LoanStatus::Issued),
            "returned": count(LoanStatus::Returned),
            "overdue": count(LoanStatus::Overdue),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_loans_match_copies_on_loan() {
        let books = Book::seed();
        let loans = Loan::seed();
        for book in &books {
            let open = loans
                .iter()
                .filter(|l| l.book_id == book.meta.id && l.is_open())
                .count() as u32;
            assert_eq!(book.total_copies - book.available_copies, open, "{}", book.title);
        }
    }

    #[test]
    fn editing_total_keeps_copies_on_loan() {
        let original = Book::seed().remove(0);
        let mut edited = original.clone();
        edited.total_copies = 8;
        edited.available_copies = 0;
        edited.preserve_system_fields(&original);
        assert_eq!(edited.available_copies, 6);

        edited.total_copies = 1;
        edited.preserve_system_fields(&original);
        assert_eq!(edited.available_copies, 0);
    }

    #[test]
    fn copies_never_exceed_total() {
        let mut b = Book::seed().remove(1);
        assert_eq!(b.available_copies, b.total_copies);
        b.put_back_copy();
        assert_eq!(b.available_copies, b.total_copies);
        assert!(b.take_copy());
        assert_eq!(b.available_copies, b.total_copies - 1);
    }

    #[test]
    fn loaded_books_never_show_more_copies_than_exist() {
        let mut missing: Book = serde_json::from_value(json!({
            "id": 9, "createdAt": "2024-01-01T00:00:00Z",
            "title": "Signals and Systems", "author": "Oppenheim", "isbn": "9780138147570",
            "category": "textbook", "totalCopies": 3
        }))
        .expect("book");
        missing.on_load();
        assert_eq!(missing.available_copies, 3);

        let mut inflated = Book::seed().remove(0);
        inflated.available_copies = 40;
        inflated.on_load();
        assert_eq!(inflated.available_copies, inflated.total_copies);

        let mut full = Book::seed().remove(1);
        full.total_copies = u32::MAX;
        full.available_copies = u32::MAX;
        full.put_back_copy();
        assert_eq!(full.available_copies, u32::MAX);
    }

    #[test]
    fn overdue_only_for_open_loans() {
        let book = Book::seed().remove(0);
        let issued = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let mut loan = Loan::issue(&book, "A", "x1", issued, 14);
        assert_eq!(loan.roll_number, "X1");
        let later = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
        assert!(loan.is_overdue(later));
        loan.mark_returned();
        assert!(!loan.is_overdue(later));
    }
}
