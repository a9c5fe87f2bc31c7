//! Closed enumerations shared by the page records.
//!
//! Every enumeration doubles as a lookup table: a value maps to the label,
//! icon name and color class the front-end shows for it. `catalogs.get`
//! serves all of them at once.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub trait Catalog: Sized + Copy + 'static {
    const NAME: &'static str;

    fn entries() -> Vec<CatalogEntry>;
}

macro_rules! closed_enum {
    (
        $(#[$attr:meta])*
        $name:ident as $catalog:literal {
            $($variant:ident => $value:literal, $label:literal, $icon:literal, $color:literal;)+
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Catalog order; ranks derive from it.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn icon(self) -> &'static str {
                match self {
                    $($name::$variant => $icon,)+
                }
            }

            pub fn color(self) -> &'static str {
                match self {
                    $($name::$variant => $color,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
            }

            pub fn rank(self) -> u8 {
                Self::ALL.iter().position(|v| *v == self).unwrap_or(0) as u8
            }
        }

        impl crate::domain::catalog::Catalog for $name {
            const NAME: &'static str = $catalog;

            fn entries() -> Vec<crate::domain::catalog::CatalogEntry> {
                Self::ALL
                    .iter()
                    .map(|v| crate::domain::catalog::CatalogEntry {
                        value: v.as_str(),
                        label: v.label(),
                        icon: v.icon(),
                        color: v.color(),
                    })
                    .collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    Priority as "priorities" {
        Low => "low", "Low", "arrow-down", "text-gray-600";
        Medium => "medium", "Medium", "minus", "text-blue-600";
        High => "high", "High", "arrow-up", "text-orange-600";
        Urgent => "urgent", "Urgent", "alert-triangle", "text-red-600";
    }
}

closed_enum! {
    AnnouncementCategory as "announcementCategories" {
        General => "general", "General", "megaphone", "bg-gray-100";
        Academic => "academic", "Academic", "book-open", "bg-blue-100";
        Exam => "exam", "Examination", "file-text", "bg-purple-100";
        Event => "event", "Event", "calendar", "bg-green-100";
        Holiday => "holiday", "Holiday", "sun", "bg-yellow-100";
        Placement => "placement", "Placement", "briefcase", "bg-indigo-100";
    }
}

closed_enum! {
    /// Engineering branches; courses use the same codes for their department.
    Branch as "branches" {
        Cse => "CSE", "Computer Science", "cpu", "bg-blue-100";
        Ece => "ECE", "Electronics & Communication", "radio", "bg-purple-100";
        Me => "ME", "Mechanical", "settings", "bg-orange-100";
        Ce => "CE", "Civil", "home", "bg-yellow-100";
        Ee => "EE", "Electrical", "zap", "bg-red-100";
        It => "IT", "Information Technology", "monitor", "bg-green-100";
    }
}

closed_enum! {
    EventCategory as "eventCategories" {
        Academic => "academic", "Academic", "book-open", "bg-blue-100";
        Cultural => "cultural", "Cultural", "music", "bg-pink-100";
        Sports => "sports", "Sports", "award", "bg-green-100";
        Workshop => "workshop", "Workshop", "tool", "bg-orange-100";
        Seminar => "seminar", "Seminar", "mic", "bg-purple-100";
    }
}

closed_enum! {
    EventStatus as "eventStatuses" {
        Upcoming => "upcoming", "Upcoming", "clock", "text-blue-600";
        Ongoing => "ongoing", "Ongoing", "play", "text-green-600";
        Completed => "completed", "Completed", "check-circle", "text-gray-600";
        Cancelled => "cancelled", "Cancelled", "x-circle", "text-red-600";
    }
}

closed_enum! {
    QueryCategory as "queryCategories" {
        Academic => "academic", "Academic", "book-open", "bg-blue-100";
        Fees => "fees", "Fees", "credit-card", "bg-green-100";
        Hostel => "hostel", "Hostel", "home", "bg-yellow-100";
        Examination => "examination", "Examination", "file-text", "bg-purple-100";
        Library => "library", "Library", "book", "bg-indigo-100";
        Other => "other", "Other", "help-circle", "bg-gray-100";
    }
}

closed_enum! {
    QueryStatus as "queryStatuses" {
        Open => "open", "Open", "inbox", "text-blue-600";
        InProgress => "in_progress", "In Progress", "loader", "text-yellow-600";
        Resolved => "resolved", "Resolved", "check-circle", "text-green-600";
        Closed => "closed", "Closed", "lock", "text-gray-600";
    }
}

closed_enum! {
    StudentStatus as "studentStatuses" {
        Active => "active", "Active", "user-check", "text-green-600";
        Inactive => "inactive", "Inactive", "user-x", "text-gray-600";
        Graduated => "graduated", "Graduated", "award", "text-blue-600";
        Suspended => "suspended", "Suspended", "slash", "text-red-600";
    }
}

closed_enum! {
    VerificationStatus as "verificationStatuses" {
        Pending => "pending", "Pending", "clock", "text-yellow-600";
        Verified => "verified", "Verified", "check-circle", "text-green-600";
        Rejected => "rejected", "Rejected", "x-circle", "text-red-600";
    }
}

closed_enum! {
    ApplicationType as "applicationTypes" {
        Admission => "admission", "Admission", "user-plus", "bg-blue-100";
        Bonafide => "bonafide", "Bonafide Certificate", "file-text", "bg-green-100";
        Transfer => "transfer", "Transfer Certificate", "repeat", "bg-orange-100";
        Scholarship => "scholarship", "Scholarship", "dollar-sign", "bg-purple-100";
    }
}

closed_enum! {
    DocumentType as "documentTypes" {
        Marksheet => "marksheet", "Marksheet", "file-text", "bg-blue-100";
        TransferCertificate => "transfer_certificate", "Transfer Certificate", "repeat", "bg-orange-100";
        IdentityProof => "identity_proof", "Identity Proof", "credit-card", "bg-green-100";
        CasteCertificate => "caste_certificate", "Caste Certificate", "file", "bg-yellow-100";
        IncomeCertificate => "income_certificate", "Income Certificate", "dollar-sign", "bg-purple-100";
        Photograph => "photograph", "Photograph", "image", "bg-pink-100";
    }
}

closed_enum! {
    DocumentStatus as "documentStatuses" {
        Pending => "pending", "Pending", "clock", "text-yellow-600";
        Approved => "approved", "Approved", "check-circle", "text-green-600";
        Rejected => "rejected", "Rejected", "x-circle", "text-red-600";
    }
}

closed_enum! {
    BookCategory as "bookCategories" {
        Textbook => "textbook", "Textbook", "book", "bg-blue-100";
        Reference => "reference", "Reference", "bookmark", "bg-green-100";
        Journal => "journal", "Journal", "file-text", "bg-purple-100";
        Fiction => "fiction", "Fiction", "feather", "bg-pink-100";
        Magazine => "magazine", "Magazine", "layers", "bg-yellow-100";
    }
}

closed_enum! {
    LoanStatus as "loanStatuses" {
        Issued => "issued", "Issued", "log-out", "text-blue-600";
        Returned => "returned", "Returned", "log-in", "text-green-600";
        Overdue => "overdue", "Overdue", "alert-circle", "text-red-600";
    }
}

fn insert<C: Catalog>(out: &mut Map<String, Value>) {
    let entries = serde_json::to_value(C::entries()).unwrap_or(Value::Array(Vec::new()));
    out.insert(C::NAME.to_string(), entries);
}

/// Every catalog keyed by its name.
pub fn all_catalogs() -> Value {
    let mut out = Map::new();
    insert::<Priority>(&mut out);
    insert::<AnnouncementCategory>(&mut out);
    insert::<Branch>(&mut out);
    insert::<EventCategory>(&mut out);
    insert::<EventStatus>(&mut out);
    insert::<QueryCategory>(&mut out);
    insert::<QueryStatus>(&mut out);
    insert::<StudentStatus>(&mut out);
    insert::<VerificationStatus>(&mut out);
    insert::<ApplicationType>(&mut out);
    insert::<DocumentType>(&mut out);
    insert::<DocumentStatus>(&mut out);
    insert::<BookCategory>(&mut out);
    insert::<LoanStatus>(&mut out);
    Value::Object(out)
}
