//! Per-role settings document.
//!
//! Stored under `settings.<role>` as `{"version": 2, "<section>": {...}}`.
//! Reads are forgiving: every stored field is applied on its own and a bad
//! one keeps its default. Writes are strict.

use crate::db;
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: i64 = 2;

/// Key-value store the settings document lives in.
pub trait SettingsPort {
    fn backend(&self) -> &'static str;
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    fn put(&mut self, key: &str, value: &Value) -> anyhow::Result<()>;
}

/// Used until a workspace is selected; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPort {
    values: HashMap<String, Value>,
}

impl SettingsPort for MemoryPort {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &Value) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

pub struct SqlitePort {
    conn: Connection,
}

impl SqlitePort {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: db::open_db(workspace)?,
        })
    }
}

impl SettingsPort for SqlitePort {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        db::settings_get_json(&self.conn, key)
    }

    fn put(&mut self, key: &str, value: &Value) -> anyhow::Result<()> {
        db::settings_set_json(&self.conn, key, value)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("{0}")]
    Invalid(String),
    #[error("failed to read settings: {0:#}")]
    Read(anyhow::Error),
    #[error("failed to write settings: {0:#}")]
    Write(anyhow::Error),
}

impl SettingsError {
    pub fn code(&self) -> &'static str {
        match self {
            SettingsError::UnknownRole(_) | SettingsError::UnknownSection(_) => "bad_params",
            SettingsError::Invalid(_) => "validation_failed",
            SettingsError::Read(_) => "db_query_failed",
            SettingsError::Write(_) => "db_update_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Clerk,
    Faculty,
    Student,
}

impl Role {
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "clerk" => Ok(Self::Clerk),
            "faculty" => Ok(Self::Faculty),
            "student" => Ok(Self::Student),
            _ => Err(SettingsError::UnknownRole(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Clerk => "clerk",
            Self::Faculty => "faculty",
            Self::Student => "student",
        }
    }

    fn key(self) -> String {
        format!("settings.{}", self.as_str())
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Clerk => "Office Clerk",
            Self::Faculty => "Faculty Member",
            Self::Student => "Student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Profile,
    Notifications,
    Appearance,
    Privacy,
    Security,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Profile,
        Section::Notifications,
        Section::Appearance,
        Section::Privacy,
        Section::Security,
    ];

    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s {
            "profile" => Ok(Self::Profile),
            "notifications" => Ok(Self::Notifications),
            "appearance" => Ok(Self::Appearance),
            "privacy" => Ok(Self::Privacy),
            "security" => Ok(Self::Security),
            _ => Err(SettingsError::UnknownSection(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Notifications => "notifications",
            Self::Appearance => "appearance",
            Self::Privacy => "privacy",
            Self::Security => "security",
        }
    }
}

fn default_section(section: Section, role: Role) -> Value {
    match section {
        Section::Profile => json!({
            "displayName": role.display_name(),
            "email": "",
            "phone": "",
            "department": ""
        }),
        Section::Notifications => json!({
            "email": true,
            "push": true,
            "sms": false,
            "digest": "daily"
        }),
        Section::Appearance => json!({
            "theme": "light",
            "language": "en",
            "fontSize": "medium",
            "compactMode": false
        }),
        Section::Privacy => json!({
            "profileVisibility": "campus",
            "showEmail": false,
            "showPhone": false
        }),
        Section::Security => json!({
            "twoFactor": false,
            "sessionTimeoutMinutes": 30,
            "loginAlerts": true
        }),
    }
}

pub fn defaults(role: Role) -> Value {
    let mut doc = Map::new();
    doc.insert("version".into(), json!(SCHEMA_VERSION));
    for section in Section::ALL {
        doc.insert(section.as_str().into(), default_section(section, role));
    }
    Value::Object(doc)
}

/// One incoming settings field, checked against the shape it must have.
struct Field<'a> {
    key: &'a str,
    value: &'a Value,
}

impl Field<'_> {
    fn flag(&self) -> Result<Value, String> {
        match self.value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(format!("{}: expected true or false", self.key)),
        }
    }

    fn minutes(&self, allowed: RangeInclusive<i64>) -> Result<Value, String> {
        match self.value.as_i64() {
            Some(n) if allowed.contains(&n) => Ok(Value::from(n)),
            Some(n) => Err(format!(
                "{}: {} is outside {}..={}",
                self.key,
                n,
                allowed.start(),
                allowed.end()
            )),
            None => Err(format!("{}: expected a whole number", self.key)),
        }
    }

    /// Trimmed text of at most `max_chars` characters.
    fn text(&self, max_chars: usize) -> Result<String, String> {
        let Some(raw) = self.value.as_str() else {
            return Err(format!("{}: expected text", self.key));
        };
        let text = raw.trim();
        match text.chars().count() {
            n if n > max_chars => Err(format!("{}: {} characters, at most {}", self.key, n, max_chars)),
            _ => Ok(text.to_string()),
        }
    }

    fn choice(&self, allowed: &[&str]) -> Result<Value, String> {
        let picked = self.text(16)?.to_ascii_lowercase();
        if allowed.contains(&picked.as_str()) {
            Ok(Value::String(picked))
        } else {
            Err(format!("{}: `{}` is not one of {}", self.key, picked, allowed.join("|")))
        }
    }
}

fn merge_section_patch(
    section: Section,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    // Validate into a copy so a failing patch leaves `current` alone.
    let mut next = current
        .as_object()
        .cloned()
        .ok_or_else(|| "settings section must be a JSON object".to_string())?;
    for (k, v) in patch {
        let f = Field { key: k, value: v };
        let value = match (section, k.as_str()) {
            (Section::Profile, "displayName") => {
                let name = f.text(80)?;
                if name.is_empty() {
                    return Err("displayName: must not be empty".into());
                }
                Value::String(name)
            }
            (Section::Profile, "email") => {
                let email = f.text(120)?;
                if !email.is_empty() && !email.contains('@') {
                    return Err("email: expected an address".into());
                }
                Value::String(email)
            }
            (Section::Profile, "phone") => Value::String(f.text(20)?),
            (Section::Profile, "department") => Value::String(f.text(80)?),
            (Section::Notifications, "email" | "push" | "sms") => f.flag()?,
            (Section::Notifications, "digest") => f.choice(&["off", "daily", "weekly"])?,
            (Section::Appearance, "theme") => f.choice(&["light", "dark", "system"])?,
            (Section::Appearance, "language") => f.choice(&["en", "hi", "ta", "te"])?,
            (Section::Appearance, "fontSize") => f.choice(&["small", "medium", "large"])?,
            (Section::Appearance, "compactMode") => f.flag()?,
            (Section::Privacy, "profileVisibility") => {
                f.choice(&["public", "campus", "private"])?
            }
            (Section::Privacy, "showEmail" | "showPhone") => f.flag()?,
            (Section::Security, "twoFactor" | "loginAlerts") => f.flag()?,
            (Section::Security, "sessionTimeoutMinutes") => f.minutes(5..=240)?,
            _ => return Err(format!("unknown {} field: {}", section.as_str(), k)),
        };
        next.insert(k.clone(), value);
    }
    *current = Value::Object(next);
    Ok(())
}

/// Version 1 was a flat object written straight from the page state.
const V1_FIELDS: &[(&str, Section, &str)] = &[
    ("name", Section::Profile, "displayName"),
    ("displayName", Section::Profile, "displayName"),
    ("email", Section::Profile, "email"),
    ("phone", Section::Profile, "phone"),
    ("department", Section::Profile, "department"),
    ("emailNotifications", Section::Notifications, "email"),
    ("pushNotifications", Section::Notifications, "push"),
    ("smsNotifications", Section::Notifications, "sms"),
    ("theme", Section::Appearance, "theme"),
    ("language", Section::Appearance, "language"),
    ("fontSize", Section::Appearance, "fontSize"),
    ("profileVisibility", Section::Privacy, "profileVisibility"),
    ("twoFactorAuth", Section::Security, "twoFactor"),
    ("sessionTimeout", Section::Security, "sessionTimeoutMinutes"),
];

fn migrate_v1(flat: &Map<String, Value>) -> Value {
    let mut sections: Map<String, Value> = Map::new();
    for (old, section, new) in V1_FIELDS {
        let Some(v) = flat.get(*old) else {
            continue;
        };
        if let Value::Object(obj) = sections
            .entry(section.as_str())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            obj.insert((*new).to_string(), v.clone());
        }
    }
    sections.insert("version".into(), json!(SCHEMA_VERSION));
    Value::Object(sections)
}

/// Upgrades a stored document to the current layout. `None` when it
/// cannot be read at all.
fn upgrade(saved: Value) -> Option<Map<String, Value>> {
    let Value::Object(obj) = saved else {
        return None;
    };
    match obj.get("version").and_then(|v| v.as_i64()) {
        Some(SCHEMA_VERSION) => Some(obj),
        Some(1) | None => {
            debug!("migrating settings from version 1");
            match migrate_v1(&obj) {
                Value::Object(m) => Some(m),
                _ => None,
            }
        }
        Some(other) => {
            warn!(version = other, "unsupported settings version, using defaults");
            None
        }
    }
}

fn section_mut(doc: &mut Value, section: Section) -> Result<&mut Value, SettingsError> {
    doc.get_mut(section.as_str())
        .ok_or_else(|| SettingsError::Invalid(format!("missing section {}", section.as_str())))
}

pub fn load(port: &dyn SettingsPort, role: Role) -> Result<Value, SettingsError> {
    let mut doc = defaults(role);
    let saved = port.get(&role.key()).map_err(SettingsError::Read)?;
    let Some(saved) = saved.and_then(upgrade) else {
        return Ok(doc);
    };
    for section in Section::ALL {
        let Some(stored) = saved.get(section.as_str()).and_then(|v| v.as_object()) else {
            continue;
        };
        let current = section_mut(&mut doc, section)?;
        for (k, v) in stored {
            let mut single = Map::new();
            single.insert(k.clone(), v.clone());
            if let Err(msg) = merge_section_patch(section, current, &single) {
                debug!(role = role.as_str(), section = section.as_str(), %msg, "stored setting ignored");
            }
        }
    }
    Ok(doc)
}

pub fn update(
    port: &mut dyn SettingsPort,
    role: Role,
    section: Section,
    patch: &Map<String, Value>,
) -> Result<Value, SettingsError> {
    let mut doc = load(port, role)?;
    merge_section_patch(section, section_mut(&mut doc, section)?, patch)
        .map_err(SettingsError::Invalid)?;
    port.put(&role.key(), &doc).map_err(SettingsError::Write)?;
    info!(
        role = role.as_str(),
        section = section.as_str(),
        backend = port.backend(),
        "settings updated"
    );
    Ok(doc)
}

pub fn reset(port: &mut dyn SettingsPort, role: Role) -> Result<Value, SettingsError> {
    let doc = defaults(role);
    port.put(&role.key(), &doc).map_err(SettingsError::Write)?;
    info!(role = role.as_str(), backend = port.backend(), "settings reset");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn missing_document_loads_defaults() {
        let port = MemoryPort::default();
        let doc = load(&port, Role::Faculty).expect("load");
        assert_eq!(doc, defaults(Role::Faculty));
        assert_eq!(doc["profile"]["displayName"], "Faculty Member");
        assert_eq!(doc["version"], SCHEMA_VERSION);
    }

    #[test]
    fn update_is_strict_and_atomic() {
        let mut port = MemoryPort::default();
        let err = update(
            &mut port,
            Role::Admin,
            Section::Appearance,
            &obj(json!({ "theme": "dark", "fontSize": "huge" })),
        )
        .unwrap_err();
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(load(&port, Role::Admin).expect("load")["appearance"]["theme"], "light");

        let err = update(
            &mut port,
            Role::Admin,
            Section::Security,
            &obj(json!({ "pin": "1234" })),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown security field"));

        let doc = update(
            &mut port,
            Role::Admin,
            Section::Appearance,
            &obj(json!({ "theme": "DARK" })),
        )
        .expect("update");
        assert_eq!(doc["appearance"]["theme"], "dark");
        assert_eq!(load(&port, Role::Admin).expect("load"), doc);
        assert_eq!(load(&port, Role::Clerk).expect("load")["appearance"]["theme"], "light");
    }

    #[test]
    fn version_one_payload_is_migrated() {
        let mut port = MemoryPort::default();
        port.put(
            "settings.student",
            &json!({
                "name": "Aarav Sharma",
                "theme": "dark",
                "language": "hi",
                "emailNotifications": false,
                "twoFactorAuth": true,
                "sessionTimeout": 60
            }),
        )
        .expect("put");
        let doc = load(&port, Role::Student).expect("load");
        assert_eq!(doc["version"], 2);
        assert_eq!(doc["profile"]["displayName"], "Aarav Sharma");
        assert_eq!(doc["appearance"]["theme"], "dark");
        assert_eq!(doc["appearance"]["language"], "hi");
        assert_eq!(doc["notifications"]["email"], false);
        assert_eq!(doc["notifications"]["push"], true);
        assert_eq!(doc["security"]["twoFactor"], true);
        assert_eq!(doc["security"]["sessionTimeoutMinutes"], 60);
    }

    #[test]
    fn invalid_stored_fields_fall_back_individually() {
        let mut port = MemoryPort::default();
        port.put(
            "settings.clerk",
            &json!({
                "version": 2,
                "appearance": { "theme": "neon", "language": "ta" },
                "security": { "sessionTimeoutMinutes": 100000 },
                "privacy": "garbage"
            }),
        )
        .expect("put");
        let doc = load(&port, Role::Clerk).expect("load");
        assert_eq!(doc["appearance"]["theme"], "light");
        assert_eq!(doc["appearance"]["language"], "ta");
        assert_eq!(doc["security"]["sessionTimeoutMinutes"], 30);
        assert_eq!(doc["privacy"], defaults(Role::Clerk)["privacy"]);
    }

    #[test]
    fn future_versions_are_not_trusted() {
        let mut port = MemoryPort::default();
        port.put(
            "settings.admin",
            &json!({ "version": 9, "appearance": { "theme": "dark" } }),
        )
        .expect("put");
        assert_eq!(load(&port, Role::Admin).expect("load"), defaults(Role::Admin));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut port = MemoryPort::default();
        update(
            &mut port,
            Role::Faculty,
            Section::Privacy,
            &obj(json!({ "showEmail": true })),
        )
        .expect("update");
        let doc = reset(&mut port, Role::Faculty).expect("reset");
        assert_eq!(doc, defaults(Role::Faculty));
        assert_eq!(load(&port, Role::Faculty).expect("load"), doc);
    }

    #[test]
    fn sqlite_port_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut port = SqlitePort::open(dir.path()).expect("open");
            update(
                &mut port,
                Role::Admin,
                Section::Notifications,
                &obj(json!({ "digest": "weekly" })),
            )
            .expect("update");
        }
        let port = SqlitePort::open(dir.path()).expect("reopen");
        assert_eq!(
            load(&port, Role::Admin).expect("load")["notifications"]["digest"],
            "weekly"
        );
    }

    #[test]
    fn roles_and_sections_parse_strictly() {
        assert_eq!(Role::parse(" Clerk ").expect("role"), Role::Clerk);
        assert_eq!(Role::parse("dean").unwrap_err().code(), "bad_params");
        assert!(Section::parse("Profile").is_err());
    }
}
