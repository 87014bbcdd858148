use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::capabilities::UsersEndpoint;
use crate::{get_current_time_ms, SyncError, DEFAULT_NOTIFICATION_DURATION_MS};

/// Identifier assigned by the remote resource. The server may hand out either
/// numbers or strings; both round-trip unchanged. Numbers outside `i64`
/// (large unsigned values, fractions) are kept as the JSON number they came in as.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "age_from_wire", serialize_with = "age_to_wire")]
    pub age: String,
}

impl UserRecord {
    /// Age as used for aggregates. Blank or non-numeric text counts as zero.
    #[must_use]
    pub fn age_value(&self) -> f64 {
        parse_age(&self.age).unwrap_or(0.0)
    }
}

fn parse_age(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireAge {
    Int(i64),
    Float(f64),
    Text(String),
}

fn age_from_wire<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<WireAge>::deserialize(deserializer)? {
        Some(WireAge::Int(n)) => n.to_string(),
        Some(WireAge::Float(n)) => n.to_string(),
        Some(WireAge::Text(s)) => s,
        None => String::new(),
    })
}

// Numeric-looking ages go out as JSON numbers; anything else is sent verbatim.
#[allow(clippy::ptr_arg)]
fn age_to_wire<S>(age: &String, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let trimmed = age.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        serializer.serialize_i64(n)
    } else if let Some(n) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
        serializer.serialize_f64(n)
    } else {
        serializer.serialize_str(age)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    Creating,
    Editing,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Email,
    Age,
}

/// The record being composed. Bound to an existing user while editing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct FormState {
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub age: String,
}

impl FormState {
    #[must_use]
    pub fn mode(&self) -> FormMode {
        if self.id.is_some() {
            FormMode::Editing
        } else {
            FormMode::Creating
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Age => self.age = value,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("age", &self.age),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::MissingFields(missing.join(", ")))
        }
    }

    /// Wire body for create/update. No id is sent while creating.
    #[must_use]
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age.clone(),
        }
    }
}

impl From<UserRecord> for FormState {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            age: record.age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationState {
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
    pub shown_at_ms: u64,
    pub duration_ms: u64,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            message: String::new(),
            severity: Severity::default(),
            visible: false,
            shown_at_ms: 0,
            duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
        }
    }
}

impl NotificationState {
    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now_ms: u64) {
        self.message = message.into();
        self.severity = severity;
        self.visible = true;
        self.shown_at_ms = now_ms;
    }

    // The message and severity stay around so a closing animation can still read them.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.visible && now_ms.saturating_sub(self.shown_at_ms) >= self.duration_ms
    }
}

#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Landing,
    Dashboard,
}

#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_users: usize,
    pub average_age: i64,
}

impl Stats {
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn from_users(users: &[UserRecord]) -> Self {
        if users.is_empty() {
            return Self::default();
        }
        let sum: f64 = users.iter().map(UserRecord::age_value).sum();
        let mean = sum / users.len() as f64;
        Self {
            total_users: users.len(),
            // Halves round up, towards positive infinity.
            average_age: (mean + 0.5).floor() as i64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub users: Vec<UserRecord>,
    pub form: FormState,
    pub notification: NotificationState,
    pub search_term: String,

    pub route: Route,
    pub theme: Theme,

    pub endpoint: UsersEndpoint,
    /// Generation of the most recently issued list request.
    pub list_generation: u64,
    pub is_loading: bool,

    pub view_timestamp_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            form: FormState::default(),
            notification: NotificationState::default(),
            search_term: String::new(),
            route: Route::default(),
            theme: Theme::default(),
            endpoint: UsersEndpoint::default(),
            list_generation: 0,
            is_loading: false,
            view_timestamp_ms: get_current_time_ms(),
        }
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notification
            .show(message, severity, self.view_timestamp_ms);
    }

    pub fn notify_error(&mut self, error: &SyncError) {
        self.notify(error.user_facing_message(), Severity::Error);
    }

    /// Starts a new list request and returns its generation.
    pub fn next_list_generation(&mut self) -> u64 {
        self.list_generation += 1;
        self.is_loading = true;
        self.list_generation
    }

    #[must_use]
    pub fn is_stale_listing(&self, generation: u64) -> bool {
        generation < self.list_generation
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats::from_users(&self.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn user(id: i64, name: &str, email: &str, age: &str) -> UserRecord {
        UserRecord {
            id: Some(UserId::Numeric(id)),
            name: name.into(),
            email: email.into(),
            age: age.into(),
        }
    }

    #[test]
    fn record_accepts_numeric_and_text_wire_values() {
        let users: Vec<UserRecord> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Ana", "email": "ana@x.com", "age": 30},
                {"id": "b2", "name": "Bo", "email": "bo@x.com", "age": "40"},
                {"id": 3, "name": "Cy", "email": "cy@x.com", "age": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(users[0].id, Some(UserId::Numeric(1)));
        assert_eq!(users[0].age, "30");
        assert_eq!(users[1].id, Some(UserId::Text("b2".into())));
        assert_eq!(users[1].age, "40");
        assert_eq!(users[2].age, "");
    }

    #[test]
    fn record_keeps_ids_outside_i64() {
        let users: Vec<UserRecord> = serde_json::from_str(
            r#"[
                {"id": 1.0, "name": "Ana", "email": "ana@x.com", "age": 30},
                {"id": 18446744073709551615, "name": "Bo", "email": "bo@x.com", "age": 40}
            ]"#,
        )
        .unwrap();

        assert_matches!(users[0].id, Some(UserId::Number(_)));
        assert_matches!(users[1].id, Some(UserId::Number(_)));
        assert_eq!(
            users[1].id.as_ref().map(ToString::to_string).as_deref(),
            Some("18446744073709551615")
        );

        let json = serde_json::to_value(&users[1]).unwrap();
        assert_eq!(json["id"], serde_json::json!(u64::MAX));
    }

    #[test]
    fn record_serializes_numeric_age_as_number() {
        let json = serde_json::to_value(user(1, "Ana", "ana@x.com", "30")).unwrap();
        assert_eq!(json["age"], serde_json::json!(30));
        assert_eq!(json["id"], serde_json::json!(1));

        let json = serde_json::to_value(user(1, "Ana", "ana@x.com", "thirty")).unwrap();
        assert_eq!(json["age"], serde_json::json!("thirty"));
    }

    #[test]
    fn create_body_has_no_id() {
        let form = FormState {
            id: None,
            name: "Bo".into(),
            email: "bo@x.com".into(),
            age: "40".into(),
        };
        let json = serde_json::to_value(form.to_record()).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "Bo");
        assert_eq!(json["age"], 40);
    }

    #[test]
    fn form_mode_follows_id() {
        let mut form = FormState::default();
        assert_eq!(form.mode(), FormMode::Creating);

        form = FormState::from(user(5, "Ana", "ana@x.com", "30"));
        assert_eq!(form.mode(), FormMode::Editing);

        form.reset();
        assert_eq!(form, FormState::default());
        assert_eq!(form.mode(), FormMode::Creating);
    }

    #[test]
    fn form_set_updates_one_field() {
        let mut form = FormState::default();
        form.set(FormField::Name, "Ana".into());
        form.set(FormField::Age, "31".into());
        assert_eq!(form.name, "Ana");
        assert_eq!(form.email, "");
        assert_eq!(form.age, "31");
    }

    #[test]
    fn form_validate_reports_blank_fields() {
        let mut form = FormState::default();
        form.name = "Ana".into();
        form.email = "   ".into();

        match form.validate() {
            Err(SyncError::MissingFields(fields)) => assert_eq!(fields, "email, age"),
            other => panic!("unexpected: {other:?}"),
        }

        form.email = "ana@x.com".into();
        form.age = "30".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn stats_empty_collection() {
        assert_eq!(
            Stats::from_users(&[]),
            Stats {
                total_users: 0,
                average_age: 0
            }
        );
    }

    #[test]
    fn stats_rounds_mean() {
        let users = vec![
            user(1, "a", "a@x", "30"),
            user(2, "b", "b@x", "31"),
        ];
        assert_eq!(Stats::from_users(&users).average_age, 31);

        let users = vec![
            user(1, "a", "a@x", "30"),
            user(2, "b", "b@x", "30"),
            user(3, "c", "c@x", "31"),
        ];
        let stats = Stats::from_users(&users);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.average_age, 30);
    }

    #[test]
    fn stats_treats_unparseable_age_as_zero() {
        let users = vec![user(1, "a", "a@x", "40"), user(2, "b", "b@x", "n/a")];
        assert_eq!(Stats::from_users(&users).average_age, 20);
    }

    fn arb_ages() -> impl Strategy<Value = Vec<(String, u64)>> {
        prop::collection::vec(
            prop_oneof![
                4 => (0u64..=150).prop_map(|a| (a.to_string(), a)),
                1 => Just(("n/a".to_string(), 0)),
                1 => Just((String::new(), 0)),
            ],
            0..32,
        )
    }

    proptest! {
        #[test]
        fn stats_match_count_and_rounded_mean(ages in arb_ages()) {
            let users: Vec<UserRecord> = ages
                .iter()
                .enumerate()
                .map(|(i, (age, _))| user(i as i64, "u", "u@x", age))
                .collect();
            let stats = Stats::from_users(&users);

            prop_assert_eq!(stats.total_users, users.len());
            let n = ages.len() as u64;
            let expected = if n == 0 {
                0
            } else {
                let sum: u64 = ages.iter().map(|(_, v)| v).sum();
                // floor(sum / n + 1/2) in integers
                ((2 * sum + n) / (2 * n)) as i64
            };
            prop_assert_eq!(stats.average_age, expected);
        }
    }

    #[test]
    fn notification_expiry() {
        let mut notification = NotificationState::default();
        assert!(!notification.is_expired(u64::MAX));

        notification.show("saved", Severity::Success, 1_000);
        assert!(notification.visible);
        assert!(!notification.is_expired(1_000 + DEFAULT_NOTIFICATION_DURATION_MS - 1));
        assert!(notification.is_expired(1_000 + DEFAULT_NOTIFICATION_DURATION_MS));

        notification.dismiss();
        assert!(!notification.visible);
        assert_eq!(notification.message, "saved");
    }

    #[test]
    fn list_generations_detect_stale_responses() {
        let mut model = Model::default();
        let first = model.next_list_generation();
        let second = model.next_list_generation();
        assert!(model.is_loading);
        assert!(model.is_stale_listing(first));
        assert!(!model.is_stale_listing(second));
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
