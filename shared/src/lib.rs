#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;
pub mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::ClientConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::{
    FormField, FormMode, FormState, Model, NotificationState, Route, Severity, Stats, Theme,
    UserId, UserRecord,
};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const USERS_PATH: &str = "/api/users";
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 2_500;
pub const MIN_NOTIFICATION_DURATION_MS: u64 = 500;
pub const MAX_NOTIFICATION_DURATION_MS: u64 = 60_000;

pub const MSG_USER_ADDED: &str = "User added successfully!";
pub const MSG_USER_UPDATED: &str = "User updated successfully!";
pub const MSG_USER_DELETED: &str = "User deleted successfully!";

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Failures surfaced to the user. The detail strings are for logs only;
/// the dashboard shows [`SyncError::user_facing_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("save failed: {0}")]
    SaveFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("list failed: {0}")]
    ListFailed(String),
    #[error("missing required fields: {0}")]
    MissingFields(String),
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    #[must_use]
    pub fn user_facing_message(&self) -> &'static str {
        match self {
            Self::SaveFailed(_) | Self::Encode(_) => "Error saving user",
            Self::DeleteFailed(_) => "Error deleting user",
            Self::ListFailed(_) => "Error loading users",
            Self::MissingFields(_) => "Please fill in all fields",
            Self::InvalidConfig(_) => "Invalid configuration",
        }
    }
}

impl From<capabilities::HttpError> for SyncError {
    fn from(e: capabilities::HttpError) -> Self {
        Self::Encode(e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRow {
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub age: String,
}

impl From<&UserRecord> for UserRow {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            age: u.age.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormView {
    pub mode: FormMode,
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub age: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationView {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub route: Route,
    pub theme: Theme,
    pub users: Vec<UserRow>,
    pub search_term: String,
    pub stats: Stats,
    pub form: FormView,
    pub notification: Option<NotificationView>,
    pub is_loading: bool,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::{
        FormView, NotificationView, SyncError, UserRow, ViewModel, MSG_USER_ADDED,
        MSG_USER_DELETED, MSG_USER_UPDATED,
    };
    use crate::capabilities::{Capabilities, HttpMethod, ResourceRequest};
    use crate::event::{Event, ListResult, MutationResult};
    use crate::model::{FormMode, Model, Severity, UserId, UserRecord};
    use crate::search::filter_users;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn send_list_request(model: &mut Model, caps: &Capabilities) {
            let generation = model.next_list_generation();
            let request = ResourceRequest::list(&model.endpoint);
            debug!(generation, url = request.url(), "listing users");

            caps.http
                .get(request.url())
                .expect_json::<Vec<UserRecord>>()
                .send(move |result| Event::UsersListed {
                    generation,
                    result: Box::new(result),
                });
        }

        pub(crate) fn build_save_request(model: &Model) -> Result<ResourceRequest, SyncError> {
            model.form.validate()?;
            let payload = model.form.to_record();
            let request = match &model.form.id {
                Some(id) => ResourceRequest::update(&model.endpoint, id, &payload)?,
                None => ResourceRequest::create(&model.endpoint, &payload)?,
            };
            Ok(request)
        }

        fn send_save_request(model: &mut Model, caps: &Capabilities) {
            let request = match Self::build_save_request(model) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "submit refused");
                    model.notify_error(&e);
                    return;
                }
            };

            let mode = model.form.mode();
            debug!(method = %request.method(), url = request.url(), "saving user");

            let builder = match request.method() {
                HttpMethod::Post => caps.http.post(request.url()),
                HttpMethod::Put => caps.http.put(request.url()),
                method @ (HttpMethod::Get | HttpMethod::Delete) => {
                    let e = SyncError::Encode(format!("{method} cannot save a user"));
                    warn!(error = %e, "submit refused");
                    model.notify_error(&e);
                    return;
                }
            };
            builder
                .header("Content-Type", "application/json")
                .body(request.into_body())
                .send(move |result| Event::UserSaved {
                    mode,
                    result: Box::new(result),
                });
        }

        fn send_delete_request(id: UserId, model: &mut Model, caps: &Capabilities) {
            let request = match ResourceRequest::delete(&model.endpoint, &id) {
                Ok(request) => request,
                Err(e) => {
                    let e = SyncError::DeleteFailed(e.to_string());
                    warn!(%id, error = %e, "delete refused");
                    model.notify_error(&e);
                    return;
                }
            };
            debug!(%id, url = request.url(), "deleting user");

            caps.http
                .delete(request.url())
                .send(move |result| Event::UserDeleted {
                    id,
                    result: Box::new(result),
                });
        }

        fn check_mutation(result: MutationResult) -> Result<(), String> {
            match result {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => Err(format!("HTTP {}", response.status())),
                Err(e) => Err(e.to_string()),
            }
        }

        fn handle_list_response(
            generation: u64,
            result: ListResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            if model.is_stale_listing(generation) {
                debug!(
                    generation,
                    latest = model.list_generation,
                    "discarding superseded user listing"
                );
                return;
            }
            model.is_loading = false;

            let listed = match result {
                Ok(mut response) if response.status().is_success() => response
                    .take_body()
                    .ok_or_else(|| SyncError::ListFailed("empty response body".into())),
                Ok(response) => Err(SyncError::ListFailed(format!("HTTP {}", response.status()))),
                Err(e) => Err(SyncError::ListFailed(e.to_string())),
            };

            match listed {
                Ok(users) => {
                    info!(generation, count = users.len(), "users listed");
                    model.users = users;
                }
                Err(e) => {
                    warn!(generation, error = %e, "user listing failed");
                    model.notify_error(&e);
                }
            }
            caps.render.render();
        }

        fn handle_save_response(
            mode: FormMode,
            result: MutationResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::check_mutation(result) {
                Ok(()) => {
                    info!(?mode, "user saved");
                    let message = match mode {
                        FormMode::Creating => MSG_USER_ADDED,
                        FormMode::Editing => MSG_USER_UPDATED,
                    };
                    model.notify(message, Severity::Success);
                    model.form.reset();
                    Self::send_list_request(model, caps);
                }
                Err(detail) => {
                    let e = SyncError::SaveFailed(detail);
                    warn!(?mode, error = %e, "user save failed");
                    model.notify_error(&e);
                }
            }
            caps.render.render();
        }

        fn handle_delete_response(
            id: &UserId,
            result: MutationResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::check_mutation(result) {
                Ok(()) => {
                    info!(%id, "user deleted");
                    Self::send_list_request(model, caps);
                    model.notify(MSG_USER_DELETED, Severity::Info);
                }
                Err(detail) => {
                    let e = SyncError::DeleteFailed(detail);
                    warn!(%id, error = %e, "user delete failed");
                    model.notify_error(&e);
                }
            }
            caps.render.render();
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();

            if event.is_user_initiated() {
                debug!(event = event.name(), "user action");
            }

            match event {
                Event::Noop => {}

                Event::AppStarted => {
                    Self::send_list_request(model, caps);
                    caps.render.render();
                }

                Event::Configure(config) => {
                    match config.validate() {
                        Ok(endpoint) => {
                            info!(base = endpoint.base(), "client configured");
                            model.endpoint = endpoint;
                            model.notification.duration_ms = config.notification_duration_ms;
                        }
                        Err(e) => {
                            warn!(error = %e, "configuration rejected");
                            model.notify_error(&e);
                        }
                    }
                    caps.render.render();
                }

                Event::Navigate(route) => {
                    model.route = route;
                    caps.render.render();
                }

                Event::ToggleTheme => {
                    model.theme = model.theme.toggled();
                    caps.render.render();
                }

                Event::FormFieldChanged { field, value } => {
                    model.form.set(field, value);
                    caps.render.render();
                }

                Event::SubmitRequested => {
                    Self::send_save_request(model, caps);
                    caps.render.render();
                }

                Event::EditRequested(record) => {
                    model.form = (*record).into();
                    caps.render.render();
                }

                Event::CancelEdit => {
                    model.form.reset();
                    caps.render.render();
                }

                Event::DeleteRequested { id } => {
                    Self::send_delete_request(id, model, caps);
                    caps.render.render();
                }

                Event::ReloadRequested => {
                    Self::send_list_request(model, caps);
                    caps.render.render();
                }

                Event::SearchChanged { term } => {
                    model.search_term = term;
                    caps.render.render();
                }

                Event::DismissNotification => {
                    model.notification.dismiss();
                    caps.render.render();
                }

                Event::TimerTick => {
                    if model.notification.is_expired(model.view_timestamp_ms) {
                        model.notification.dismiss();
                        caps.render.render();
                    }
                }

                Event::UsersListed { generation, result } => {
                    Self::handle_list_response(generation, *result, model, caps);
                }

                Event::UserSaved { mode, result } => {
                    Self::handle_save_response(mode, *result, model, caps);
                }

                Event::UserDeleted { id, result } => {
                    Self::handle_delete_response(&id, *result, model, caps);
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let users = filter_users(&model.users, &model.search_term)
                .into_iter()
                .map(UserRow::from)
                .collect();

            let notification = model
                .notification
                .visible
                .then(|| NotificationView {
                    message: model.notification.message.clone(),
                    severity: model.notification.severity,
                    duration_ms: model.notification.duration_ms,
                });

            ViewModel {
                route: model.route,
                theme: model.theme,
                users,
                search_term: model.search_term.clone(),
                stats: model.stats(),
                form: FormView {
                    mode: model.form.mode(),
                    id: model.form.id.clone(),
                    name: model.form.name.clone(),
                    email: model.form.email.clone(),
                    age: model.form.age.clone(),
                },
                notification,
                is_loading: model.is_loading,
            }
        }
    }
}
