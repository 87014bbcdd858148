use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::model::{FormField, FormMode, Route, UserId, UserRecord};

pub type ListResult = crux_http::Result<crux_http::Response<Vec<UserRecord>>>;
pub type MutationResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

// Capability responses are boxed to keep the enum small and are never
// serialized: they only travel from the capability back into `update`.
#[derive(Serialize, Deserialize, Debug, Default)]
pub enum Event {
    #[default]
    Noop,

    // Lifecycle & configuration
    AppStarted,
    Configure(Box<ClientConfig>),

    // Presentation
    Navigate(Route),
    ToggleTheme,

    // Form
    FormFieldChanged { field: FormField, value: String },
    SubmitRequested,
    EditRequested(Box<UserRecord>),
    CancelEdit,

    // Collection
    DeleteRequested { id: UserId },
    ReloadRequested,
    SearchChanged { term: String },

    // Notifications
    DismissNotification,
    TimerTick,

    // Capability responses
    #[serde(skip)]
    UsersListed {
        generation: u64,
        result: Box<ListResult>,
    },
    #[serde(skip)]
    UserSaved {
        mode: FormMode,
        result: Box<MutationResult>,
    },
    #[serde(skip)]
    UserDeleted {
        id: UserId,
        result: Box<MutationResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::Navigate(_) => "navigate",
            Self::ToggleTheme => "toggle_theme",
            Self::FormFieldChanged { .. } => "form_field_changed",
            Self::SubmitRequested => "submit_requested",
            Self::EditRequested(_) => "edit_requested",
            Self::CancelEdit => "cancel_edit",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::ReloadRequested => "reload_requested",
            Self::SearchChanged { .. } => "search_changed",
            Self::DismissNotification => "dismiss_notification",
            Self::TimerTick => "timer_tick",
            Self::UsersListed { .. } => "users_listed",
            Self::UserSaved { .. } => "user_saved",
            Self::UserDeleted { .. } => "user_deleted",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::Navigate(_)
                | Self::ToggleTheme
                | Self::FormFieldChanged { .. }
                | Self::SubmitRequested
                | Self::EditRequested(_)
                | Self::CancelEdit
                | Self::DeleteRequested { .. }
                | Self::ReloadRequested
                | Self::SearchChanged { .. }
                | Self::DismissNotification
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_deserialize_from_shell_json() {
        let event: Event =
            serde_json::from_str(r#"{"FormFieldChanged":{"field":"email","value":"a@x.com"}}"#)
                .unwrap();
        assert!(matches!(
            event,
            Event::FormFieldChanged { field: FormField::Email, ref value } if value == "a@x.com"
        ));

        let event: Event = serde_json::from_str(r#"{"DeleteRequested":{"id":4}}"#).unwrap();
        assert!(matches!(event, Event::DeleteRequested { id: UserId::Numeric(4) }));

        let event: Event = serde_json::from_str(r#"{"Navigate":"dashboard"}"#).unwrap();
        assert!(matches!(event, Event::Navigate(Route::Dashboard)));
    }

    #[test]
    fn user_initiated_classification() {
        assert!(Event::SubmitRequested.is_user_initiated());
        assert!(Event::SearchChanged { term: "a".into() }.is_user_initiated());
        assert!(!Event::AppStarted.is_user_initiated());
        assert!(!Event::TimerTick.is_user_initiated());
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Event::default().name(), "noop");
        assert_eq!(
            Event::EditRequested(Box::default()).name(),
            "edit_requested"
        );
        assert_eq!(
            Event::DeleteRequested { id: UserId::Text("x".into()) }.name(),
            "delete_requested"
        );
    }

    #[test]
    fn event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 64,
            "Event enum is {} bytes, box more variants",
            size
        );
    }
}
