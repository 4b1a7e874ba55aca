//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;

use crate::api;

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Base URL of the docval REST API
    pub api_base: RwSignal<String>,
    /// Global loading state
    pub loading: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        api_base: create_rw_signal(api::get_api_base()),
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

/// Fetch the global state provided by the root component
pub fn use_global_state() -> GlobalState {
    use_context::<GlobalState>().expect("GlobalState not found")
}

impl GlobalState {
    /// Persist a new API base URL
    pub fn set_api_base(&self, url: &str) {
        api::set_api_base(url);
        self.api_base.set(api::get_api_base());
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

/// Accuracy in `[0, 1]` as a percentage string
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}%", accuracy * 100.0)
}

/// Text colour class for an accuracy score
pub fn accuracy_class(accuracy: f64) -> &'static str {
    if accuracy >= 0.95 {
        "text-green-400"
    } else if accuracy >= 0.75 {
        "text-yellow-400"
    } else {
        "text-red-400"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(1.0), "100.0%");
        assert_eq!(format_accuracy(0.8333), "83.3%");
        assert_eq!(format_accuracy(0.0), "0.0%");
    }

    #[test]
    fn test_accuracy_class_thresholds() {
        assert_eq!(accuracy_class(0.99), "text-green-400");
        assert_eq!(accuracy_class(0.8), "text-yellow-400");
        assert_eq!(accuracy_class(0.2), "text-red-400");
    }
}
