//! File Upload Component
//!
//! A file picker with a submit button that hands the chosen file to the
//! parent.

use leptos::html::Input;
use leptos::*;

use super::loading::InlineLoading;

#[component]
pub fn FileUpload(
    /// Button label
    label: &'static str,
    /// `accept` attribute of the file input
    #[prop(default = "")]
    accept: &'static str,
    /// True while the parent is uploading
    #[prop(into)]
    busy: Signal<bool>,
    #[prop(into)]
    on_file: Callback<web_sys::File>,
) -> impl IntoView {
    let input_ref = create_node_ref::<Input>();

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(input) = input_ref.get() else {
            return;
        };
        if let Some(file) = input.files().and_then(|files| files.get(0)) {
            on_file.call(file);
            input.set_value("");
        }
    };

    view! {
        <form on:submit=submit class="flex items-center space-x-2">
            <input
                type="file"
                accept=accept
                node_ref=input_ref
                class="flex-1 text-sm text-gray-300 file:mr-3 file:px-3 file:py-2 file:rounded-lg
                       file:border-0 file:bg-gray-700 file:text-white"
            />
            <button
                type="submit"
                disabled=move || busy.get()
                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-700
                       rounded-lg font-medium transition-colors flex items-center space-x-2"
            >
                {move || busy.get().then(|| view! { <InlineLoading /> })}
                <span>{label}</span>
            </button>
        </form>
    }
}
