//! Navigation Component
//!
//! Header bar with the brand link and the API URL setting.

use leptos::*;
use leptos_router::*;

use crate::state::global::use_global_state;

/// Navigation header component
#[component]
pub fn Nav() -> impl IntoView {
    view! {
        <nav class="bg-gray-800 border-b border-gray-700">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    <A href="/projects" class="flex items-center space-x-3">
                        <span class="text-2xl">"🧾"</span>
                        <span class="text-xl font-bold text-white">"docval"</span>
                    </A>

                    <div class="flex items-center space-x-4">
                        <A
                            href="/projects"
                            class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
                            active_class="bg-gray-700 text-white"
                        >
                            "Projects"
                        </A>
                        <ApiUrlForm />
                    </div>
                </div>
            </div>
        </nav>
    }
}

/// Inline editor for the API base URL kept in local storage
#[component]
fn ApiUrlForm() -> impl IntoView {
    let state = use_global_state();
    let (draft, set_draft) = create_signal(state.api_base.get_untracked());

    let save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        state.set_api_base(&draft.get());
        state.show_success("API URL saved");
    };

    view! {
        <form on:submit=save class="flex items-center space-x-2">
            <input
                type="text"
                title="API base URL"
                prop:value=move || draft.get()
                on:input=move |ev| set_draft.set(event_target_value(&ev))
                class="w-64 bg-gray-700 rounded-lg px-3 py-1 text-sm
                       border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
            <button
                type="submit"
                class="px-3 py-1 bg-gray-600 hover:bg-gray-500 rounded-lg text-sm transition-colors"
            >
                "Save"
            </button>
        </form>
    }
}
