//! Upload Detail Page
//!
//! User-input JSON and latest per-field results of one scan.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{ErrorNotice, FileUpload, Loading, ResultsTable};
use crate::state::global::use_global_state;

/// Detail page for `/documents/:documentId/upload/:uploadId`
#[component]
pub fn UploadDetail() -> impl IntoView {
    let state = use_global_state();
    let params = use_params_map();
    let document_id = move || params.with(|p| p.get("documentId").cloned().unwrap_or_default());
    let upload_id = move || params.with(|p| p.get("uploadId").cloned().unwrap_or_default());

    let (version, set_version) = create_signal(0u32);
    let (busy, set_busy) = create_signal(false);

    let upload = create_resource(
        move || (upload_id(), version.get()),
        |(id, _)| async move { api::fetch_upload(&id).await },
    );
    let results = create_resource(
        move || (upload_id(), version.get()),
        |(id, _)| async move { api::fetch_upload_results(&id).await },
    );

    let on_file = move |file: web_sys::File| {
        set_busy.set(true);
        let state = state.clone();
        let id = upload_id();
        spawn_local(async move {
            match api::upload_user_input(&id, &file).await {
                Ok(_) => {
                    state.show_success("User input uploaded");
                    set_version.update(|v| *v += 1);
                }
                Err(e) => state.show_error(&e),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="space-y-8">
            <div>
                <A href=move || format!("/documents/{}", document_id()) class="text-sm text-gray-400 hover:text-white">
                    "← Document"
                </A>
                <Transition fallback=Loading>
                    {move || upload.get().map(|result| match result {
                        Ok(upload) => view! {
                            <h1 class="text-3xl font-bold mt-2 font-mono">{upload.file_name}</h1>
                            <div class="flex items-center space-x-4 mt-1 text-sm">
                                <a href=api::upload_file_url(&upload.id) class="text-primary-400 hover:underline">
                                    "Download scan"
                                </a>
                                <span class="text-gray-400">
                                    {if upload.user_input_json_path.is_some() {
                                        "User input uploaded"
                                    } else {
                                        "No user input yet"
                                    }}
                                </span>
                            </div>
                        }.into_view(),
                        Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                    })}
                </Transition>
            </div>

            <section class="bg-gray-800 rounded-xl p-6 space-y-4">
                <h2 class="text-xl font-semibold">"User input"</h2>
                <p class="text-sm text-gray-400">"A JSON object mapping field names to the values typed for this scan."</p>
                <FileUpload label="Upload user input" accept=".json,application/json" busy=busy on_file=on_file />
            </section>

            <section class="bg-gray-800 rounded-xl p-6 space-y-4">
                <div class="flex items-center justify-between">
                    <h2 class="text-xl font-semibold">"Latest results"</h2>
                    <a
                        href=move || api::upload_results_csv_url(&upload_id())
                        class="text-sm text-primary-400 hover:underline"
                    >
                        "Download CSV"
                    </a>
                </div>
                <Transition fallback=Loading>
                    {move || results.get().map(|result| match result {
                        Ok(rows) => view! { <ResultsTable results=rows /> }.into_view(),
                        Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                    })}
                </Transition>
            </section>
        </div>
    }
}
