//! Documents Page
//!
//! The document types of one project.

use leptos::*;
use leptos_router::*;

use crate::api::{self, Document};
use crate::components::{ErrorNotice, Loading};
use crate::state::global::use_global_state;

/// Documents listing for `/projects/:projectId/documents`
#[component]
pub fn Documents() -> impl IntoView {
    let params = use_params_map();
    let project_id = move || params.with(|p| p.get("projectId").cloned().unwrap_or_default());

    let (version, set_version) = create_signal(0u32);
    let project = create_resource(project_id, |id| async move { api::fetch_project(&id).await });
    let documents = create_resource(
        move || (project_id(), version.get()),
        |(id, _)| async move { api::fetch_documents(&id).await },
    );

    view! {
        <div class="space-y-8">
            <div>
                <A href="/projects" class="text-sm text-gray-400 hover:text-white">"← Projects"</A>
                <h1 class="text-3xl font-bold mt-2">
                    <Transition fallback=|| "Documents">
                        {move || project.get().map(|result| match result {
                            Ok(project) => project.name,
                            Err(_) => "Documents".to_string(),
                        })}
                    </Transition>
                </h1>
                <p class="text-gray-400 mt-1">"Document types and their OCR endpoints"</p>
            </div>

            {move || view! {
                <CreateDocumentForm
                    project_id=project_id()
                    on_created=move |_: Document| set_version.update(|v| *v += 1)
                />
            }}

            <Transition fallback=Loading>
                {move || documents.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-center text-gray-400 py-12">"No documents in this project yet."</p>
                    }.into_view(),
                    Ok(list) => view! {
                        <div class="space-y-3">
                            {list.into_iter().map(|document| view! { <DocumentRow document=document /> }).collect_view()}
                        </div>
                    }.into_view(),
                    Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                })}
            </Transition>
        </div>
    }
}

#[component]
fn DocumentRow(document: Document) -> impl IntoView {
    let href = format!("/documents/{}", document.id);
    let ocr = document.ocr_url.unwrap_or_else(|| "No OCR URL".to_string());
    let sample = if document.sample_json_path.is_some() {
        ("Sample uploaded", "text-green-400")
    } else {
        ("No sample", "text-gray-500")
    };

    view! {
        <A href=href class="flex items-center justify-between bg-gray-800 hover:bg-gray-700 rounded-xl p-4 transition-colors">
            <div>
                <h2 class="font-semibold">{document.name}</h2>
                <p class="text-sm text-gray-400 font-mono">{ocr}</p>
            </div>
            <span class=format!("text-sm {}", sample.1)>{sample.0}</span>
        </A>
    }
}

#[component]
fn CreateDocumentForm(
    project_id: String,
    #[prop(into)] on_created: Callback<Document>,
) -> impl IntoView {
    let state = use_global_state();
    let (name, set_name) = create_signal(String::new());
    let (ocr_url, set_ocr_url) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let doc_name = name.get();
        if doc_name.trim().is_empty() {
            state.show_error("Document name is required");
            return;
        }

        set_submitting.set(true);
        let state = state.clone();
        let project_id = project_id.clone();
        let url = ocr_url.get();
        spawn_local(async move {
            match api::create_document(&project_id, doc_name.trim(), &url).await {
                Ok(document) => {
                    state.show_success(&format!("Created document {}", document.name));
                    set_name.set(String::new());
                    set_ocr_url.set(String::new());
                    on_created.call(document);
                }
                Err(e) => state.show_error(&e),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="bg-gray-800 rounded-xl p-4 grid md:grid-cols-3 gap-2">
            <input
                type="text"
                placeholder="Document name"
                prop:value=move || name.get()
                on:input=move |ev| set_name.set(event_target_value(&ev))
                class="bg-gray-700 rounded-lg px-4 py-2 border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
            <input
                type="text"
                placeholder="OCR URL (or mock)"
                prop:value=move || ocr_url.get()
                on:input=move |ev| set_ocr_url.set(event_target_value(&ev))
                class="bg-gray-700 rounded-lg px-4 py-2 font-mono border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
            <button
                type="submit"
                disabled=move || submitting.get()
                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-700
                       rounded-lg font-medium transition-colors"
            >
                "+ New Document"
            </button>
        </form>
    }
}
