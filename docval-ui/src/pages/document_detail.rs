//! Document Detail Page
//!
//! OCR endpoint, sample JSON, scans and validation runs of one document.

use gloo_timers::future::TimeoutFuture;
use leptos::*;
use leptos_router::*;

use crate::api::{self, Document, DocumentResult, Upload, ValidationJob};
use crate::components::{ErrorNotice, FileUpload, Loading};
use crate::state::global::{accuracy_class, format_accuracy, use_global_state};

const POLL_INTERVAL_MS: u32 = 1000;

/// Detail page for `/documents/:documentId`
#[component]
pub fn DocumentDetail() -> impl IntoView {
    let params = use_params_map();
    let document_id = move || params.with(|p| p.get("documentId").cloned().unwrap_or_default());

    let (version, set_version) = create_signal(0u32);
    let refresh = Callback::new(move |_: ()| set_version.update(|v| *v += 1));

    let document = create_resource(
        move || (document_id(), version.get()),
        |(id, _)| async move { api::fetch_document(&id).await },
    );

    view! {
        <Transition fallback=Loading>
            {move || document.get().map(|result| match result {
                Ok(document) => view! { <DocumentPanels document=document version=version refresh=refresh /> }.into_view(),
                Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
            })}
        </Transition>
    }
}

#[component]
fn DocumentPanels(
    document: Document,
    version: ReadSignal<u32>,
    refresh: Callback<()>,
) -> impl IntoView {
    let back = format!("/projects/{}/documents", document.project_id);
    let id = document.id.clone();

    view! {
        <div class="space-y-8">
            <div>
                <A href=back class="text-sm text-gray-400 hover:text-white">"← Documents"</A>
                <h1 class="text-3xl font-bold mt-2">{document.name.clone()}</h1>
            </div>

            <OcrUrlEditor document=document.clone() refresh=refresh />
            <SamplePanel document_id=id.clone() version=version refresh=refresh />
            <UploadsPanel document_id=id.clone() version=version refresh=refresh />
            <ValidationPanel document_id=id />
        </div>
    }
}

#[component]
fn OcrUrlEditor(document: Document, refresh: Callback<()>) -> impl IntoView {
    let state = use_global_state();
    let (url, set_url) = create_signal(document.ocr_url.clone().unwrap_or_default());
    let (saving, set_saving) = create_signal(false);
    let document_id = document.id;

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_saving.set(true);
        let state = state.clone();
        let document_id = document_id.clone();
        let value = url.get();
        spawn_local(async move {
            match api::update_ocr_url(&document_id, &value).await {
                Ok(_) => {
                    state.show_success("OCR URL saved");
                    refresh.call(());
                }
                Err(e) => state.show_error(&e),
            }
            set_saving.set(false);
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-1">"OCR endpoint"</h2>
            <p class="text-sm text-gray-400 mb-4">
                "Scans are posted to this URL. Use " <code>"mock"</code> " to replay the sample JSON."
            </p>
            <form on:submit=on_submit class="flex space-x-2">
                <input
                    type="text"
                    prop:value=move || url.get()
                    on:input=move |ev| set_url.set(event_target_value(&ev))
                    class="flex-1 bg-gray-700 rounded-lg px-4 py-2 font-mono
                           border border-gray-600 focus:border-primary-500 focus:outline-none"
                />
                <button
                    type="submit"
                    disabled=move || saving.get()
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-700
                           rounded-lg font-medium transition-colors"
                >
                    "Save"
                </button>
            </form>
        </section>
    }
}

#[component]
fn SamplePanel(document_id: String, version: ReadSignal<u32>, refresh: Callback<()>) -> impl IntoView {
    let state = use_global_state();
    let (busy, set_busy) = create_signal(false);

    let id = document_id.clone();
    let fields = create_resource(
        move || version.get(),
        move |_| {
            let id = id.clone();
            async move { api::fetch_text_fields(&id).await }
        },
    );

    let on_file = move |file: web_sys::File| {
        set_busy.set(true);
        let state = state.clone();
        let document_id = document_id.clone();
        spawn_local(async move {
            match api::upload_sample_json(&document_id, &file).await {
                Ok(_) => {
                    state.show_success("Sample JSON uploaded");
                    refresh.call(());
                }
                Err(e) => state.show_error(&e),
            }
            set_busy.set(false);
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Sample OCR response"</h2>
            <FileUpload label="Upload sample" accept=".json,application/json" busy=busy on_file=on_file />

            <Transition fallback=Loading>
                {move || fields.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-sm text-gray-400">"No text fields yet. Upload a sample OCR response."</p>
                    }.into_view(),
                    Ok(list) => view! {
                        <div class="flex flex-wrap gap-2">
                            {list.into_iter().map(|field| view! {
                                <span class="px-2 py-1 bg-gray-700 rounded font-mono text-sm">{field}</span>
                            }).collect_view()}
                        </div>
                    }.into_view(),
                    Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                })}
            </Transition>
        </section>
    }
}

#[component]
fn UploadsPanel(document_id: String, version: ReadSignal<u32>, refresh: Callback<()>) -> impl IntoView {
    let state = use_global_state();
    let (busy, set_busy) = create_signal(false);

    let id = document_id.clone();
    let uploads = create_resource(
        move || version.get(),
        move |_| {
            let id = id.clone();
            async move { api::fetch_uploads(&id).await }
        },
    );

    let target = document_id.clone();
    let on_file = move |file: web_sys::File| {
        set_busy.set(true);
        let state = state.clone();
        let document_id = target.clone();
        spawn_local(async move {
            match api::upload_scan(&document_id, &file).await {
                Ok(upload) => {
                    state.show_success(&format!("Uploaded {}", upload.file_name));
                    refresh.call(());
                }
                Err(e) => state.show_error(&e),
            }
            set_busy.set(false);
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Scans"</h2>
            <FileUpload
                label="Upload scan"
                accept=".pdf,.png,.jpg,.jpeg,.tif,.tiff"
                busy=busy
                on_file=on_file
            />

            <Transition fallback=Loading>
                {move || uploads.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-sm text-gray-400">"No scans uploaded."</p>
                    }.into_view(),
                    Ok(list) => view! {
                        <ul class="divide-y divide-gray-700">
                            {list.into_iter().map(|upload| view! { <UploadRow upload=upload /> }).collect_view()}
                        </ul>
                    }.into_view(),
                    Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                })}
            </Transition>
        </section>
    }
}

#[component]
fn UploadRow(upload: Upload) -> impl IntoView {
    let href = format!("/documents/{}/upload/{}", upload.document_id, upload.id);
    let (label, class) = if upload.user_input_json_path.is_some() {
        ("User input ready", "text-green-400")
    } else {
        ("Waiting for user input", "text-yellow-400")
    };

    view! {
        <li class="py-2">
            <A href=href class="flex items-center justify-between hover:text-primary-400">
                <span class="font-mono text-sm">{upload.file_name}</span>
                <span class=format!("text-sm {}", class)>{label}</span>
            </A>
        </li>
    }
}

#[component]
fn ValidationPanel(document_id: String) -> impl IntoView {
    let state = use_global_state();
    let (job, set_job) = create_signal(None::<ValidationJob>);
    let (result, set_result) = create_signal(None::<DocumentResult>);

    let running = move || job.with(|j| j.as_ref().map(|j| !j.is_finished()).unwrap_or(false));

    let start = move |_| {
        let state = state.clone();
        let document_id = document_id.clone();
        set_result.set(None);
        spawn_local(async move {
            let started = match api::run_validation(&document_id).await {
                Ok(job) => job,
                Err(e) => {
                    state.show_error(&e);
                    return;
                }
            };
            let job_id = started.id.clone();
            set_job.set(Some(started));
            state.loading.set(true);

            let finished = loop {
                TimeoutFuture::new(POLL_INTERVAL_MS).await;
                match api::fetch_job_status(&job_id).await {
                    Ok(current) if current.is_finished() => break current,
                    Ok(current) => set_job.set(Some(current)),
                    Err(e) => {
                        state.show_error(&e);
                        state.loading.set(false);
                        return;
                    }
                }
            };
            set_job.set(Some(finished.clone()));
            state.loading.set(false);

            if finished.status == "failed" {
                state.show_error(finished.error.as_deref().unwrap_or("Validation failed"));
                return;
            }
            match api::fetch_job_result(&job_id).await {
                Ok(outcome) => {
                    set_result.set(outcome.result);
                    state.show_success("Validation completed");
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <div class="flex items-center justify-between">
                <h2 class="text-xl font-semibold">"Validation"</h2>
                <button
                    on:click=start
                    disabled=running
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-700
                           rounded-lg font-medium transition-colors"
                >
                    {move || if running() { "Running..." } else { "Run validation" }}
                </button>
            </div>

            {move || job.get().map(|job| view! { <JobProgress job=job /> })}
            {move || result.get().map(|result| view! { <DocumentResultView result=result /> })}
        </section>
    }
}

#[component]
fn JobProgress(job: ValidationJob) -> impl IntoView {
    let progress = match (job.processed_uploads, job.total_uploads) {
        (Some(done), Some(total)) => format!("{} / {} uploads", done, total),
        _ => String::new(),
    };

    view! {
        <div class="flex items-center space-x-4 text-sm">
            <span class="px-2 py-1 bg-gray-700 rounded uppercase tracking-wide">{job.status}</span>
            <span class="text-gray-400">{progress}</span>
            {job.error.map(|e| view! { <span class="text-red-400">{e}</span> })}
        </div>
    }
}

#[component]
fn DocumentResultView(result: DocumentResult) -> impl IntoView {
    let document_id = result.document_id.clone();

    view! {
        <div class="space-y-3">
            <p class="text-sm text-gray-400">
                {format!(
                    "{} uploads: {} successful, {} failed",
                    result.total_uploads, result.successful_uploads, result.failed_uploads
                )}
            </p>
            <ul class="divide-y divide-gray-700">
                {result.upload_results.into_iter().map(|upload| {
                    let href = format!("/documents/{}/upload/{}", document_id, upload.upload_id);
                    let summary = match upload.error {
                        Some(error) => view! { <span class="text-red-400 text-sm">{error}</span> }.into_view(),
                        None => view! {
                            <span class=format!("text-sm {}", accuracy_class(upload.overall_accuracy))>
                                {format_accuracy(upload.overall_accuracy)}
                            </span>
                        }.into_view(),
                    };
                    view! {
                        <li class="py-2 flex items-center justify-between">
                            <A href=href class="font-mono text-sm hover:text-primary-400">{upload.upload_id}</A>
                            {summary}
                        </li>
                    }
                }).collect_view()}
            </ul>
        </div>
    }
}
