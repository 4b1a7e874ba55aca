//! Projects Page
//!
//! Lists projects and creates new ones.

use leptos::*;
use leptos_router::*;

use crate::api::{self, Project};
use crate::components::{ErrorNotice, Loading};
use crate::state::global::use_global_state;

/// Projects listing page
#[component]
pub fn Projects() -> impl IntoView {
    let (version, set_version) = create_signal(0u32);
    let projects = create_resource(move || version.get(), |_| api::fetch_projects());

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Projects"</h1>
                <p class="text-gray-400 mt-1">"Each project groups the document types it validates"</p>
            </div>

            <CreateProjectForm on_created=move |_: Project| set_version.update(|v| *v += 1) />

            <Transition fallback=Loading>
                {move || projects.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-center text-gray-400 py-12">"No projects yet. Create your first one!"</p>
                    }.into_view(),
                    Ok(list) => view! {
                        <div class="grid md:grid-cols-2 lg:grid-cols-3 gap-4">
                            {list.into_iter().map(|project| view! { <ProjectCard project=project /> }).collect_view()}
                        </div>
                    }.into_view(),
                    Err(e) => view! { <ErrorNotice message=e /> }.into_view(),
                })}
            </Transition>
        </div>
    }
}

#[component]
fn ProjectCard(project: Project) -> impl IntoView {
    let href = format!("/projects/{}/documents", project.id);
    let created = project.created_at.chars().take(10).collect::<String>();

    view! {
        <A href=href class="block bg-gray-800 hover:bg-gray-700 rounded-xl p-5 transition-colors">
            <h2 class="text-lg font-semibold">{project.name}</h2>
            <p class="text-sm text-gray-400 mt-1">{format!("Created {}", created)}</p>
        </A>
    }
}

#[component]
fn CreateProjectForm(#[prop(into)] on_created: Callback<Project>) -> impl IntoView {
    let state = use_global_state();
    let (name, set_name) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let value = name.get();
        if value.trim().is_empty() {
            state.show_error("Project name is required");
            return;
        }

        set_submitting.set(true);
        let state = state.clone();
        spawn_local(async move {
            match api::create_project(value.trim()).await {
                Ok(project) => {
                    state.show_success(&format!("Created project {}", project.name));
                    set_name.set(String::new());
                    on_created.call(project);
                }
                Err(e) => state.show_error(&e),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="bg-gray-800 rounded-xl p-4 flex space-x-2">
            <input
                type="text"
                placeholder="New project name"
                prop:value=move || name.get()
                on:input=move |ev| set_name.set(event_target_value(&ev))
                class="flex-1 bg-gray-700 rounded-lg px-4 py-2
                       border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
            <button
                type="submit"
                disabled=move || submitting.get()
                class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-700
                       rounded-lg font-medium transition-colors"
            >
                "+ New Project"
            </button>
        </form>
    }
}
