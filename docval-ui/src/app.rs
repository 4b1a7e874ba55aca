//! App Root Component
//!
//! Route table and global providers. The paths and their order mirror
//! `docval::navigation::ROUTES` on the server.

use leptos::*;
use leptos_router::*;

use crate::components::{Nav, Toast};
use crate::pages::{DocumentDetail, Documents, NotFound, Projects, UploadDetail};
use crate::state::global::{provide_global_state, use_global_state};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white flex flex-col">
                <Nav />

                <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                    <Routes>
                        <Route path="/" view=|| view! { <Redirect path="/projects" /> } />
                        <Route path="/projects" view=Projects />
                        <Route path="/projects/:projectId/documents" view=Documents />
                        <Route path="/documents/:documentId" view=DocumentDetail />
                        <Route path="/documents/:documentId/upload/:uploadId" view=UploadDetail />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <Footer />

                <Toast />
            </div>
        </Router>
    }
}

/// Footer showing the API base and the global loading state
#[component]
fn Footer() -> impl IntoView {
    let state = use_global_state();

    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm">
                <div class="text-gray-400">
                    {move || format!("API: {}", state.api_base.get())}
                </div>

                {move || {
                    if state.loading.get() {
                        view! {
                            <div class="flex items-center space-x-2 text-primary-400">
                                <div class="loading-spinner w-4 h-4" />
                                <span>"Working..."</span>
                            </div>
                        }.into_view()
                    } else {
                        view! {}.into_view()
                    }
                }}
            </div>
        </footer>
    }
}
