//! Results Table Component
//!
//! Per-field comparison of user values and OCR values.

use leptos::*;

use crate::api::FieldResult;
use crate::state::global::{accuracy_class, format_accuracy};

#[component]
pub fn ResultsTable(results: Vec<FieldResult>) -> impl IntoView {
    if results.is_empty() {
        return view! {
            <p class="text-gray-400 text-sm">"No field results."</p>
        }
        .into_view();
    }

    view! {
        <table class="w-full text-sm">
            <thead>
                <tr class="text-left text-gray-400 border-b border-gray-700">
                    <th class="py-2 pr-4">"Field"</th>
                    <th class="py-2 pr-4">"User value"</th>
                    <th class="py-2 pr-4">"OCR value"</th>
                    <th class="py-2 text-right">"Accuracy"</th>
                </tr>
            </thead>
            <tbody>
                {results.into_iter().map(|row| view! {
                    <tr class="border-b border-gray-800">
                        <td class="py-2 pr-4 font-mono">{row.field_name}</td>
                        <td class="py-2 pr-4">{row.user_value}</td>
                        <td class="py-2 pr-4">{row.ocr_value}</td>
                        <td class=format!("py-2 text-right {}", accuracy_class(row.accuracy))>
                            {format_accuracy(row.accuracy)}
                        </td>
                    </tr>
                }).collect_view()}
            </tbody>
        </table>
    }
    .into_view()
}
