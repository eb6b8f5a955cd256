use dioxus::prelude::*;

/// Text of the single-remove button for the selected marker's label.
pub fn remove_button_text(label: &str) -> String {
    format!("Remove marker {}", label)
}

#[component]
pub fn MarkerControls(
    selected_label: Option<String>,
    marker_count: usize,
    busy: bool,
    on_remove_selected: EventHandler<()>,
    on_remove_all: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "panel marker-controls",
            h3 { "Markers" }
            p { class: "marker-count",
                if marker_count == 1 { "1 marker" } else { "{marker_count} markers" }
            }
            if let Some(label) = selected_label {
                button {
                    class: "danger",
                    disabled: busy,
                    onclick: move |_| on_remove_selected.call(()),
                    "{remove_button_text(&label)}"
                }
            }
            button {
                class: "secondary",
                // The store may hold documents the board never loaded
                disabled: busy,
                onclick: move |_| on_remove_all.call(()),
                "Remove all markers"
            }
        }
    }
}
