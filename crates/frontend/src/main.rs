mod api;
mod components;
mod coords;
mod pages;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Board {},
    #[route("/:..segments")]
    Unknown { segments: Vec<String> },
}

#[component]
fn Board() -> Element {
    rsx! {
        pages::board::MarkerBoard {}
    }
}

/// Anything but the root: the widget has a single page.
#[component]
fn Unknown(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div { class: "app not-found",
            h1 { "MarkerBoard" }
            p { "Nothing lives at /{path}." }
            Link { to: Route::Board {}, "Back to the map" }
        }
    }
}

const STYLESHEET: Asset = asset!("/assets/main.css");
const PIN_ICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Title { "MarkerBoard" }
        document::Link { rel: "icon", r#type: "image/svg+xml", href: PIN_ICON }
        document::Stylesheet { href: STYLESHEET }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
