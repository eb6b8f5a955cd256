use dioxus::prelude::*;
use markerboard_shared::board::{Banner, BannerKind};

#[component]
pub fn ErrorBanner(banner: Option<Banner>) -> Element {
    let Some(banner) = banner else {
        return rsx! {};
    };
    let class = match banner.kind {
        BannerKind::Transient => "error-banner transient",
        BannerKind::Persistent => "error-banner persistent",
    };

    rsx! {
        div { class: "{class}", role: "alert", "{banner.message}" }
    }
}
