use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use markerboard_shared::board::{Board, BoardError, OpKind, OpStatus, PendingOp, SurfaceEvent};
use markerboard_shared::sync;

use crate::api::{self, GraphQlRepository};
use crate::components::error_banner::ErrorBanner;
use crate::components::map_view::MapView;
use crate::components::marker_controls::MarkerControls;

/// Short status line for the header.
pub fn status_text(status: OpStatus) -> &'static str {
    match status {
        OpStatus::Pending(OpKind::Load) => "Loading markers…",
        OpStatus::Pending(_) => "Saving…",
        OpStatus::Failed(OpKind::Load) => "Could not load markers",
        _ => "",
    }
}

/// Start the timer that clears the current banner, if it is a transient one.
fn schedule_banner_expiry(mut board: Signal<Board>) {
    let expiry = board
        .read()
        .banner()
        .and_then(|b| b.auto_clear_after().map(|delay| (b.generation, delay)));
    let Some((generation, delay)) = expiry else {
        return;
    };
    spawn(async move {
        TimeoutFuture::new(delay.as_millis() as u32).await;
        board.write().expire_banner(generation);
    });
}

/// Run the remote half of `op` and settle the board with the result.
async fn run_op(mut board: Signal<Board>, repo: Rc<GraphQlRepository>, op: PendingOp) {
    let result = sync::execute(repo.as_ref(), &op).await;
    let settled = board.write().settle(op, result);
    if settled.is_err() {
        schedule_banner_expiry(board);
    }
}

/// Feed the outcome of a `begin_*` call back into the page: spawn the remote
/// call, or start the banner timer for a rejection.
fn dispatch(
    board: Signal<Board>,
    repo: &Rc<GraphQlRepository>,
    begun: Result<Option<PendingOp>, BoardError>,
) {
    match begun {
        Ok(Some(op)) => {
            spawn(run_op(board, repo.clone(), op));
        }
        Ok(None) => {}
        Err(_) => schedule_banner_expiry(board),
    }
}

#[component]
pub fn MarkerBoard() -> Element {
    let repo = use_context_provider(|| Rc::new(GraphQlRepository::connect(api::default_endpoint())));
    let mut board = use_signal(Board::new);

    let drop_repo = repo.clone();
    use_drop(move || drop_repo.disconnect());

    // Hydrate from the store once on mount
    let load_repo = repo.clone();
    use_effect(move || {
        let op = board.write().begin_load();
        spawn(run_op(board, load_repo.clone(), op));
    });

    let surface_repo = repo.clone();
    let remove_repo = repo.clone();
    let remove_all_repo = repo.clone();

    let snapshot = board.read();
    let rendered = snapshot.render();
    let banner = snapshot.banner().cloned();
    let selected_label = snapshot.selected_marker().map(|m| m.label.clone());
    let marker_count = snapshot.markers().len();
    let status = snapshot.status();
    drop(snapshot);

    let busy = matches!(status, OpStatus::Pending(_));
    let status_line = status_text(status);

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "MarkerBoard" }
                if !status_line.is_empty() {
                    span { class: "status", "{status_line}" }
                }
            }

            ErrorBanner { banner: banner }

            div { class: "sidebar",
                MarkerControls {
                    selected_label: selected_label,
                    marker_count: marker_count,
                    busy: busy,
                    on_remove_selected: move |_| {
                        let begun = board.write().begin_remove_selected().map(Some);
                        dispatch(board, &remove_repo, begun);
                    },
                    on_remove_all: move |_| {
                        let op = board.write().begin_remove_all();
                        dispatch(board, &remove_all_repo, Ok(Some(op)));
                    },
                }
            }

            MapView {
                markers: rendered,
                on_event: move |event: SurfaceEvent| {
                    let begun = board.write().handle(event);
                    dispatch(board, &surface_repo, begun);
                },
            }
        }
    }
}
