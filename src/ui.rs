// ui.rs

use crate::diagnostics::StatusSnapshot;
use crossbeam::channel::Receiver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::thread::{self, JoinHandle};

pub fn create_transport_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Transport");
    pb
}

/// Renders snapshots until the event loop drops its sender.
pub fn run_status_display(status_rx: Receiver<StatusSnapshot>) -> JoinHandle<()> {
    thread::spawn(move || {
        let spinner = create_transport_spinner();
        for snapshot in status_rx.iter() {
            spinner.set_message(snapshot.summary());
            if snapshot.is_running() {
                spinner.tick();
            }
        }
        spinner.finish_with_message("stopped");
    })
}
