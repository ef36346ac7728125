//! Presentation surface the indicator renders into

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::render::RenderOutput;

/// Where rendered output ends up. The host owns the actual display.
pub trait PresentationSurface: Send {
    fn update(&mut self, output: &RenderOutput);
    fn show(&mut self);
    fn hide(&mut self);
    fn dispose(&mut self);
}

/// Latest display published by [`DisplaySurface`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SurfaceSnapshot {
    pub visible: bool,
    pub disposed: bool,
    pub output: Option<RenderOutput>,
    /// Theme color id for `output.color`, resolved for the host
    pub theme_color: Option<&'static str>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Surface that publishes every change through a watch channel for the
/// HTTP host to read
#[derive(Debug)]
pub struct DisplaySurface {
    tx: watch::Sender<SurfaceSnapshot>,
}

impl DisplaySurface {
    pub fn new() -> (Self, watch::Receiver<SurfaceSnapshot>) {
        let (tx, rx) = watch::channel(SurfaceSnapshot::default());
        (Self { tx }, rx)
    }

    fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut SurfaceSnapshot),
    {
        self.tx.send_modify(|snapshot| {
            if snapshot.disposed {
                return;
            }
            f(snapshot);
            snapshot.updated_at = Some(Utc::now());
        });
    }
}

impl PresentationSurface for DisplaySurface {
    fn update(&mut self, output: &RenderOutput) {
        debug!("Surface text: {}", output.text);
        let output = output.clone();
        self.modify(|snapshot| {
            snapshot.theme_color = output.color.map(|color| color.theme_id());
            snapshot.output = Some(output);
        });
    }

    fn show(&mut self) {
        self.modify(|snapshot| snapshot.visible = true);
    }

    fn hide(&mut self) {
        self.modify(|snapshot| snapshot.visible = false);
    }

    fn dispose(&mut self) {
        self.tx.send_modify(|snapshot| {
            snapshot.visible = false;
            snapshot.disposed = true;
            snapshot.output = None;
            snapshot.theme_color = None;
            snapshot.updated_at = Some(Utc::now());
        });
    }
}
