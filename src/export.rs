// export.rs
//
// Image export of the current view and of every (dzongkhag x attribute)
// combination.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::buildings::load_buildings;
use crate::error::{MapError, Result};
use crate::plot::Capture;
use crate::region_index::RegionIndex;
use crate::render::RenderCoordinator;
use crate::schema::AttributeSpec;
use crate::state::{ViewAction, ViewState};

/// File-name friendly form of a region or attribute label.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        }
    }
    if out.is_empty() {
        String::from("attr")
    } else {
        out
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn view_file_name(region: Option<&str>, date: NaiveDate) -> String {
    format!(
        "gewogs-map-{}-{}.png",
        region.unwrap_or("all"),
        date.format("%Y-%m-%d")
    )
}

pub fn batch_file_name(region: &str, attribute: &AttributeSpec, date: NaiveDate) -> String {
    format!(
        "gewogs-{}-{}-{}.png",
        slug(region),
        slug(attribute.label),
        date.format("%Y-%m-%d")
    )
}

/// Everything an export step needs besides the job itself.
pub struct ExportContext<'a> {
    pub index: &'a RegionIndex,
    pub coordinator: &'a mut RenderCoordinator,
    pub capture: &'a mut dyn Capture,
    pub buildings_dir: &'a Path,
    pub output_dir: &'a Path,
}

impl ExportContext<'_> {
    /// Renders `view` and waits for its building overlay.
    fn render_settled(&mut self, view: &ViewState) {
        if let Some(request) = self.coordinator.render(view, self.index) {
            let overlay = load_buildings(self.buildings_dir, &request.region, request.mode);
            self.coordinator.apply_overlay(request.generation, overlay);
        }
    }

    fn capture_to(&mut self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(self.output_dir).map_err(|source| MapError::Io {
            path: self.output_dir.to_path_buf(),
            source,
        })?;
        let path = self.output_dir.join(file_name);
        self.capture
            .capture(self.coordinator.scene(), self.coordinator.legend(), &path)?;
        Ok(path)
    }
}

/// Renders `view` and saves it as `gewogs-map-<region>-<date>.png`.
pub fn export_view(ctx: &mut ExportContext<'_>, view: &ViewState, date: NaiveDate) -> Result<PathBuf> {
    ctx.render_settled(view);
    let path = ctx.capture_to(&view_file_name(view.region.as_deref(), date))?;
    info!(path = %path.display(), "exported view");
    Ok(path)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub region: String,
    pub attribute: &'static AttributeSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Written(PathBuf),
    Failed { job: ExportJob, error: String },
}

#[derive(Debug, Default, Clone)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(ExportJob, String)>,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Sequential export of every region and attribute pair.
///
/// Each step renders, waits for the overlay, and captures before the next
/// job starts; the shared viewport makes parallel steps unsafe. A failed
/// capture is recorded and the queue moves on.
#[derive(Debug)]
pub struct BatchExport {
    queue: VecDeque<ExportJob>,
    view: ViewState,
    date: NaiveDate,
    total: usize,
    report: ExportReport,
}

impl BatchExport {
    pub fn new(
        regions: &[&str],
        attributes: &'static [AttributeSpec],
        view: ViewState,
        date: NaiveDate,
    ) -> Self {
        let queue: VecDeque<ExportJob> = regions
            .iter()
            .flat_map(|region| {
                attributes.iter().map(move |attribute| ExportJob {
                    region: region.to_string(),
                    attribute,
                })
            })
            .collect();
        let total = queue.len();
        BatchExport {
            queue,
            view,
            date,
            total,
            report: ExportReport::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    /// Jobs finished so far, and the total.
    pub fn progress(&self) -> (usize, usize) {
        (self.report.total(), self.total)
    }

    /// View state after the last finished job.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn report(&self) -> &ExportReport {
        &self.report
    }

    /// Runs the next job, or returns `None` when the queue is empty.
    pub fn step(&mut self, ctx: &mut ExportContext<'_>) -> Option<StepOutcome> {
        let job = self.queue.pop_front()?;
        self.view = self
            .view
            .clone()
            .apply(ViewAction::SelectRegion(Some(job.region.clone())))
            .apply(ViewAction::SelectAttribute(job.attribute.key.to_string()));

        ctx.render_settled(&self.view);
        let file_name = batch_file_name(&job.region, job.attribute, self.date);
        let outcome = match ctx.capture_to(&file_name) {
            Ok(path) => {
                info!(path = %path.display(), "exported combination");
                self.report.written.push(path.clone());
                StepOutcome::Written(path)
            }
            Err(err) => {
                warn!(
                    region = %job.region,
                    attribute = job.attribute.key,
                    error = %err,
                    "export failed, continuing with next combination"
                );
                self.report.failed.push((job.clone(), err.to_string()));
                StepOutcome::Failed {
                    job,
                    error: err.to_string(),
                }
            }
        };
        Some(outcome)
    }

    pub fn run(mut self, ctx: &mut ExportContext<'_>) -> (ExportReport, ViewState) {
        while self.step(ctx).is_some() {}
        info!(
            written = self.report.written.len(),
            failed = self.report.failed.len(),
            "batch export finished"
        );
        (self.report, self.view)
    }
}
