// app.rs

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{info, warn};

use gewog_hazard_mapper::buildings::BuildingLayer;
use gewog_hazard_mapper::config::Settings;
use gewog_hazard_mapper::export::{BatchExport, ExportContext, StepOutcome, export_view, today};
use gewog_hazard_mapper::plot::PngCapture;
use gewog_hazard_mapper::region_index::RegionIndex;
use gewog_hazard_mapper::render::{OverlayRequest, RenderCoordinator, StyledFeature};
use gewog_hazard_mapper::schema::ATTRIBUTES;
use gewog_hazard_mapper::state::{ViewAction, ViewState};

#[derive(PartialEq)]
pub enum CurrentScreen {
    Map,
    Help,
}

#[derive(PartialEq)]
pub enum AppMode {
    Navigation,
    Searching,
}

pub struct App {
    pub current_screen: CurrentScreen,
    pub current_mode: AppMode, // Current operational mode of the TUI
    pub should_quit: bool,
    pub settings: Settings,

    // Loaded data
    pub index: RegionIndex,
    pub regions: Vec<String>,

    // Dzongkhag list
    pub selected_region_index: usize, // Index in `filtered_region_indices`
    pub scroll_offset: usize,         // Scroll position for the region list

    // Fuzzy search
    pub search_query_buffer: String,
    pub search_query_cursor: usize,
    pub filtered_region_indices: Vec<usize>, // Indices into `regions`
    pub previous_search_query_buffer: String,

    // Map
    pub view: ViewState,
    pub coordinator: RenderCoordinator,
    pub capture: PngCapture,
    pub highlighted_gewog: usize,
    pending_overlay: Option<OverlayRequest>,
    pub batch: Option<BatchExport>,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,

    // Resizing for the main UI
    pub left_pane_width_percentage: u16, // Width of the left (dzongkhag list) pane
    pub is_resizing: bool,               // True when actively dragging the divider
    pub divider_x: u16,                  // Column the divider was last drawn in
}

impl App {
    /// Constructs a new `App` over a loaded region index.
    pub fn new(settings: Settings, index: RegionIndex) -> App {
        let regions: Vec<String> = index.regions().into_iter().map(str::to_string).collect();
        let capture = PngCapture {
            width: settings.image_width,
            height: settings.image_height,
        };
        App {
            current_screen: CurrentScreen::Map,
            current_mode: AppMode::Navigation,
            should_quit: false,
            settings,

            filtered_region_indices: (0..regions.len()).collect(),
            index,
            regions,

            selected_region_index: 0,
            scroll_offset: 0,

            search_query_buffer: String::new(),
            search_query_cursor: 0,
            previous_search_query_buffer: String::new(),

            view: ViewState::default(),
            coordinator: RenderCoordinator::default(),
            capture,
            highlighted_gewog: 0,
            pending_overlay: None,
            batch: None,

            notification: String::from("Select a dzongkhag:"),
            help_keybinds: vec![
                "J/K or Arrow Keys: Navigate dzongkhags".to_string(),
                "Enter: Show selected dzongkhag".to_string(),
                "Esc: Clear selection".to_string(),
                "A: Next attribute".to_string(),
                "D: Toggle outline-only display".to_string(),
                "[ / ]: Previous / next gewog".to_string(),
                "S: Save current view as image".to_string(),
                "X: Export all combinations".to_string(),
                "/: Start fuzzy search".to_string(),
                "Q: Quit the application".to_string(),
                "H: Show Help screen".to_string(),
                "Click & Drag Divider: Resize panels".to_string(),
            ],

            left_pane_width_percentage: 35,
            is_resizing: false,
            divider_x: 0,
        }
    }

    /// Shows the first dzongkhag, as the map does right after loading.
    pub fn select_first_region(&mut self) {
        if let Some(first) = self.regions.first().cloned() {
            self.dispatch(ViewAction::SelectRegion(Some(first)));
        }
    }

    pub fn dispatch(&mut self, action: ViewAction) {
        self.view = std::mem::take(&mut self.view).apply(action);
        self.rerender();
    }

    fn rerender(&mut self) {
        self.pending_overlay = self.coordinator.render(&self.view, &self.index);
        self.highlighted_gewog = 0;
        self.notification = match &self.view.region {
            Some(region) => format!(
                "{} | {} | {}",
                region,
                self.view.attribute.label,
                self.view.mode.label()
            ),
            None => String::from("Select a dzongkhag:"),
        };
    }

    /// Overlay load the event loop should start, if any.
    pub fn take_overlay_request(&mut self) -> Option<OverlayRequest> {
        self.pending_overlay.take()
    }

    pub fn apply_overlay(&mut self, generation: u64, layer: Option<BuildingLayer>) {
        self.coordinator.apply_overlay(generation, layer);
    }

    pub fn gewogs(&self) -> &[StyledFeature] {
        self.coordinator.scene().map(|s| s.gewogs()).unwrap_or(&[])
    }

    pub fn highlighted(&self) -> Option<&StyledFeature> {
        self.gewogs().get(self.highlighted_gewog)
    }

    fn selected_region(&self) -> Option<&String> {
        let original = *self.filtered_region_indices.get(self.selected_region_index)?;
        self.regions.get(original)
    }

    pub fn refresh_filter(&mut self) {
        self.filtered_region_indices = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, name)| fuzzy_match(&self.search_query_buffer, name))
            .map(|(i, _)| i)
            .collect();
        self.selected_region_index = 0;
        self.scroll_offset = 0;
    }

    pub fn export_current(&mut self) {
        if self.batch.is_some() {
            self.notification = String::from("Batch export in progress");
            return;
        }
        let view = self.view.clone();
        let mut ctx = ExportContext {
            index: &self.index,
            coordinator: &mut self.coordinator,
            capture: &mut self.capture,
            buildings_dir: &self.settings.buildings_dir,
            output_dir: &self.settings.output_dir,
        };
        match export_view(&mut ctx, &view, today()) {
            Ok(path) => self.notification = format!("Saved {}", path.display()),
            Err(err) => {
                warn!(error = %err, "export failed");
                self.notification = String::from("Export failed. Try again.");
            }
        }
        // The export rendered synchronously; nothing left to load.
        self.pending_overlay = None;
    }

    pub fn start_export_all(&mut self) {
        if self.batch.is_some() {
            return;
        }
        if self.regions.is_empty() {
            self.notification = String::from("Nothing to export");
            return;
        }
        let regions: Vec<&str> = self.regions.iter().map(String::as_str).collect();
        let batch = BatchExport::new(&regions, &ATTRIBUTES, self.view.clone(), today());
        info!(jobs = batch.progress().1, "starting batch export");
        self.notification = format!("Downloading… 0/{}", batch.progress().1);
        self.batch = Some(batch);
    }

    /// Advances a running batch export by one combination.
    pub fn on_tick(&mut self) {
        let Some(batch) = self.batch.as_mut() else {
            return;
        };
        let mut ctx = ExportContext {
            index: &self.index,
            coordinator: &mut self.coordinator,
            capture: &mut self.capture,
            buildings_dir: &self.settings.buildings_dir,
            output_dir: &self.settings.output_dir,
        };
        let outcome = batch.step(&mut ctx);
        let (done, total) = batch.progress();
        self.view = batch.view().clone();
        self.pending_overlay = None;

        if let Some(StepOutcome::Failed { job, .. }) = &outcome {
            self.notification = format!(
                "Downloading… {done}/{total} (export for {} / {} failed)",
                job.region, job.attribute.label
            );
        } else {
            self.notification = format!("Downloading… {done}/{total}");
        }

        if batch.is_done() {
            let report = batch.report();
            self.notification = format!(
                "Exported {} images to {} ({} failed)",
                report.written.len(),
                self.settings.output_dir.display(),
                report.failed.len()
            );
            self.batch = None;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.current_screen == CurrentScreen::Help {
            if matches!(
                key.code,
                KeyCode::Char('h') | KeyCode::Char('q') | KeyCode::Esc
            ) {
                self.current_screen = CurrentScreen::Map;
            }
            return;
        }

        match self.current_mode {
            AppMode::Searching => self.on_search_key(key),
            AppMode::Navigation => self.on_navigation_key(key),
        }
    }

    fn on_navigation_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') => self.current_screen = CurrentScreen::Help,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_region_index + 1 < self.filtered_region_indices.len() {
                    self.selected_region_index += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_region_index = self.selected_region_index.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(region) = self.selected_region().cloned() {
                    self.dispatch(ViewAction::SelectRegion(Some(region)));
                }
            }
            KeyCode::Esc => self.dispatch(ViewAction::SelectRegion(None)),
            KeyCode::Char('a') => self.dispatch(ViewAction::NextAttribute),
            KeyCode::Char('d') => self.dispatch(ViewAction::ToggleDisplayMode),
            KeyCode::Char(']') => {
                if self.highlighted_gewog + 1 < self.gewogs().len() {
                    self.highlighted_gewog += 1;
                }
            }
            KeyCode::Char('[') => {
                self.highlighted_gewog = self.highlighted_gewog.saturating_sub(1);
            }
            KeyCode::Char('s') => self.export_current(),
            KeyCode::Char('x') => self.start_export_all(),
            KeyCode::Char('/') => {
                self.previous_search_query_buffer = self.search_query_buffer.clone();
                self.search_query_cursor = self.search_query_buffer.len();
                self.current_mode = AppMode::Searching;
            }
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.search_query_buffer.insert(self.search_query_cursor, c);
                self.search_query_cursor += c.len_utf8();
                self.refresh_filter();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.search_query_buffer[..self.search_query_cursor]
                    .chars()
                    .next_back()
                {
                    self.search_query_cursor -= prev.len_utf8();
                    self.search_query_buffer.remove(self.search_query_cursor);
                    self.refresh_filter();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.search_query_buffer[..self.search_query_cursor]
                    .chars()
                    .next_back()
                {
                    self.search_query_cursor -= prev.len_utf8();
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.search_query_buffer[self.search_query_cursor..]
                    .chars()
                    .next()
                {
                    self.search_query_cursor += next.len_utf8();
                }
            }
            KeyCode::Enter => self.current_mode = AppMode::Navigation,
            KeyCode::Esc => {
                self.search_query_buffer = self.previous_search_query_buffer.clone();
                self.search_query_cursor = self.search_query_buffer.len();
                self.refresh_filter();
                self.current_mode = AppMode::Navigation;
            }
            _ => {}
        }
    }

    /// Divider dragging across a terminal `total_width` columns wide.
    pub fn on_mouse(&mut self, mouse: MouseEvent, total_width: u16) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if mouse.column.abs_diff(self.divider_x) <= 1 {
                    self.is_resizing = true;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.is_resizing && total_width > 0 => {
                let pct = (mouse.column as u32 * 100 / total_width as u32) as u16;
                self.left_pane_width_percentage = pct.clamp(15, 85);
            }
            MouseEventKind::Up(MouseButton::Left) => self.is_resizing = false,
            _ => {}
        }
    }

    /// Keeps the selected row inside the visible window of the list.
    pub fn clamp_scroll(&mut self, visible_rows: usize) {
        if visible_rows == 0 {
            return;
        }
        if self.selected_region_index < self.scroll_offset {
            self.scroll_offset = self.selected_region_index;
        } else if self.selected_region_index >= self.scroll_offset + visible_rows {
            self.scroll_offset = self.selected_region_index + 1 - visible_rows;
        }
    }
}

// Basic fuzzy matching function
pub fn fuzzy_match(pattern: &str, text: &str) -> bool {
    if pattern.is_empty() {
        return true; // Empty pattern matches everything
    }

    let text_lower = text.to_lowercase(); // Case-insensitive search
    let mut text_chars = text_lower.chars();
    pattern
        .to_lowercase()
        .chars()
        .all(|p_char| text_chars.any(|t_char| t_char == p_char))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gewog_hazard_mapper::features::Feature;

    fn app_with(regions: &[&str]) -> App {
        let features = regions
            .iter()
            .map(|r| Feature {
                region: Some(r.to_string()),
                ..Feature::default()
            })
            .collect();
        App::new(Settings::default(), RegionIndex::build(features))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn fuzzy_match_is_subsequence() {
        assert!(fuzzy_match("", "Paro"));
        assert!(fuzzy_match("tsy", "Trashiyangtse"));
        assert!(fuzzy_match("PR", "paro"));
        assert!(!fuzzy_match("xp", "Paro"));
    }

    #[test]
    fn search_filters_region_list() {
        let mut app = app_with(&["Bumthang", "Paro", "Punakha"]);
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.filtered_region_indices, vec![2]);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.filtered_region_indices.len(), 3);
        assert!(app.current_mode == AppMode::Navigation);
    }

    #[test]
    fn enter_selects_and_escape_clears() {
        let mut app = app_with(&["Bumthang", "Paro"]);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view.region.as_deref(), Some("Paro"));
        assert!(app.take_overlay_request().is_some());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view.region, None);
        assert!(app.coordinator.scene().is_none());
    }

    #[test]
    fn attribute_and_mode_keys_update_view() {
        let mut app = app_with(&["Paro"]);
        app.select_first_region();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.view.attribute.key, "_E Loss M (in BTN million)");
        press(&mut app, KeyCode::Char('d'));
        assert!(!app.coordinator.legend().visible);
    }
}
