// ui.rs

use geo::MultiPolygon;
use plotters::prelude::RGBColor;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Context, Line as CanvasLine},
    },
};

use gewog_hazard_mapper::legend::BUILDING_ROW_LABEL;
use gewog_hazard_mapper::render::{Scene, popup_lines};
use gewog_hazard_mapper::schema::MISSING;

use crate::app::{App, AppMode, CurrentScreen};

pub fn render(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)]) // Main content, then footer
        .split(frame.size());

    match app.current_screen {
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[0]),
        CurrentScreen::Map => render_map_ui(frame, app, main_layout[0]),
    }

    // Render the footer, common across all screens
    render_footer(frame, app, main_layout[1]);
}

fn rgb(color: RGBColor) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// Renders the help screen.
fn render_help_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = vec![Line::from("Keybinds:")];
    lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {s}"))));
    lines.push(Line::from(""));
    lines.push(Line::from("Press h, q or Esc to return to the map."));

    let help_text = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));

    frame.render_widget(help_text, area);
}

fn render_map_ui(frame: &mut Frame, app: &mut App, area: Rect) {
    // Main vertical layout: Notification/Search, then Main Content
    let main_layout_constraints = if app.current_mode == AppMode::Searching {
        vec![
            Constraint::Length(1), // Notification
            Constraint::Length(1), // Search bar
            Constraint::Min(0),    // Main content area
        ]
    } else {
        vec![
            Constraint::Length(1), // Notification
            Constraint::Min(0),    // Main content area
        ]
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(main_layout_constraints)
        .split(area);

    let mut current_chunk_idx = 0;

    // Notification Area
    let notification_paragraph = Paragraph::new(app.notification.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(notification_paragraph, chunks[current_chunk_idx]);
    current_chunk_idx += 1;

    // Search Bar (conditional)
    if app.current_mode == AppMode::Searching {
        let search_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(8), // "Search:" label
                Constraint::Min(0),    // Input field
            ])
            .split(chunks[current_chunk_idx]);

        let search_label = Paragraph::new("Search:").style(Style::default().fg(Color::LightCyan));
        frame.render_widget(search_label, search_layout[0]);

        let search_input_paragraph = Paragraph::new(app.search_query_buffer.clone())
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(search_input_paragraph, search_layout[1]);

        let cursor_col = app.search_query_buffer[..app.search_query_cursor].chars().count() as u16;
        frame.set_cursor(search_layout[1].x + cursor_col, search_layout[1].y);
        current_chunk_idx += 1;
    }

    // Main Content Area (Left Panel + Right Panels)
    let main_content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(app.left_pane_width_percentage), // Dynamically sized left pane
            Constraint::Percentage(100 - app.left_pane_width_percentage), // Dynamically sized right pane
        ])
        .split(chunks[current_chunk_idx]);

    render_region_list(frame, app, main_content_layout[0]);

    let right_panel_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55), // Map preview
            Constraint::Min(0),         // Legend + gewog details
        ])
        .split(main_content_layout[1]);
    render_map_preview(frame, app, right_panel_chunks[0]);

    let lower_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(right_panel_chunks[1]);
    render_legend(frame, app, lower_chunks[0]);
    render_gewogs(frame, app, lower_chunks[1]);

    // divider for resizing the main panels
    let divider_x_pos = main_content_layout[0].x + main_content_layout[0].width;
    app.divider_x = divider_x_pos;
    if main_content_layout[1].width > 0 {
        for y in main_content_layout[0].y..(main_content_layout[0].y + main_content_layout[0].height) {
            let style = if app.is_resizing {
                Style::default().bg(Color::LightRed)
            } else {
                Style::default().bg(Color::DarkGray)
            };
            frame
                .buffer_mut()
                .get_mut(divider_x_pos, y)
                .set_symbol("│")
                .set_style(style);
        }
    }
}

fn render_region_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let left_panel_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(0),    // Region list
        ])
        .split(area);

    let title = Paragraph::new(format!(
        " Dzongkhags ({} gewogs): ",
        app.index.feature_count()
    ))
    .style(Style::default().fg(Color::LightGreen).bold());
    frame.render_widget(title, left_panel_chunks[0]);

    let max_visible_items_in_list = left_panel_chunks[1].height.saturating_sub(2) as usize;
    app.clamp_scroll(max_visible_items_in_list);
    let end_display_index =
        (app.scroll_offset + max_visible_items_in_list).min(app.filtered_region_indices.len());

    let mut list_items: Vec<Line> = Vec::new();
    for i in app.scroll_offset..end_display_index {
        let original_index = app.filtered_region_indices[i];
        let region = &app.regions[original_index];
        let shown = app.view.region.as_deref() == Some(region.as_str());
        let display_text = format!(
            "{} {}. {} ({})",
            if shown { "[x]" } else { "[ ]" },
            original_index + 1,
            region,
            app.index.features_in(region).len()
        );
        let mut style = Style::default().fg(Color::White);
        if i == app.selected_region_index {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        if shown {
            style = style.fg(Color::LightYellow);
        }
        list_items.push(Line::from(vec![Span::styled(display_text, style)]));
    }

    let list_paragraph = Paragraph::new(list_items)
        .block(Block::default().borders(Borders::ALL).title("Dzongkhag"))
        .wrap(Wrap { trim: false });
    frame.render_widget(list_paragraph, left_panel_chunks[1]);
}

fn render_map_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Map ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));

    let Some(scene) = app.coordinator.scene() else {
        let message = if app.view.region.is_some() {
            "No gewogs for this dzongkhag."
        } else {
            "No dzongkhag selected."
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block)
                .style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    };
    let Some(viewport) = scene.viewport else {
        frame.render_widget(
            Paragraph::new("Gewogs have no outlines to draw.")
                .block(block)
                .style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    };

    let highlighted = app.highlighted_gewog;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([viewport.min_x, viewport.max_x])
        .y_bounds([viewport.min_y, viewport.max_y])
        .paint(|ctx| paint_scene(ctx, scene, highlighted));
    frame.render_widget(canvas, area);
}

fn paint_scene(ctx: &mut Context, scene: &Scene, highlighted: usize) {
    if let Some(buildings) = scene.buildings() {
        let color = rgb(buildings.style.fill);
        for footprint in &buildings.footprints {
            draw_outline(ctx, footprint, color);
        }
        ctx.layer();
    }
    for (i, gewog) in scene.gewogs().iter().enumerate() {
        if let Some(geometry) = &gewog.feature.geometry {
            let color = if i == highlighted {
                Color::White
            } else {
                rgb(gewog.style.fill)
            };
            draw_outline(ctx, geometry, color);
        }
    }
    ctx.layer();
    for label in scene.labels() {
        ctx.print(label.position.x, label.position.y, label.text.clone());
    }
}

fn draw_outline(ctx: &mut Context, geometry: &MultiPolygon<f64>, color: Color) {
    for polygon in &geometry.0 {
        for segment in polygon.exterior().0.windows(2) {
            ctx.draw(&CanvasLine {
                x1: segment[0].x,
                y1: segment[0].y,
                x2: segment[1].x,
                y2: segment[1].y,
                color,
            });
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Legend ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightYellow));

    let legend = app.coordinator.legend();
    let mut lines: Vec<Line> = Vec::new();
    if !legend.visible {
        lines.push(Line::from("Outline-only display: legend hidden.").fg(Color::Gray));
    } else {
        lines.push(Line::from(legend.title.clone()).bold());
        lines.push(Line::from(legend.caption.clone()).fg(Color::Gray));
        for item in &legend.items {
            lines.push(Line::from(vec![
                Span::styled("██ ", Style::default().fg(rgb(item.color))),
                Span::raw(item.label.clone()),
            ]));
        }
        if legend.show_buildings {
            lines.push(Line::from(vec![
                Span::styled("██ ", Style::default().fg(Color::Rgb(0x3b, 0x82, 0xf6))),
                Span::raw(BUILDING_ROW_LABEL),
            ]));
        }
    }
    if let Some(batch) = &app.batch {
        let (done, total) = batch.progress();
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Export: {done}/{total}")).fg(Color::LightMagenta));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_gewogs(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let attribute = app.view.attribute;
    let visible_rows = chunks[0].height.saturating_sub(2) as usize;
    let first = app.highlighted_gewog.saturating_sub(visible_rows.saturating_sub(1));
    let items: Vec<Line> = app
        .gewogs()
        .iter()
        .enumerate()
        .skip(first)
        .take(visible_rows)
        .map(|(i, g)| {
            let name = g.feature.name.as_deref().unwrap_or(MISSING);
            let mut style = Style::default().fg(Color::White);
            if i == app.highlighted_gewog {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(rgb(g.style.fill))),
                Span::styled(format!("{name}  {}", attribute.format_value(g.value)), style),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(items).block(
            Block::default()
                .title(" Gewogs ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightCyan)),
        ),
        chunks[0],
    );

    let details: Vec<Line> = match app.highlighted() {
        Some(g) => popup_lines(&g.feature).into_iter().map(Line::from).collect(),
        None => vec![Line::from(MISSING)],
    };
    frame.render_widget(
        Paragraph::new(details)
            .block(
                Block::default()
                    .title(" Gewog details ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightCyan)),
            )
            .wrap(Wrap { trim: false }),
        chunks[1],
    );
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &mut App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::Map => "Map",
        CurrentScreen::Help => "Help",
    };

    let current_mode_name = match app.current_mode {
        AppMode::Navigation => "Navigation",
        AppMode::Searching => "Searching",
    };

    let footer_text = Line::from(vec![
        Span::raw("Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Mode: "),
        Span::styled(
            current_mode_name,
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Attribute: "),
        Span::styled(
            app.view.attribute.label,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "h",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}
