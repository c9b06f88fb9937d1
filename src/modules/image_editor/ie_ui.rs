use eframe::egui;
use crate::modules::controller::DocumentStatus;
use crate::modules::processor::{FlipAxis, Operation, Rotation};
use crate::style::{self, ColorPalette, ThemeMode};
use super::ie_main::{ImageEditor, NoticeKind, PreviewSource, BLUR_RANGE, BRIGHTNESS_RANGE, CONTRAST_RANGE, EDGE_RANGE, SIZE_RANGE};

const ROW_HEIGHT: f32 = 26.0;

impl ImageEditor {
    pub fn render_controls(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        let (fill, border, muted) = style::panel_colors(theme);
        let enabled: bool = self.has_image();

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui: &mut egui::Ui| {
            ui.add_enabled_ui(enabled, |ui: &mut egui::Ui| {
                ui.spacing_mut().slider_width = (ui.available_width() - 90.0).max(80.0);

                section(ui, "FILTERS", fill, border, muted, |ui| {
                    if full_button(ui, "Grayscale").clicked() { self.apply(Operation::Grayscale); }
                    ui.add(egui::Slider::new(&mut self.edge_low, EDGE_RANGE).step_by(1.0).text("Low"));
                    ui.add(egui::Slider::new(&mut self.edge_high, EDGE_RANGE).step_by(1.0).text("High"));
                    if full_button(ui, "Edge Detect").clicked() { self.apply_edges(); }
                });

                section(ui, "ROTATE", fill, border, muted, |ui| {
                    if let Some(i) = button_row(ui, &["90°", "180°", "270°"]) {
                        match Rotation::from_degrees(90 * (i as i32 + 1)) {
                            Ok(rotation) => { self.apply(Operation::Rotate(rotation)); }
                            Err(e) => self.report(e),
                        }
                    }
                });

                section(ui, "FLIP", fill, border, muted, |ui| {
                    match button_row(ui, &["Horizontal", "Vertical"]) {
                        Some(0) => { self.apply(Operation::Flip(FlipAxis::Horizontal)); }
                        Some(_) => { self.apply(Operation::Flip(FlipAxis::Vertical)); }
                        None => {}
                    }
                });

                section(ui, "RESIZE", fill, border, muted, |ui| {
                    ui.horizontal(|ui: &mut egui::Ui| {
                        ui.label(egui::RichText::new("W").color(muted));
                        if ui.add(egui::DragValue::new(&mut self.resize_w).range(SIZE_RANGE)).changed() { self.sync_resize(true); }
                        ui.label(egui::RichText::new("H").color(muted));
                        if ui.add(egui::DragValue::new(&mut self.resize_h).range(SIZE_RANGE)).changed() { self.sync_resize(false); }
                    });
                    ui.checkbox(&mut self.resize_locked, "Keep aspect ratio");
                    if full_button(ui, "Resize").clicked() { self.apply_resize(); }
                });

                section(ui, "ADJUSTMENTS", fill, border, muted, |ui| {
                    if ui.add(egui::Slider::new(&mut self.blur_radius, BLUR_RANGE).step_by(0.5).text("Blur")).changed() {
                        self.refresh_preview(PreviewSource::Blur);
                    }
                    if style::primary_button(ui, "Apply Blur", true).clicked() { self.apply_blur(); }
                    ui.add_space(6.0);
                    let bright = ui.add(egui::Slider::new(&mut self.brightness, BRIGHTNESS_RANGE).step_by(1.0).text("Brightness"));
                    let contrast = ui.add(egui::Slider::new(&mut self.contrast, CONTRAST_RANGE).step_by(0.05).text("Contrast"));
                    if bright.changed() || contrast.changed() { self.refresh_preview(PreviewSource::Adjust); }
                    if style::primary_button(ui, "Apply Bright/Contrast", true).clicked() { self.apply_brightness_contrast(); }
                    if full_button(ui, "Reset Sliders").clicked() { self.reset_sliders(); }
                });

                section(ui, "HISTORY", fill, border, muted, |ui| {
                    let undo_tip: String = self.controller.undo_label().map_or_else(|| "Nothing to undo".to_string(), |l| format!("Undo {l}"));
                    let redo_tip: String = self.controller.redo_label().map_or_else(|| "Nothing to redo".to_string(), |l| format!("Redo {l}"));
                    ui.horizontal(|ui: &mut egui::Ui| {
                        let width: f32 = (ui.available_width() - ui.spacing().item_spacing.x) / 2.0;
                        if ui.add_sized([width, ROW_HEIGHT], egui::Button::new("Undo")).on_hover_text(undo_tip).clicked() { self.undo(); }
                        if ui.add_sized([width, ROW_HEIGHT], egui::Button::new("Redo")).on_hover_text(redo_tip).clicked() { self.redo(); }
                    });
                });
            });
        });
    }

    pub fn render_canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        self.ensure_texture(ctx);
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        let painter: egui::Painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        match &self.texture {
            Some(texture) => {
                let img_rect: egui::Rect = fit_rect(rect.shrink(8.0), texture.size_vec2());
                painter.image(texture.id(), img_rect, egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)), egui::Color32::WHITE);
                painter.rect_stroke(img_rect, 0.0, egui::Stroke::new(1.0, ColorPalette::ZINC_500), egui::StrokeKind::Outside);
                if self.preview.is_some() {
                    painter.text(rect.left_top() + egui::vec2(12.0, 10.0), egui::Align2::LEFT_TOP, "Preview",
                        egui::FontId::proportional(12.0), ColorPalette::AMBER_400);
                }
            }
            None => {
                painter.text(rect.center(), egui::Align2::CENTER_CENTER, "Open an image to begin (Ctrl+O)",
                    egui::FontId::proportional(16.0), ui.visuals().weak_text_color());
            }
        }
    }

    pub fn render_status_bar(&self, ui: &mut egui::Ui, theme: ThemeMode) {
        let muted: egui::Color32 = if matches!(theme, ThemeMode::Dark) { ColorPalette::ZINC_400 } else { ColorPalette::GRAY_600 };
        let status: Option<DocumentStatus> = self.controller.status();
        ui.horizontal(|ui: &mut egui::Ui| {
            ui.label(egui::RichText::new(status_line(status.as_ref())).size(12.0).color(muted));
            if status.as_ref().is_some_and(|s| s.dirty) {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut egui::Ui| {
                    ui.label(egui::RichText::new("Unsaved changes").size(12.0).color(ColorPalette::AMBER_600));
                });
            }
        });
    }

    pub fn render_notice(&mut self, ctx: &egui::Context, theme: ThemeMode) {
        let Some(notice) = &self.notice else { return };
        let (bg, text) = if matches!(theme, ThemeMode::Dark) {
            (ColorPalette::ZINC_800, ColorPalette::ZINC_100)
        } else {
            (egui::Color32::WHITE, ColorPalette::GRAY_900)
        };
        let accent: egui::Color32 = match notice.kind {
            NoticeKind::Info => ColorPalette::BLUE_500,
            NoticeKind::Warning => ColorPalette::AMBER_600,
            NoticeKind::Error => if matches!(theme, ThemeMode::Dark) { ColorPalette::RED_400 } else { ColorPalette::RED_600 },
        };

        let mut dismissed: bool = false;
        egui::Window::new(egui::RichText::new(notice.title.as_str()).color(accent))
            .id(egui::Id::new("notice_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .order(egui::Order::Tooltip)
            .min_width(300.0)
            .frame(egui::Frame::new().fill(bg).stroke(egui::Stroke::new(1.5, accent)).corner_radius(8.0).inner_margin(20.0))
            .show(ctx, |ui: &mut egui::Ui| {
                ui.label(egui::RichText::new(notice.message.as_str()).size(14.0).color(text));
                ui.add_space(16.0);
                if style::primary_button(ui, "OK", true).clicked() { dismissed = true; }
            });

        if dismissed || ctx.input(|i| i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Escape)) {
            self.notice = None;
        }
    }
}

fn section(ui: &mut egui::Ui, title: &str, fill: egui::Color32, border: egui::Color32, muted: egui::Color32, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::new()
        .fill(fill).stroke(egui::Stroke::new(1.0, border))
        .corner_radius(6.0)
        .inner_margin(10.0)
        .show(ui, |ui: &mut egui::Ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).size(11.0).color(muted));
            add_contents(ui);
        });
    ui.add_space(6.0);
}

fn full_button(ui: &mut egui::Ui, text: &str) -> egui::Response {
    ui.add_sized([ui.available_width(), ROW_HEIGHT], egui::Button::new(text))
}

/// Equal-width buttons on one line; returns the index of the clicked one.
fn button_row(ui: &mut egui::Ui, labels: &[&str]) -> Option<usize> {
    let mut clicked: Option<usize> = None;
    ui.horizontal(|ui: &mut egui::Ui| {
        let gaps: f32 = ui.spacing().item_spacing.x * (labels.len().saturating_sub(1)) as f32;
        let width: f32 = (ui.available_width() - gaps) / labels.len().max(1) as f32;
        for (i, label) in labels.iter().enumerate() {
            if ui.add_sized([width, ROW_HEIGHT], egui::Button::new(*label)).clicked() { clicked = Some(i); }
        }
    });
    clicked
}

/// Largest rect with the image's aspect ratio that fits inside `canvas`, centred.
pub(super) fn fit_rect(canvas: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 || canvas.width() <= 0.0 || canvas.height() <= 0.0 {
        return egui::Rect::from_center_size(canvas.center(), egui::Vec2::ZERO);
    }
    let scale: f32 = (canvas.width() / image_size.x).min(canvas.height() / image_size.y);
    egui::Rect::from_center_size(canvas.center(), image_size * scale)
}

pub(super) fn status_line(status: Option<&DocumentStatus>) -> String {
    let Some(s) = status else { return "No image loaded.".to_string() };
    let path: String = s.path.as_ref().map_or_else(|| "(unsaved)".to_string(), |p| p.display().to_string());
    format!(
        "Image: {} | Path: {} | Size: {}x{}px | Last: {} | Undo {} / Redo {}",
        s.file_name, path, s.width, s.height, s.last_operation, s.undo_depth, s.redo_depth
    )
}
