use eframe::egui;
use crate::modules::image_editor::{ImageEditor, Notice};
use crate::modules::processor::{FlipAxis, Operation, Rotation};
use crate::settings::{AppSettings, HISTORY_LIMIT_RANGE, RecentFiles, ThemePreference};
use crate::style::{self, ColorPalette, ThemeMode};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, sync_channel};
use tracing::info;

const ABOUT_TEXT: &str = "Slate Editor\n\n\
    Open, edit and save JPG, PNG and BMP images.\n\n\
    \u{2022} Grayscale, edge detection, rotate, flip, resize\n\
    \u{2022} Blur, brightness and contrast with live preview\n\
    \u{2022} Undo and redo for every edit\n\n\
    Shortcuts:\n\
    Ctrl+O Open, Ctrl+S Save, Ctrl+Shift+S Save As\n\
    Ctrl+Z Undo, Ctrl+Y or Ctrl+Shift+Z Redo";

/// Something the user asked for that has to wait for the unsaved-changes prompt.
#[derive(Debug, Clone, PartialEq)]
enum PendingAction { Open(Option<PathBuf>), Exit }

pub struct EditorApp {
    editor: ImageEditor,
    settings: AppSettings,
    theme_mode: ThemeMode,
    recent_files: RecentFiles,
    recent_file_rx: Receiver<PathBuf>,
    pending_action: Option<PendingAction>,
    show_unsaved_dialog: bool,
    show_settings: bool,
    show_about: bool,
    allow_close: bool,
}

fn system_theme(ctx: &egui::Context) -> ThemeMode {
    match ctx.theme() {
        egui::Theme::Dark => ThemeMode::Dark,
        egui::Theme::Light => ThemeMode::Light,
    }
}

impl EditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: AppSettings = AppSettings::load();
        let theme_mode: ThemeMode = match settings.theme_preference {
            ThemePreference::System => system_theme(&cc.egui_ctx),
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
        };
        style::apply_theme(&cc.egui_ctx, theme_mode);

        let (tx, rx) = sync_channel(20);
        let mut editor: ImageEditor = ImageEditor::new(settings.history_limit, settings.jpeg_quality);
        editor.set_file_callback(Box::new(move |path: PathBuf| { let _ = tx.try_send(path); }));
        info!(history_limit = settings.history_limit, jpeg_quality = settings.jpeg_quality, "editor started");

        Self {
            editor,
            settings,
            theme_mode,
            recent_files: RecentFiles::load(),
            recent_file_rx: rx,
            pending_action: None,
            show_unsaved_dialog: false,
            show_settings: false,
            show_about: false,
            allow_close: false,
        }
    }

    /// Runs `action` now, or after the unsaved-changes prompt when the image has edits.
    fn request(&mut self, action: PendingAction, ctx: &egui::Context) {
        if self.editor.is_dirty() {
            self.pending_action = Some(action);
            self.show_unsaved_dialog = true;
        } else {
            self.execute(action, ctx);
        }
    }

    fn execute(&mut self, action: PendingAction, ctx: &egui::Context) {
        match action {
            PendingAction::Open(Some(path)) => {
                if !path.exists() {
                    self.recent_files.remove_file(&path);
                    self.editor.show_notice(Notice::info("Open Recent", format!("{} no longer exists.", path.display())));
                    return;
                }
                self.editor.open_path(path);
            }
            PendingAction::Open(None) => { self.editor.open_dialog(); }
            PendingAction::Exit => {
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn save_settings(&self) { self.settings.save(); }

    fn set_theme(&mut self, preference: ThemePreference, ctx: &egui::Context) {
        self.settings.theme_preference = preference;
        self.theme_mode = match preference {
            ThemePreference::System => system_theme(ctx),
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
        };
        style::apply_theme(ctx, self.theme_mode);
        self.save_settings();
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if self.show_unsaved_dialog { return; }
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::CTRL, egui::Key::O)) {
            self.request(PendingAction::Open(None), ctx);
        }
        self.editor.handle_keyboard(ctx);
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) { return; }
        if self.allow_close || !self.editor.is_dirty() { return; }
        ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        self.pending_action = Some(PendingAction::Exit);
        self.show_unsaved_dialog = true;
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            egui::MenuBar::new().ui(ui, |ui| {
                let has_image: bool = self.editor.has_image();
                ui.menu_button("File", |ui| {
                    if ui.button("Open... (Ctrl+O)").clicked() {
                        self.request(PendingAction::Open(None), ctx);
                        ui.close();
                    }
                    ui.menu_button("Open Recent", |ui| {
                        let files: Vec<(PathBuf, String)> = self.recent_files.get_files().iter().map(|f| (f.path.clone(), f.opened_at())).collect();
                        if files.is_empty() {
                            ui.label(egui::RichText::new("No recent files").italics());
                        }
                        for (path, opened_at) in files {
                            let name: String = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                            if ui.button(name).on_hover_text(format!("{}\n{opened_at}", path.display())).clicked() {
                                self.request(PendingAction::Open(Some(path)), ctx);
                                ui.close();
                            }
                        }
                        ui.separator();
                        if ui.button("Clear Recent").clicked() {
                            self.recent_files.clear();
                            ui.close();
                        }
                    });
                    ui.separator();
                    if ui.add_enabled(has_image, egui::Button::new("Save (Ctrl+S)")).clicked() {
                        self.editor.save();
                        ui.close();
                    }
                    if ui.add_enabled(has_image, egui::Button::new("Save As... (Ctrl+Shift+S)")).clicked() {
                        self.editor.save_as();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close();
                    }
                    if ui.button("Exit").clicked() {
                        self.request(PendingAction::Exit, ctx);
                        ui.close();
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let undo_text: String = self.editor.controller().undo_label().map_or_else(|| "Undo (Ctrl+Z)".to_string(), |l| format!("Undo {l} (Ctrl+Z)"));
                    let redo_text: String = self.editor.controller().redo_label().map_or_else(|| "Redo (Ctrl+Y)".to_string(), |l| format!("Redo {l} (Ctrl+Y)"));
                    if ui.add_enabled(self.editor.controller().can_undo(), egui::Button::new(undo_text)).clicked() {
                        self.editor.undo();
                        ui.close();
                    }
                    if ui.add_enabled(self.editor.controller().can_redo(), egui::Button::new(redo_text)).clicked() {
                        self.editor.redo();
                        ui.close();
                    }
                    ui.separator();
                    if ui.add_enabled(has_image, egui::Button::new("Reset Sliders")).clicked() {
                        self.editor.reset_sliders();
                        ui.close();
                    }
                });

                ui.menu_button("Image", |ui| {
                    let items: [(&str, Operation); 6] = [
                        ("Grayscale", Operation::Grayscale),
                        ("Rotate 90°", Operation::Rotate(Rotation::Cw90)),
                        ("Rotate 180°", Operation::Rotate(Rotation::Cw180)),
                        ("Rotate 270°", Operation::Rotate(Rotation::Cw270)),
                        ("Flip Horizontal", Operation::Flip(FlipAxis::Horizontal)),
                        ("Flip Vertical", Operation::Flip(FlipAxis::Vertical)),
                    ];
                    for (label, operation) in items {
                        if ui.add_enabled(has_image, egui::Button::new(label)).clicked() {
                            self.editor.apply(operation);
                            ui.close();
                        }
                    }
                    ui.separator();
                    if ui.add_enabled(has_image, egui::Button::new("Edge Detect")).clicked() {
                        self.editor.apply_edges();
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.settings.show_status_bar, "Status Bar").changed() {
                        self.save_settings();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About / Help").clicked() {
                        self.show_about = true;
                        ui.close();
                    }
                });
            });
            ui.add_space(2.0);
        });
    }

    fn render_unsaved_dialog(&mut self, ctx: &egui::Context) {
        if !self.show_unsaved_dialog { return; }

        let (bg_color, border_color, text_color, muted, overlay_color) = if matches!(self.theme_mode, ThemeMode::Dark) {
            (ColorPalette::ZINC_800, ColorPalette::ZINC_700, ColorPalette::ZINC_100, ColorPalette::ZINC_400, egui::Color32::from_rgba_premultiplied(0, 0, 0, 200))
        } else {
            (egui::Color32::WHITE, ColorPalette::GRAY_300, ColorPalette::GRAY_900, ColorPalette::GRAY_600, egui::Color32::from_rgba_premultiplied(0, 0, 0, 150))
        };

        egui::Area::new(egui::Id::new("overlay"))
            .fixed_pos(egui::pos2(0.0, 0.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                ui.painter().rect_filled(ctx.content_rect(), 0.0, overlay_color);
            });

        let mut choice: Option<bool> = None;
        let mut cancelled: bool = false;
        egui::Window::new("Unsaved Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .order(egui::Order::Tooltip)
            .frame(egui::Frame::new().fill(bg_color).stroke(egui::Stroke::new(1.0, border_color)).corner_radius(8.0).inner_margin(24.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("Do you want to save changes?").size(16.0).color(text_color));
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("Your edits will be lost if you don't save them.").size(13.0).color(muted));
                    ui.add_space(24.0);
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 12.0;
                        if style::secondary_button(ui, "Save", self.theme_mode).clicked() { choice = Some(true); }
                        if style::secondary_button(ui, "Don't Save", self.theme_mode).clicked() { choice = Some(false); }
                        if style::secondary_button(ui, "Cancel", self.theme_mode).clicked() { cancelled = true; }
                    });
                    ui.add_space(8.0);
                });
            });

        if cancelled {
            self.show_unsaved_dialog = false;
            self.pending_action = None;
            return;
        }
        let Some(save_first) = choice else { return };
        self.show_unsaved_dialog = false;
        // A failed or cancelled save keeps the edits and drops the action.
        if save_first && !self.editor.save() {
            self.pending_action = None;
            return;
        }
        if let Some(action) = self.pending_action.take() { self.execute(action, ctx); }
    }

    fn render_settings_modal(&mut self, ctx: &egui::Context) {
        if !self.show_settings { return; }
        let (bg, border, muted, text) = if matches!(self.theme_mode, ThemeMode::Dark) {
            (egui::Color32::from_rgb(22, 22, 27), ColorPalette::ZINC_700, ColorPalette::ZINC_500, ColorPalette::SLATE_200)
        } else {
            (egui::Color32::WHITE, ColorPalette::GRAY_200, ColorPalette::GRAY_400, ColorPalette::GRAY_700)
        };

        let mut theme_clicked: Option<ThemePreference> = None;
        let mut prefs_changed: bool = false;
        let mut open: bool = self.show_settings;

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .min_width(380.0)
            .frame(egui::Frame::new().fill(bg).stroke(egui::Stroke::new(1.0, border)).corner_radius(10.0).inner_margin(24.0))
            .open(&mut open)
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("APPEARANCE").size(11.0).color(muted));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Theme").size(14.0).color(text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let pref: ThemePreference = self.settings.theme_preference;
                        if ui.selectable_label(pref == ThemePreference::Dark, "Dark").clicked() { theme_clicked = Some(ThemePreference::Dark); }
                        if ui.selectable_label(pref == ThemePreference::Light, "Light").clicked() { theme_clicked = Some(ThemePreference::Light); }
                        if ui.selectable_label(pref == ThemePreference::System, "System").clicked() { theme_clicked = Some(ThemePreference::System); }
                    });
                });
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Show Status Bar").size(14.0).color(text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.checkbox(&mut self.settings.show_status_bar, "").changed() { prefs_changed = true; }
                    });
                });

                ui.add_space(16.0);
                ui.label(egui::RichText::new("EDITING").size(11.0).color(muted));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Undo steps").size(14.0).color(text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let slider = egui::Slider::new(&mut self.settings.history_limit, HISTORY_LIMIT_RANGE);
                        if ui.add(slider).changed() {
                            self.editor.set_history_limit(self.settings.history_limit);
                            prefs_changed = true;
                        }
                    });
                });
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("JPEG quality").size(14.0).color(text));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(egui::Slider::new(&mut self.settings.jpeg_quality, 1..=100)).changed() {
                            self.editor.set_jpeg_quality(self.settings.jpeg_quality);
                            prefs_changed = true;
                        }
                    });
                });
            });

        self.show_settings = open;
        if let Some(preference) = theme_clicked { self.set_theme(preference, ctx); }
        if prefs_changed { self.save_settings(); }
    }

    fn render_about(&mut self, ctx: &egui::Context) {
        let mut open: bool = self.show_about;
        egui::Window::new("About / Help")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(ABOUT_TEXT);
            });
        self.show_about = open;
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.settings.theme_preference, ThemePreference::System) {
            let theme: ThemeMode = system_theme(ctx);
            if self.theme_mode != theme {
                self.theme_mode = theme;
                style::apply_theme(ctx, self.theme_mode);
            }
        }

        while let Ok(path) = self.recent_file_rx.try_recv() {
            self.recent_files.add_file(path);
        }

        self.handle_close_request(ctx);
        self.handle_keyboard(ctx);

        self.top_bar(ctx);
        if self.settings.show_status_bar {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                self.editor.render_status_bar(ui, self.theme_mode);
            });
        }
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .min_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                self.editor.render_controls(ui, self.theme_mode);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.editor.render_canvas(ui, ctx);
        });

        self.render_unsaved_dialog(ctx);
        self.render_settings_modal(ctx);
        if self.show_about { self.render_about(ctx); }
        self.editor.render_notice(ctx, self.theme_mode);
    }
}
