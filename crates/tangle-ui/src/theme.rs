//! UI theme constants

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(18, 18, 22);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(32, 32, 38);
pub const BG_SURFACE: Color32 = Color32::from_rgb(46, 46, 54);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(232, 232, 236);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(152, 152, 164);
pub const ACCENT: Color32 = Color32::from_rgb(147, 91, 236);
pub const SUCCESS: Color32 = Color32::from_rgb(52, 199, 118);
pub const ERROR: Color32 = Color32::from_rgb(235, 87, 87);
pub const WARNING: Color32 = Color32::from_rgb(242, 182, 54);

pub const USER_BUBBLE: Color32 = Color32::from_rgb(54, 88, 170);
pub const MODEL_BUBBLE: Color32 = Color32::from_rgb(38, 38, 46);
pub const ERROR_BUBBLE: Color32 = Color32::from_rgb(56, 24, 26);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(8);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply the dark theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_SECONDARY;
    style.visuals.extreme_bg_color = BG_SECONDARY;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = BG_SURFACE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.35);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}
