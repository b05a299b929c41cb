use egui::{Color32, Context, RichText, TextureHandle, TextureOptions};
use image::RgbImage;

use gqn_core::layout::FigureLayout;

/// Grid of query / generated image axes
pub struct Figure {
    layout: FigureLayout,
    axes: Vec<Option<TextureHandle>>,
}

impl Figure {
    pub fn new(layout: FigureLayout) -> Self {
        let axes = (0..layout.axis_count()).map(|_| None).collect();
        Self { layout, axes }
    }

    pub fn update(&mut self, ctx: &Context, axis: usize, image: &RgbImage) {
        let Some(slot) = self.axes.get_mut(axis) else {
            log::warn!("Dropping frame for unknown axis {axis}");
            return;
        };

        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, image.as_raw());
        if let Some(handle) = slot.as_mut() {
            handle.set(color_image, TextureOptions::NEAREST);
            return;
        }
        *slot = Some(ctx.load_texture(format!("axis-{axis}"), color_image, TextureOptions::NEAREST));
    }
}

pub fn draw_ui(ctx: &Context, figure: &Figure, status: &str) {
    egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
        ui.label(RichText::new(status).color(Color32::LIGHT_BLUE));
    });

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(Color32::BLACK))
        .show(ctx, |ui| {
            let area = ui.max_rect();
            for (axis, texture) in figure.axes.iter().enumerate() {
                let Some(texture) = texture else { continue };

                let rect = figure.layout.rect(axis);
                let min = area.min
                    + egui::vec2(rect.x * area.width(), rect.y * area.height());
                let size = egui::vec2(rect.width * area.width(), rect.height * area.height());
                ui.put(
                    egui::Rect::from_min_size(min, size),
                    egui::Image::new(texture).fit_to_exact_size(size),
                );
            }
        });
}
