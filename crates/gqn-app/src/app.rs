use std::sync::Arc;

use egui_wgpu::wgpu;
use egui_winit::State as EguiState;
use winit::event::WindowEvent;
use winit::window::Window;

use gqn_core::layout::FigureLayout;

use crate::gfx::GfxState;
use crate::ui::{self, Figure};
use crate::worker::{RenderWorker, WorkerResponse};

/// How the render worker ended, once it has
pub(crate) enum Outcome {
    Finished,
    Failed(String),
}

pub(crate) struct App {
    pub(crate) window: Arc<Window>,
    pub(crate) gfx: GfxState,
    egui_state: EguiState,
    egui_renderer: egui_wgpu::Renderer,
    figure: Figure,
    worker: RenderWorker,
    status: String,
    pub(crate) outcome: Option<Outcome>,
}

impl App {
    pub(crate) async fn new(
        window: Arc<Window>,
        layout: FigureLayout,
        worker: RenderWorker,
    ) -> anyhow::Result<Self> {
        let gfx = GfxState::new(window.clone()).await?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &*window,
            None,
            None,
            None
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gfx.device,
            gfx.config.format,
            egui_wgpu::RendererOptions::default()
        );

        Ok(Self {
            window,
            gfx,
            egui_state,
            egui_renderer,
            figure: Figure::new(layout),
            worker,
            status: "Starting...".into(),
            outcome: None,
        })
    }

    pub(crate) fn input(&mut self, event: &WindowEvent) -> bool {
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    /// Pull everything the worker produced since the last redraw
    pub(crate) fn update(&mut self) {
        let ctx = self.egui_state.egui_ctx().clone();
        // Checked before draining so a final response is never missed
        let worker_exited = self.worker.is_finished();

        while let Some(response) = self.worker.try_recv_response() {
            match response {
                WorkerResponse::Frame { axis, image } => {
                    self.figure.update(&ctx, axis, &image);
                }
                WorkerResponse::Status(status) => {
                    log::info!("{status}");
                    self.status = status;
                }
                WorkerResponse::Finished => {
                    self.status = "Done".into();
                    self.outcome = Some(Outcome::Finished);
                }
                WorkerResponse::Error(err) => {
                    self.status = format!("Error: {err}");
                    self.outcome = Some(Outcome::Failed(err));
                }
            }
        }

        if worker_exited && self.outcome.is_none() {
            let err = "Render worker stopped without reporting a result".to_string();
            self.status = format!("Error: {err}");
            self.outcome = Some(Outcome::Failed(err));
        }
    }

    /// Stop the worker before the window goes away
    pub(crate) fn close(&mut self) -> anyhow::Result<()> {
        self.update();
        self.worker.shutdown()
    }

    pub(crate) fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gfx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gfx.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            }
        );

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let full_output = self.egui_state.egui_ctx().run(raw_input, |ctx| {
            ui::draw_ui(ctx, &self.figure, &self.status);
        });

        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self.egui_state
            .egui_ctx()
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.size.width, self.gfx.size.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(
                &self.gfx.device,
                &self.gfx.queue,
                *id,
                image_delta,
            );
        }

        let callback_buffers = self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer.render(&mut render_pass.forget_lifetime(), &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.gfx.queue.submit(
            callback_buffers.into_iter().chain(std::iter::once(encoder.finish()))
        );
        output.present();

        Ok(())
    }

    pub(crate) fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }
}
