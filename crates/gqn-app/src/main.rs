mod app;
mod cli;
mod gfx;
mod session;
mod ui;
mod worker;

use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use egui_wgpu::wgpu;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use gqn_core::layout::FigureLayout;

use crate::app::{App, Outcome};
use crate::cli::Args;
use crate::worker::RenderWorker;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    log::info!(
        "Dataset {}, snapshot {}, batch size {}, {}",
        args.dataset_path.display(),
        args.snapshot_path.display(),
        args.batch_size,
        if args.use_gpu() { format!("GPU {}", args.gpu_device) } else { "host".to_string() }
    );

    let event_loop = EventLoop::new()?;
    let window = Arc::new(event_loop.create_window(
        Window::default_attributes()
            .with_title("Generated images")
            .with_inner_size(winit::dpi::LogicalSize::new(1600, 800))
    )?);

    let layout = FigureLayout::new(args.batch_size);
    let worker = RenderWorker::spawn(args);
    let mut app = pollster::block_on(App::new(window.clone(), layout, worker))?;

    event_loop.run(|event, control_flow| {
        match event {
            Event::WindowEvent { ref event, .. } => {
                if app.input(event) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event: KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        app.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        app.update();
                        if app.outcome.is_some() {
                            control_flow.exit();
                            return;
                        }
                        match app.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => app.resize(app.gfx.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{e:?}"),
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    app.close()?;
    match app.outcome.take() {
        Some(Outcome::Failed(err)) => bail!(err),
        _ => Ok(()),
    }
}
