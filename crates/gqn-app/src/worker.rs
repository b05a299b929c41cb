use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use anyhow::{Context, anyhow};
use burn::prelude::{Backend, Device};
use burn_ndarray::{NdArray, NdArrayDevice};
use burn_wgpu::{Wgpu, WgpuDevice};
use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

use gqn_data::Dataset;
use gqn_model::snapshot::load_snapshot;

use crate::cli::Args;
use crate::session::{FrameSink, Session, SessionEnd};

#[derive(Debug)]
pub enum WorkerResponse {
    Frame { axis: usize, image: RgbImage },
    Status(String),
    Finished,
    Error(String),
}

/// Sends frames to the window thread; closed once the window is gone
pub struct ChannelSink {
    response_tx: SyncSender<WorkerResponse>,
    closed: Arc<AtomicBool>,
}

impl ChannelSink {
    pub fn new(response_tx: SyncSender<WorkerResponse>, closed: Arc<AtomicBool>) -> Self {
        Self {
            response_tx,
            closed,
        }
    }
}

impl FrameSink for ChannelSink {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn update(&mut self, axis: usize, image: RgbImage) {
        if self.response_tx.send(WorkerResponse::Frame { axis, image }).is_err() {
            self.closed.store(true, Ordering::Release);
        }
    }
}

/// Background thread running the render session
pub struct RenderWorker {
    response_rx: Option<Receiver<WorkerResponse>>,
    closed: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn(args: Args) -> Self {
        // One frame of query and generated images
        let capacity = 2 * args.batch_size.max(1);

        Self::spawn_job(capacity, move |resp_tx, sink| {
            if args.use_gpu() {
                let device = WgpuDevice::DiscreteGpu(args.gpu_device as usize);
                run_viewer::<Wgpu>(&args, device, resp_tx, sink)
            } else {
                run_viewer::<NdArray>(&args, NdArrayDevice::Cpu, resp_tx, sink)
            }
        })
    }

    fn spawn_job<F>(capacity: usize, job: F) -> Self
    where
        F: FnOnce(&SyncSender<WorkerResponse>, &mut ChannelSink) -> anyhow::Result<SessionEnd>
            + Send
            + 'static,
    {
        let (resp_tx, resp_rx) = sync_channel::<WorkerResponse>(capacity);
        let closed = Arc::new(AtomicBool::new(false));
        let worker_closed = closed.clone();

        let thread_handle = thread::spawn(move || {
            let mut sink = ChannelSink::new(resp_tx.clone(), worker_closed);
            let result = panic::catch_unwind(AssertUnwindSafe(|| job(&resp_tx, &mut sink)));

            let response = match result {
                Ok(Ok(SessionEnd::Completed)) => WorkerResponse::Finished,
                Ok(Ok(SessionEnd::WindowClosed)) => return,
                Ok(Err(e)) => {
                    log::error!("Render worker failed: {e:#}");
                    WorkerResponse::Error(format!("{e:#}"))
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    log::error!("Render worker panicked: {message}");
                    WorkerResponse::Error(format!("Render worker panicked: {message}"))
                }
            };
            let _ = resp_tx.send(response);
        });

        Self {
            response_rx: Some(resp_rx),
            closed,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn try_recv_response(&self) -> Option<WorkerResponse> {
        self.response_rx.as_ref()?.try_recv().ok()
    }

    /// Whether the worker thread has exited, with or without a response
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }

    /// Signal the session to stop and wait for the in-flight frame
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::Release);
        // Unblocks a worker waiting on a full channel
        self.response_rx.take();

        if let Some(handle) = self.thread_handle.take() {
            handle.join().map_err(|payload| {
                anyhow!("Render worker panicked: {}", panic_message(&*payload))
            })?;
        }
        Ok(())
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("{e:#}");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_viewer<B: Backend>(
    args: &Args,
    device: Device<B>,
    resp_tx: &SyncSender<WorkerResponse>,
    sink: &mut ChannelSink,
) -> anyhow::Result<SessionEnd> {
    let _ = resp_tx.send(WorkerResponse::Status("Loading snapshot...".into()));
    let model = load_snapshot::<B>(&args.snapshot_path, &device)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot_path.display()))?;

    let dataset = Dataset::open(&args.dataset_path)
        .with_context(|| format!("Failed to open dataset {}", args.dataset_path.display()))?;

    log::debug!("Subsets: {}", dataset.subset_names().join(", "));

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let _ = resp_tx.send(WorkerResponse::Status(format!(
        "Rendering {} subsets",
        dataset.len()
    )));

    let mut session = Session::new(&model, device, args.batch_size);
    let end = session.run(dataset, sink, &mut rng)?;
    Ok(end)
}
