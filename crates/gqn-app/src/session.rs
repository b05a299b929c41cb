use burn::Tensor;
use burn::prelude::{Backend, Device};
use image::RgbImage;
use ndarray::{Axis, s};
use rand::Rng;

use gqn_core::camera::PerspectiveCamera;
use gqn_core::error::{Error, Result};
use gqn_core::frame::{PixelLayout, to_rgb_image};
use gqn_core::layout::FigureLayout;
use gqn_core::orbit::{OrbitPath, VIEWPOINT_SIZE};
use gqn_data::{BatchIterator, SceneBatch, Subset};
use gqn_model::SceneModel;

/// Where rendered frames go
pub trait FrameSink {
    /// Whether the viewer window has gone away
    fn is_closed(&self) -> bool;

    fn update(&mut self, axis: usize, image: RgbImage);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    WindowClosed,
}

/// Encoder inputs for the first `num_views` views of every scene in a batch
pub struct ObservedViews<B: Backend> {
    /// [batch * num_views, 3, H, W]
    pub images: Tensor<B, 4>,
    /// [batch * num_views, 7]
    pub viewpoints: Tensor<B, 2>,
}

/// Pick how many views to observe and which view to show as reference
pub fn sample_views<R: Rng + ?Sized>(total_views: usize, rng: &mut R) -> Result<(usize, usize)> {
    if total_views == 0 {
        return Err(Error::InvalidDataset("Scenes have no views".to_string()));
    }
    let num_views = rng.random_range(0..total_views);
    let query_index = rng.random_range(0..total_views);
    Ok((num_views, query_index))
}

pub fn observed_views<B: Backend>(
    batch: &SceneBatch,
    num_views: usize,
    device: &Device<B>,
) -> Result<ObservedViews<B>> {
    let batch_size = batch.batch_size();
    let (height, width) = batch.image_size();
    let count = batch_size * num_views;

    // (batch, views, H, W, C) -> (batch * views, H, W, C) -> (batch * views, C, H, W)
    let images = batch
        .images
        .slice(s![.., ..num_views, .., .., ..])
        .to_owned()
        .into_shape_with_order((count, height, width, 3))
        .map_err(|e| Error::GenerationFailed(format!("Observed images: {e}")))?
        .permuted_axes([0, 3, 1, 2]);
    let images: Vec<f32> = images.iter().copied().collect();

    let viewpoints: Vec<f32> = batch
        .viewpoints
        .slice(s![.., ..num_views, ..])
        .iter()
        .copied()
        .collect();

    Ok(ObservedViews {
        images: Tensor::<B, 1>::from_floats(images.as_slice(), device)
            .reshape([count, 3, height, width]),
        viewpoints: Tensor::<B, 1>::from_floats(viewpoints.as_slice(), device)
            .reshape([count, VIEWPOINT_SIZE]),
    })
}

/// Sum of per-view encodings, or zeros when nothing is observed
pub fn scene_representation<B: Backend, M: SceneModel<B>>(
    model: &M,
    batch: &SceneBatch,
    num_views: usize,
    device: &Device<B>,
) -> Result<Tensor<B, 4>> {
    let batch_size = batch.batch_size();
    if num_views == 0 {
        return Ok(Tensor::zeros(model.representation_shape(batch_size), device));
    }

    let observed = observed_views::<B>(batch, num_views, device)?;
    let r = model.compute_r(observed.images, observed.viewpoints);
    let [_, channels, height, width] = r.dims();

    Ok(r
        .reshape([batch_size, num_views, channels, height, width])
        .sum_dim(1)
        .reshape([batch_size, channels, height, width]))
}

/// Drives the orbit animation for every batch of every subset
pub struct Session<'a, B: Backend, M: SceneModel<B>> {
    model: &'a M,
    device: Device<B>,
    batch_size: usize,
    orbit: OrbitPath,
    camera: PerspectiveCamera,
}

impl<'a, B: Backend, M: SceneModel<B>> Session<'a, B, M> {
    pub fn new(model: &'a M, device: Device<B>, batch_size: usize) -> Self {
        Self {
            model,
            device,
            batch_size,
            orbit: OrbitPath::default(),
            camera: PerspectiveCamera::default(),
        }
    }

    #[cfg(test)]
    pub fn with_orbit(mut self, orbit: OrbitPath) -> Self {
        self.orbit = orbit;
        self
    }

    #[cfg(test)]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn run<I, S, R>(&mut self, subsets: I, sink: &mut S, rng: &mut R) -> Result<SessionEnd>
    where
        I: IntoIterator<Item = Result<Subset>>,
        S: FrameSink,
        R: Rng + ?Sized,
    {
        for (subset_index, subset) in subsets.into_iter().enumerate() {
            let subset = subset?;
            let batches = BatchIterator::new(subset.len(), self.batch_size, rng);
            log::info!(
                "Subset {} ({}): {} scenes x {} views, {} batches",
                subset_index,
                subset.name,
                subset.len(),
                subset.total_views(),
                batches.num_batches()
            );

            for data_indices in batches {
                let batch = subset.get(&data_indices);
                if self.render_batch(&batch, sink, rng)? == SessionEnd::WindowClosed {
                    return Ok(SessionEnd::WindowClosed);
                }
            }
        }

        Ok(SessionEnd::Completed)
    }

    /// Encode a random number of views once, then sweep the camera around the scene
    pub fn render_batch<S, R>(
        &mut self,
        batch: &SceneBatch,
        sink: &mut S,
        rng: &mut R,
    ) -> Result<SessionEnd>
    where
        S: FrameSink,
        R: Rng + ?Sized,
    {
        let batch_size = batch.batch_size();
        let (height, width) = batch.image_size();
        let image_size = self.model.image_size();
        if (height, width) != (image_size, image_size) {
            return Err(Error::InvalidDataset(format!(
                "Dataset images are {height}x{width}, the model expects {image_size}x{image_size}"
            )));
        }

        let (num_views, query_index) = sample_views(batch.total_views(), rng)?;
        log::debug!("Batch of {batch_size}: observing {num_views} views, reference view {query_index}");

        let r = scene_representation(self.model, batch, num_views, &self.device)?;

        let query_images = batch
            .images
            .index_axis(Axis(1), query_index)
            .outer_iter()
            .map(|image| {
                let values: Vec<f32> = image.iter().copied().collect();
                to_rgb_image(&values, PixelLayout::Hwc, height, width)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut query_viewpoints: Vec<f32> = batch
            .viewpoints
            .index_axis(Axis(1), query_index)
            .iter()
            .copied()
            .collect();

        self.camera.aspect_ratio = height as f32 / width as f32;
        for frame in self.orbit.frames() {
            self.camera.look_at(frame.eye, self.orbit.center, self.orbit.up);
            log::trace!(
                "Frame {}: eye {}, looking {}",
                frame.tick,
                frame.eye,
                self.camera.forward()
            );
            for row in query_viewpoints.chunks_exact_mut(VIEWPOINT_SIZE) {
                row.copy_from_slice(&frame.query);
            }

            let query = Tensor::<B, 1>::from_floats(query_viewpoints.as_slice(), &self.device)
                .reshape([batch_size, VIEWPOINT_SIZE]);
            let generated = self.model.generate_image(query, r.clone());

            if sink.is_closed() {
                return Ok(SessionEnd::WindowClosed);
            }

            let [_, _, out_height, out_width] = generated.dims();
            let generated: Vec<f32> = generated
                .into_data()
                .to_vec()
                .map_err(|e| Error::GenerationFailed(format!("{e:?}")))?;

            let plane = 3 * out_height * out_width;
            for (batch_index, values) in generated.chunks_exact(plane).enumerate() {
                sink.update(
                    FigureLayout::query_axis(batch_index),
                    query_images[batch_index].clone(),
                );
                sink.update(
                    FigureLayout::generated_axis(batch_index),
                    to_rgb_image(values, PixelLayout::Chw, out_height, out_width)?,
                );
            }
        }

        Ok(SessionEnd::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use burn_ndarray::NdArray;
    use ndarray::{Array3, Array5};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    type TestBackend = NdArray;

    const CHANNELS_R: usize = 2;
    const R_SIZE: usize = 1;

    /// Encodes every view as all-ones and records what it was asked
    #[derive(Default)]
    struct RecordingModel {
        encoder_inputs: RefCell<Vec<([usize; 4], [usize; 2])>>,
        representations: RefCell<Vec<Vec<f32>>>,
        queries: RefCell<Vec<Vec<f32>>>,
    }

    impl SceneModel<TestBackend> for RecordingModel {
        fn image_size(&self) -> usize {
            2
        }

        fn representation_shape(&self, batch_size: usize) -> [usize; 4] {
            [batch_size, CHANNELS_R, R_SIZE, R_SIZE]
        }

        fn compute_r(
            &self,
            images: Tensor<TestBackend, 4>,
            viewpoints: Tensor<TestBackend, 2>,
        ) -> Tensor<TestBackend, 4> {
            self.encoder_inputs
                .borrow_mut()
                .push((images.dims(), viewpoints.dims()));
            let [n, ..] = images.dims();
            Tensor::ones([n, CHANNELS_R, R_SIZE, R_SIZE], &images.device())
        }

        fn generate_image(
            &self,
            query_viewpoints: Tensor<TestBackend, 2>,
            r: Tensor<TestBackend, 4>,
        ) -> Tensor<TestBackend, 4> {
            let [batch_size, _] = query_viewpoints.dims();
            let device = r.device();
            self.representations
                .borrow_mut()
                .push(r.into_data().to_vec().unwrap());
            self.queries
                .borrow_mut()
                .push(query_viewpoints.into_data().to_vec().unwrap());
            Tensor::zeros([batch_size, 3, 2, 2], &device)
        }
    }

    /// Collects frames and reports closed after a number of updates
    struct RecordingSink {
        updates: Vec<(usize, RgbImage)>,
        close_after: Option<usize>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                updates: Vec::new(),
                close_after: None,
            }
        }
    }

    impl FrameSink for RecordingSink {
        fn is_closed(&self) -> bool {
            self.close_after
                .is_some_and(|limit| self.updates.len() >= limit)
        }

        fn update(&mut self, axis: usize, image: RgbImage) {
            self.updates.push((axis, image));
        }
    }

    fn scene_batch(batch_size: usize, views: usize) -> SceneBatch {
        SceneBatch {
            images: Array5::from_shape_fn((batch_size, views, 2, 2, 3), |(b, v, ..)| {
                if (b + v) % 2 == 0 { -1.0 } else { 1.0 }
            }),
            viewpoints: Array3::from_shape_fn((batch_size, views, 7), |(b, v, k)| {
                (b * 100 + v * 10 + k) as f32
            }),
        }
    }

    #[test]
    fn test_sample_views_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let (num_views, query_index) = sample_views(5, &mut rng).unwrap();
            assert!(num_views < 5);
            assert!(query_index < 5);
        }
        assert!(sample_views(0, &mut rng).is_err());
    }

    #[test]
    fn test_observed_views_layout() {
        let device = Default::default();
        let batch = scene_batch(3, 4);
        let observed = observed_views::<TestBackend>(&batch, 2, &device).unwrap();

        assert_eq!(observed.images.dims(), [6, 3, 2, 2]);
        assert_eq!(observed.viewpoints.dims(), [6, 7]);

        // Row 3 is scene 1, view 1
        let viewpoints: Vec<f32> = observed.viewpoints.into_data().to_vec().unwrap();
        assert_eq!(&viewpoints[3 * 7..4 * 7], &[110.0, 111.0, 112.0, 113.0, 114.0, 115.0, 116.0]);

        // Scene 0, view 1 is all ones; scene 1, view 0 too
        let images: Vec<f32> = observed.images.into_data().to_vec().unwrap();
        let plane = 3 * 2 * 2;
        assert!(images[0..plane].iter().all(|&x| x == -1.0));
        assert!(images[plane..2 * plane].iter().all(|&x| x == 1.0));
        assert!(images[2 * plane..3 * plane].iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_zero_views_gives_zero_representation() {
        let device = Default::default();
        let model = RecordingModel::default();
        let batch = scene_batch(4, 3);

        let r = scene_representation::<TestBackend, _>(&model, &batch, 0, &device).unwrap();

        assert_eq!(r.dims(), [4, CHANNELS_R, R_SIZE, R_SIZE]);
        let values: Vec<f32> = r.into_data().to_vec().unwrap();
        assert!(values.iter().all(|&x| x == 0.0));
        assert!(model.encoder_inputs.borrow().is_empty());
    }

    #[test]
    fn test_representation_sums_over_views() {
        let device = Default::default();
        let model = RecordingModel::default();
        let batch = scene_batch(4, 5);

        let r = scene_representation::<TestBackend, _>(&model, &batch, 3, &device).unwrap();

        assert_eq!(r.dims(), [4, CHANNELS_R, R_SIZE, R_SIZE]);
        assert_eq!(model.encoder_inputs.borrow()[0], ([12, 3, 2, 2], [12, 7]));
        let values: Vec<f32> = r.into_data().to_vec().unwrap();
        assert!(values.iter().all(|&x| x == 3.0));
    }

    #[test]
    fn test_render_batch_sweeps_orbit_with_one_representation() {
        let device = Default::default();
        let model = RecordingModel::default();
        let mut session = Session::<TestBackend, _>::new(&model, device, 2);
        let mut sink = RecordingSink::new();
        let mut rng = StdRng::seed_from_u64(11);

        let end = session
            .render_batch(&scene_batch(2, 4), &mut sink, &mut rng)
            .unwrap();
        assert_eq!(end, SessionEnd::Completed);

        // At most one encoder call, one generator call per frame
        assert!(model.encoder_inputs.borrow().len() <= 1);
        let representations = model.representations.borrow();
        assert_eq!(representations.len(), 100);
        assert!(representations.iter().all(|r| *r == representations[0]));

        // Every row of the query buffer carries the orbit viewpoint
        let orbit = OrbitPath::default();
        for (tick, query) in model.queries.borrow().iter().enumerate() {
            let expected = orbit.frame(tick).query;
            assert_eq!(&query[0..7], &expected);
            assert_eq!(&query[7..14], &expected);
        }

        // Two axes per scene per frame
        assert_eq!(sink.updates.len(), 100 * 4);
        let axes: Vec<usize> = sink.updates[0..4].iter().map(|(axis, _)| *axis).collect();
        assert_eq!(axes, vec![0, 1, 2, 3]);
        assert_eq!(sink.updates[1].1.get_pixel(0, 0).0, [128, 128, 128]);
        assert_eq!(session.camera().eye, orbit.eye(99));
    }

    #[test]
    fn test_render_batch_rejects_mismatched_image_size() {
        let device = Default::default();
        let model = RecordingModel::default();
        let mut session = Session::<TestBackend, _>::new(&model, device, 2);
        let mut sink = RecordingSink::new();
        let mut rng = StdRng::seed_from_u64(2);

        let batch = SceneBatch {
            images: Array5::zeros((2, 3, 4, 4, 3)),
            viewpoints: Array3::zeros((2, 3, 7)),
        };
        let result = session.render_batch(&batch, &mut sink, &mut rng);

        assert!(matches!(result, Err(Error::InvalidDataset(_))));
        assert!(model.encoder_inputs.borrow().is_empty());
        assert!(model.representations.borrow().is_empty());
        assert!(sink.updates.is_empty());
    }

    #[test]
    fn test_closed_window_stops_generation() {
        let device = Default::default();
        let model = RecordingModel::default();
        let mut session = Session::<TestBackend, _>::new(&model, device, 2);
        let mut sink = RecordingSink::new();
        // Closed once three frames (4 updates each) have been shown
        sink.close_after = Some(12);
        let mut rng = StdRng::seed_from_u64(5);

        let end = session
            .render_batch(&scene_batch(2, 3), &mut sink, &mut rng)
            .unwrap();

        assert_eq!(end, SessionEnd::WindowClosed);
        assert_eq!(model.representations.borrow().len(), 4);
        assert_eq!(sink.updates.len(), 12);
    }

    #[test]
    fn test_run_over_subsets() {
        let device = Default::default();
        let model = RecordingModel::default();
        let batch = scene_batch(5, 2);
        let subsets = vec![
            Subset::from_arrays("first", batch.images.clone(), batch.viewpoints.clone()),
            Subset::from_arrays("second", batch.images, batch.viewpoints),
        ];
        let mut session = Session::<TestBackend, _>::new(&model, device, 2).with_orbit(OrbitPath {
            total_frames: 3,
            ..OrbitPath::default()
        });
        let mut sink = RecordingSink::new();
        let mut rng = StdRng::seed_from_u64(1);

        let end = session.run(subsets, &mut sink, &mut rng).unwrap();

        // Two full batches per subset, three frames each
        assert_eq!(end, SessionEnd::Completed);
        assert_eq!(model.representations.borrow().len(), 2 * 2 * 3);
    }

    #[test]
    fn test_run_propagates_subset_errors() {
        let device = Default::default();
        let model = RecordingModel::default();
        let mut session = Session::<TestBackend, _>::new(&model, device, 2);
        let mut sink = RecordingSink::new();
        let mut rng = StdRng::seed_from_u64(1);

        let subsets = vec![Err(Error::InvalidDataset("broken".to_string()))];
        assert!(session.run(subsets, &mut sink, &mut rng).is_err());
    }
}
