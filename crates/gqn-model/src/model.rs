use burn::module::Ignored;
use burn::prelude::{Backend, Device, Module};
use burn::Tensor;

use crate::config::HyperParameters;
use crate::generator::{GenerationCore, GeneratorState, Observation, Prior};
use crate::representation::TowerRepresentation;

/// What the viewer needs from a scene model
pub trait SceneModel<B: Backend> {
    /// Side length of the square images the model encodes and renders
    fn image_size(&self) -> usize;

    /// Shape of r for a batch, also used for the no-observation case
    fn representation_shape(&self, batch_size: usize) -> [usize; 4];

    /// Encode views: [N, 3, H, W] images and [N, 7] viewpoints -> [N, C_r, S, S]
    fn compute_r(&self, images: Tensor<B, 4>, viewpoints: Tensor<B, 2>) -> Tensor<B, 4>;

    /// Render [B, 3, H, W] images for [B, 7] query viewpoints given r [B, C_r, S, S]
    fn generate_image(&self, query_viewpoints: Tensor<B, 2>, r: Tensor<B, 4>) -> Tensor<B, 4>;
}

/// Generative Query Network, inference half
#[derive(Module, Debug)]
pub struct Gqn<B: Backend> {
    representation: TowerRepresentation<B>,
    cores: Vec<GenerationCore<B>>,
    priors: Vec<Prior<B>>,
    observation: Observation<B>,
    hyperparams: Ignored<HyperParameters>,
}

impl<B: Backend> Gqn<B> {
    pub fn new(hyperparams: &HyperParameters, device: &Device<B>) -> Self {
        let steps = hyperparams.generation_steps;
        let num_cores = if hyperparams.generator_share_core { 1 } else { steps };
        let num_priors = if hyperparams.generator_share_prior { 1 } else { steps };

        Self {
            representation: TowerRepresentation::new(hyperparams, device),
            cores: (0..num_cores)
                .map(|_| GenerationCore::new(hyperparams, device))
                .collect(),
            priors: (0..num_priors)
                .map(|_| Prior::new(hyperparams, device))
                .collect(),
            observation: Observation::new(hyperparams, device),
            hyperparams: Ignored(hyperparams.clone()),
        }
    }

    pub fn hyperparams(&self) -> &HyperParameters {
        &self.hyperparams.0
    }

    fn core(&self, step: usize) -> &GenerationCore<B> {
        &self.cores[step.min(self.cores.len() - 1)]
    }

    fn prior(&self, step: usize) -> &Prior<B> {
        &self.priors[step.min(self.priors.len() - 1)]
    }
}

impl<B: Backend> SceneModel<B> for Gqn<B> {
    fn image_size(&self) -> usize {
        self.hyperparams().image_size
    }

    fn representation_shape(&self, batch_size: usize) -> [usize; 4] {
        self.hyperparams().representation_shape(batch_size)
    }

    fn compute_r(&self, images: Tensor<B, 4>, viewpoints: Tensor<B, 2>) -> Tensor<B, 4> {
        self.representation.forward(images, viewpoints)
    }

    fn generate_image(&self, query_viewpoints: Tensor<B, 2>, r: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch_size, _] = query_viewpoints.dims();
        let device = r.device();
        let mut state = GeneratorState::zeros(self.hyperparams(), batch_size, &device);

        for step in 0..self.hyperparams().generation_steps {
            let z = self.prior(step).sample(state.h.clone());
            state = self
                .core(step)
                .forward(state, query_viewpoints.clone(), r.clone(), z);
        }

        self.observation.forward(state.u)
    }
}
