use burn::nn::PaddingConfig2d;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::prelude::{Backend, Device, Module};
use burn::Tensor;
use burn::tensor::Distribution;
use burn::tensor::activation::sigmoid;

use crate::config::HyperParameters;

fn gate(channels: [usize; 2]) -> Conv2dConfig {
    Conv2dConfig::new(channels, [5, 5]).with_padding(PaddingConfig2d::Explicit(2, 2))
}

/// Recurrent generator state carried between steps
#[derive(Clone, Debug)]
pub struct GeneratorState<B: Backend> {
    /// Hidden state [B, C_chz, S, S]
    pub h: Tensor<B, 4>,
    /// Cell state [B, C_chz, S, S]
    pub c: Tensor<B, 4>,
    /// Canvas [B, C_u, H, W]
    pub u: Tensor<B, 4>,
}

impl<B: Backend> GeneratorState<B> {
    pub fn zeros(hyperparams: &HyperParameters, batch_size: usize, device: &Device<B>) -> Self {
        let s = hyperparams.chrz_size;
        let hw = hyperparams.image_size;
        Self {
            h: Tensor::zeros([batch_size, hyperparams.channels_chz, s, s], device),
            c: Tensor::zeros([batch_size, hyperparams.channels_chz, s, s], device),
            u: Tensor::zeros([batch_size, hyperparams.channels_u, hw, hw], device),
        }
    }
}

/// Convolutional LSTM step that also paints into the canvas
#[derive(Module, Debug)]
pub struct GenerationCore<B: Backend> {
    lstm_tanh: Conv2d<B>,
    lstm_i: Conv2d<B>,
    lstm_f: Conv2d<B>,
    lstm_o: Conv2d<B>,
    upsample_h: ConvTranspose2d<B>,
}

impl<B: Backend> GenerationCore<B> {
    pub fn new(hyperparams: &HyperParameters, device: &Device<B>) -> Self {
        let chz = hyperparams.channels_chz;
        let inputs = chz + hyperparams.viewpoint_size + hyperparams.channels_r + hyperparams.channels_z;

        Self {
            lstm_tanh: gate([inputs, chz]).init(device),
            lstm_i: gate([inputs, chz]).init(device),
            lstm_f: gate([inputs, chz]).init(device),
            lstm_o: gate([inputs, chz]).init(device),
            upsample_h: ConvTranspose2dConfig::new([chz, hyperparams.channels_u], [4, 4])
                .with_stride([4, 4])
                .init(device),
        }
    }

    pub fn forward(
        &self,
        state: GeneratorState<B>,
        viewpoints: Tensor<B, 2>,
        r: Tensor<B, 4>,
        z: Tensor<B, 4>,
    ) -> GeneratorState<B> {
        let [n, _, h, w] = state.h.dims();
        let [_, v] = viewpoints.dims();
        let viewpoints = viewpoints.reshape([n, v, 1, 1]).expand([n, v, h, w]);

        let lstm_in = Tensor::cat(vec![state.h, viewpoints, r, z], 1);
        let forget_gate = sigmoid(self.lstm_f.forward(lstm_in.clone()));
        let input_gate = sigmoid(self.lstm_i.forward(lstm_in.clone()));
        let output_gate = sigmoid(self.lstm_o.forward(lstm_in.clone()));
        let candidate = self.lstm_tanh.forward(lstm_in).tanh();

        let c = forget_gate * state.c + input_gate * candidate;
        let h = output_gate * c.clone().tanh();
        let u = self.upsample_h.forward(h.clone()) + state.u;

        GeneratorState { h, c, u }
    }
}

/// Prior over the latent z given the generator hidden state
#[derive(Module, Debug)]
pub struct Prior<B: Backend> {
    conv: Conv2d<B>,
    channels_z: usize,
}

impl<B: Backend> Prior<B> {
    pub fn new(hyperparams: &HyperParameters, device: &Device<B>) -> Self {
        Self {
            conv: gate([hyperparams.channels_chz, hyperparams.channels_z * 2]).init(device),
            channels_z: hyperparams.channels_z,
        }
    }

    /// Mean and log-variance of z, each [B, C_z, S, S]
    pub fn forward(&self, h: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let params = self.conv.forward(h);
        let mean = params.clone().narrow(1, 0, self.channels_z);
        let ln_var = params.narrow(1, self.channels_z, self.channels_z);
        (mean, ln_var)
    }

    /// Reparameterized draw: mean + exp(ln_var / 2) * eps
    pub fn sample(&self, h: Tensor<B, 4>) -> Tensor<B, 4> {
        let (mean, ln_var) = self.forward(h);
        let eps = Tensor::random(mean.shape(), Distribution::Normal(0.0, 1.0), &mean.device());
        mean + ln_var.mul_scalar(0.5).exp() * eps
    }
}

/// Canvas -> mean image
#[derive(Module, Debug)]
pub struct Observation<B: Backend> {
    mean_x: Conv2d<B>,
}

impl<B: Backend> Observation<B> {
    pub fn new(hyperparams: &HyperParameters, device: &Device<B>) -> Self {
        Self {
            mean_x: Conv2dConfig::new([hyperparams.channels_u, 3], [1, 1]).init(device),
        }
    }

    pub fn forward(&self, u: Tensor<B, 4>) -> Tensor<B, 4> {
        self.mean_x.forward(u)
    }
}
