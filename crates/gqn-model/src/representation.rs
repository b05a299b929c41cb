use burn::nn::PaddingConfig2d;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::prelude::{Backend, Device, Module};
use burn::Tensor;
use burn::tensor::activation::relu;

use crate::config::HyperParameters;

/// Tower representation network: one view + viewpoint -> r at a quarter resolution
#[derive(Module, Debug)]
pub struct TowerRepresentation<B: Backend> {
    conv1_1: Conv2d<B>,
    conv1_2: Conv2d<B>,
    conv1_res: Conv2d<B>,
    conv1_3: Conv2d<B>,
    conv2_1: Conv2d<B>,
    conv2_2: Conv2d<B>,
    conv2_res: Conv2d<B>,
    conv2_3: Conv2d<B>,
}

fn conv(channels: [usize; 2], kernel: usize, stride: usize, padding: usize) -> Conv2dConfig {
    Conv2dConfig::new(channels, [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
}

impl<B: Backend> TowerRepresentation<B> {
    pub fn new(hyperparams: &HyperParameters, device: &Device<B>) -> Self {
        let r = hyperparams.channels_r;
        let half = r / 2;
        let v = hyperparams.viewpoint_size;

        Self {
            conv1_1: conv([3, r], 2, 2, 0).init(device),
            conv1_2: conv([r, half], 3, 1, 1).init(device),
            conv1_res: conv([r, r], 2, 2, 0).init(device),
            conv1_3: conv([half, r], 2, 2, 0).init(device),
            conv2_1: conv([r + v, half], 3, 1, 1).init(device),
            conv2_2: conv([half, r], 3, 1, 1).init(device),
            conv2_res: conv([r + v, r], 3, 1, 1).init(device),
            conv2_3: conv([r, r], 1, 1, 0).init(device),
        }
    }

    /// [N, 3, H, W] images and [N, 7] viewpoints -> [N, C_r, H/4, W/4]
    pub fn forward(&self, images: Tensor<B, 4>, viewpoints: Tensor<B, 2>) -> Tensor<B, 4> {
        let x = relu(self.conv1_1.forward(images));
        let residual = relu(self.conv1_res.forward(x.clone()));
        let x = relu(self.conv1_2.forward(x));
        let x = relu(self.conv1_3.forward(x)) + residual;

        let [n, _, h, w] = x.dims();
        let [_, v] = viewpoints.dims();
        let viewpoints = viewpoints.reshape([n, v, 1, 1]).expand([n, v, h, w]);
        let x = Tensor::cat(vec![x, viewpoints], 1);

        let residual = relu(self.conv2_res.forward(x.clone()));
        let x = relu(self.conv2_1.forward(x));
        let x = relu(self.conv2_2.forward(x)) + residual;

        self.conv2_3.forward(x)
    }
}
