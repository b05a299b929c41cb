use burn::prelude::Config;

use gqn_core::error::{self, Error};
use gqn_core::orbit::VIEWPOINT_SIZE;

/// Architecture of a trained GQN, stored as `hyperparams.json` next to the weights
#[derive(Config, Debug)]
pub struct HyperParameters {
    /// Side length of the square input and output images.
    #[config(default = 64)]
    pub image_size: usize,

    /// Side length of the representation and of the generator state.
    #[config(default = 16)]
    pub chrz_size: usize,

    #[config(default = 256)]
    pub channels_r: usize,

    #[config(default = 64)]
    pub channels_chz: usize,

    #[config(default = 64)]
    pub channels_z: usize,

    #[config(default = 128)]
    pub channels_u: usize,

    #[config(default = 12)]
    pub generation_steps: usize,

    #[config(default = false)]
    pub generator_share_core: bool,

    #[config(default = false)]
    pub generator_share_prior: bool,

    #[config(default = 7)]
    pub viewpoint_size: usize,
}

impl HyperParameters {
    /// Check that the sizes describe a buildable network
    pub fn validate(&self) -> error::Result<()> {
        let sizes = [
            ("image_size", self.image_size),
            ("chrz_size", self.chrz_size),
            ("channels_r", self.channels_r),
            ("channels_chz", self.channels_chz),
            ("channels_z", self.channels_z),
            ("channels_u", self.channels_u),
            ("generation_steps", self.generation_steps),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(Error::InvalidConfig(format!("{name} must be nonzero")));
        }

        // The tower halves the image twice and the canvas upsamples by four
        if self.image_size != self.chrz_size * 4 {
            return Err(Error::InvalidConfig(format!(
                "image_size ({}) must be 4 * chrz_size ({})",
                self.image_size, self.chrz_size
            )));
        }

        if self.channels_r < 2 {
            return Err(Error::InvalidConfig(
                "channels_r must be at least 2".to_string(),
            ));
        }

        if self.viewpoint_size != VIEWPOINT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "viewpoint_size must be {VIEWPOINT_SIZE}, got {}",
                self.viewpoint_size
            )));
        }

        Ok(())
    }

    pub fn representation_shape(&self, batch_size: usize) -> [usize; 4] {
        [batch_size, self.channels_r, self.chrz_size, self.chrz_size]
    }
}
