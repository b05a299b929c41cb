use std::path::{Path, PathBuf};

use ndarray::{Array3, Array5, Axis};
use ndarray_npy::read_npy;

use gqn_core::error::{Error, Result};
use gqn_core::orbit::VIEWPOINT_SIZE;

pub const IMAGES_DIR: &str = "images";
pub const VIEWPOINTS_DIR: &str = "viewpoints";

/// Multi-view scenes from one `.npy` pair
#[derive(Clone, Debug)]
pub struct Subset {
    pub name: String,
    /// [N, views, H, W, 3] in [-1, 1]
    images: Array5<f32>,
    /// [N, views, 7]
    viewpoints: Array3<f32>,
}

/// Scenes selected from a subset for one step of the viewer
#[derive(Clone, Debug)]
pub struct SceneBatch {
    /// [batch, views, H, W, 3] in [-1, 1]
    pub images: Array5<f32>,
    /// [batch, views, 7]
    pub viewpoints: Array3<f32>,
}

impl SceneBatch {
    pub fn batch_size(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn total_views(&self) -> usize {
        self.images.len_of(Axis(1))
    }

    /// (height, width)
    pub fn image_size(&self) -> (usize, usize) {
        let shape = self.images.shape();
        (shape[2], shape[3])
    }
}

impl Subset {
    pub fn from_arrays(
        name: impl Into<String>,
        images: Array5<f32>,
        viewpoints: Array3<f32>,
    ) -> Result<Self> {
        let name = name.into();
        let (image_shape, viewpoint_shape) = (images.shape(), viewpoints.shape());

        if image_shape[4] != 3 {
            return Err(Error::InvalidDataset(format!(
                "{name}: expected 3 color channels, got {}",
                image_shape[4]
            )));
        }
        if viewpoint_shape[2] != VIEWPOINT_SIZE {
            return Err(Error::InvalidDataset(format!(
                "{name}: expected {VIEWPOINT_SIZE} viewpoint components, got {}",
                viewpoint_shape[2]
            )));
        }
        if image_shape[..2] != viewpoint_shape[..2] {
            return Err(Error::InvalidDataset(format!(
                "{name}: images {:?} and viewpoints {:?} disagree on scenes/views",
                &image_shape[..2],
                &viewpoint_shape[..2]
            )));
        }

        Ok(Self {
            name,
            images,
            viewpoints,
        })
    }

    /// Read a subset; `uint8` images are rescaled to [-1, 1]
    pub fn load(images_path: &Path, viewpoints_path: &Path) -> Result<Self> {
        let name = images_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let images = read_images(images_path)?;
        let viewpoints: Array3<f32> = read_npy(viewpoints_path).map_err(|e| {
            Error::InvalidDataset(format!("{}: {}", viewpoints_path.display(), e))
        })?;

        Self::from_arrays(name, images, viewpoints)
    }

    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_views(&self) -> usize {
        self.images.len_of(Axis(1))
    }

    pub fn get(&self, indices: &[usize]) -> SceneBatch {
        SceneBatch {
            images: self.images.select(Axis(0), indices),
            viewpoints: self.viewpoints.select(Axis(0), indices),
        }
    }
}

fn read_images(path: &Path) -> Result<Array5<f32>> {
    match read_npy::<_, Array5<u8>>(path) {
        Ok(raw) => Ok(raw.mapv(|x| x as f32 / 255.0 * 2.0 - 1.0)),
        Err(byte_error) => read_npy::<_, Array5<f32>>(path).map_err(|_| {
            Error::InvalidDataset(format!("{}: {}", path.display(), byte_error))
        }),
    }
}

/// Directory of subsets, visited in file name order
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    subset_names: Vec<String>,
    position: usize,
}

impl Dataset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let images_dir = path.join(IMAGES_DIR);

        let entries = std::fs::read_dir(&images_dir).map_err(|e| {
            Error::InvalidDataset(format!("{}: {}", images_dir.display(), e))
        })?;

        let mut subset_names = Vec::new();
        for entry in entries {
            let file_path = entry?.path();
            if file_path.extension().is_some_and(|ext| ext == "npy") {
                if let Some(name) = file_path.file_name() {
                    subset_names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        subset_names.sort();

        if subset_names.is_empty() {
            return Err(Error::InvalidDataset(format!(
                "No .npy files in {}",
                images_dir.display()
            )));
        }

        log::info!("Found {} subsets in {}", subset_names.len(), path.display());

        Ok(Self {
            path,
            subset_names,
            position: 0,
        })
    }

    pub fn subset_names(&self) -> &[String] {
        &self.subset_names
    }

    pub fn len(&self) -> usize {
        self.subset_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subset_names.is_empty()
    }

    fn load_subset(&self, name: &str) -> Result<Subset> {
        let images_path = self.path.join(IMAGES_DIR).join(name);
        let viewpoints_path = self.path.join(VIEWPOINTS_DIR).join(name);
        if !viewpoints_path.is_file() {
            return Err(Error::InvalidDataset(format!(
                "Missing viewpoints for subset {}",
                name
            )));
        }

        log::debug!("Loading subset {}", images_path.display());
        Subset::load(&images_path, &viewpoints_path)
    }
}

impl Iterator for Dataset {
    type Item = Result<Subset>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.subset_names.get(self.position)?.clone();
        self.position += 1;
        Some(self.load_subset(&name))
    }
}
