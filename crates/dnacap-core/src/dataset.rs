//! On-disk dataset layout: images, paired texts and the progress checkpoint.

use crate::CoreResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub const DATASET_DIR_NAME: &str = "face_to_ck3_dateset";
pub const IMAGE_DIR_NAME: &str = "face";
pub const TEXT_DIR_NAME: &str = "dna";
pub const CHECKPOINT_FILE_NAME: &str = "progress.txt";
pub const VERIFICATION_IMAGE_NAME: &str = "test_region.png";

/// The checkpoint is rewritten after every multiple of this many iterations.
pub const CHECKPOINT_EVERY: u32 = 100;

const IMAGE_PREFIX: &str = "face_";
const IMAGE_EXT: &str = "png";
const TEXT_EXT: &str = "txt";

/// Directory layout for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    root: PathBuf,
    image_dir: PathBuf,
    text_dir: PathBuf,
}

impl Dataset {
    /// Layout rooted at `<workdir>/face_to_ck3_dateset`.
    pub fn in_workdir(workdir: impl AsRef<Path>) -> Self {
        Self::at(workdir.as_ref().join(DATASET_DIR_NAME))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            image_dir: root.join(IMAGE_DIR_NAME),
            text_dir: root.join(TEXT_DIR_NAME),
            root,
        }
    }

    /// Create the image and text directories if absent.
    pub fn ensure(&self) -> CoreResult<()> {
        for dir in [&self.image_dir, &self.text_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                info!(?dir, "created dataset directory");
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn text_dir(&self) -> &Path {
        &self.text_dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE_NAME)
    }

    pub fn verification_image_path(&self) -> PathBuf {
        self.image_dir.join(VERIFICATION_IMAGE_NAME)
    }

    /// `face_0001.png` for index 1.
    pub fn image_file_name(index: u32) -> String {
        format!("{IMAGE_PREFIX}{index:04}.{IMAGE_EXT}")
    }

    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.image_dir.join(file_name)
    }

    /// Path of the text file paired with an image: same stem, `.txt`, in `dna/`.
    pub fn text_path_for(&self, image_file_name: &str) -> PathBuf {
        let stem = Path::new(image_file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_file_name.to_string());
        self.text_dir.join(format!("{stem}.{TEXT_EXT}"))
    }

    /// Write the text paired with `image_file_name` (UTF-8).
    pub fn write_text(&self, image_file_name: &str, text: &str) -> CoreResult<PathBuf> {
        let path = self.text_path_for(image_file_name);
        fs::write(&path, text)?;
        debug!(?path, bytes = text.len(), "wrote text");
        Ok(path)
    }

    /// Overwrite the checkpoint file.
    pub fn write_checkpoint(&self, checkpoint: Checkpoint) -> CoreResult<()> {
        let path = self.checkpoint_path();
        fs::write(&path, checkpoint.to_string())?;
        debug!(?path, %checkpoint, "wrote checkpoint");
        Ok(())
    }

    /// Read the checkpoint for display. `None` when absent or unparsable.
    pub fn read_checkpoint(&self) -> CoreResult<Option<Checkpoint>> {
        let path = self.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(content.parse().ok())
    }

    /// Indices that have both an image and a text file, sorted.
    pub fn complete_pairs(&self) -> CoreResult<Vec<u32>> {
        if !self.image_dir.exists() {
            return Ok(vec![]);
        }

        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.image_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let Some(index) = parse_image_index(&name) else {
                continue;
            };
            if self.text_path_for(&name).exists() {
                indices.push(index);
            }
        }

        indices.sort_unstable();
        Ok(indices)
    }
}

fn parse_image_index(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(IMAGE_PREFIX)?
        .strip_suffix(IMAGE_EXT)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Advisory progress record: `completed: i/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub completed: u32,
    pub total: u32,
}

impl Checkpoint {
    /// Whether iteration `index` should be followed by a checkpoint write.
    pub fn is_due(index: u32) -> bool {
        index > 0 && index % CHECKPOINT_EVERY == 0
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "completed: {}/{}", self.completed, self.total)
    }
}

impl FromStr for Checkpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix("completed:")
            .ok_or_else(|| format!("not a checkpoint line: {s:?}"))?;
        let (completed, total) = rest
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("missing '/' in checkpoint: {s:?}"))?;
        let completed = completed.trim().parse().map_err(|_| format!("bad count in {s:?}"))?;
        let total = total.trim().parse().map_err(|_| format!("bad total in {s:?}"))?;
        Ok(Self { completed, total })
    }
}
