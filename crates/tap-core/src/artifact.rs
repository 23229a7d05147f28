use std::path::{Path, PathBuf};

/// Filename template handed to the decoder (`ffmpeg`'s own `%05d` counter
/// syntax), and the naming convention the dispatcher polls against.
pub const IMAGE_FILENAME_TEMPLATE: &str = "frame-%05d.jpg";

/// Build the expected path of one decoded frame's image artifact in the
/// scratch images directory, for the dispatcher's existence poll. Shared
/// so the decoder's output template and the converter's poll target
/// never drift apart.
#[must_use]
pub fn frame_image_path(images_dir: &Path, index: u64) -> PathBuf {
    images_dir.join(format!("frame-{index:05}.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_path_is_five_digit_padded() {
        let dir = Path::new("/tmp/scratch/images");
        assert_eq!(
            frame_image_path(dir, 7),
            Path::new("/tmp/scratch/images/frame-00007.jpg")
        );
        assert_eq!(
            frame_image_path(dir, 123_456),
            Path::new("/tmp/scratch/images/frame-123456.jpg")
        );
    }
}
