//! Recording Writer (C7): encode buffered frames to a single MP4, §4.7/§4.7a.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

const CODEC_PREFERENCE: [&str; 3] = ["libx264", "libopenh264", "mpeg4"];

static AVAILABLE_ENCODERS: OnceCell<Vec<String>> = OnceCell::const_new();

async fn available_encoders() -> MediaResult<&'static Vec<String>> {
    AVAILABLE_ENCODERS.get_or_try_init(probe_encoders).await
}

async fn probe_encoders() -> MediaResult<Vec<String>> {
    use tokio::process::Command;

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1).map(str::to_string))
        .collect())
}

/// Pick the first available codec in `CODEC_PREFERENCE` order.
fn select_codec(available: &[String]) -> MediaResult<&'static str> {
    CODEC_PREFERENCE
        .into_iter()
        .find(|codec| available.iter().any(|a| a == codec))
        .ok_or(MediaError::WriterUnavailable)
}

/// Write the buffered frames to `<recordings_dir>/<test_id>.mp4`. Frames are
/// piped to `ffmpeg` as an `image2pipe` sequence at `fps` (falls back to
/// 30.0 when `fps` is absent or non-positive). Codec fallback: `libx264` →
/// `libopenh264` → `mpeg4`; fails with `WriterUnavailable` if none of those
/// encoders are compiled into the available `ffmpeg` binary.
///
/// Returns the filename (relative to `recordings_dir`) to persist in
/// `TestResult::recording_file`.
pub async fn write_mp4(
    recordings_dir: impl AsRef<Path>,
    test_id: &str,
    frames: &[Vec<u8>],
    fps: Option<f64>,
) -> MediaResult<String> {
    let recordings_dir = recordings_dir.as_ref();
    tokio::fs::create_dir_all(recordings_dir).await?;

    let encoders = available_encoders().await?;
    let codec = select_codec(encoders)?;

    let fps = fps.filter(|f| *f > 0.0).unwrap_or(30.0);
    let filename = format!("{test_id}.mp4");
    let output_path: PathBuf = recordings_dir.join(&filename);

    let cmd = FfmpegCommand::new("-", &output_path)
        .input_args(["-f", "image2pipe", "-r", &format!("{fps:.3}")])
        .video_codec(codec)
        .output_arg("-pix_fmt")
        .output_arg("yuv420p");

    let payload: Vec<u8> = frames.iter().flatten().copied().collect();

    FfmpegRunner::new().run_with_stdin(&cmd, payload).await?;

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_libx264_when_available() {
        let available = vec!["libx264".to_string(), "mpeg4".to_string()];
        assert_eq!(select_codec(&available).unwrap(), "libx264");
    }

    #[test]
    fn falls_back_through_the_chain() {
        let available = vec!["mpeg4".to_string()];
        assert_eq!(select_codec(&available).unwrap(), "mpeg4");

        let available = vec!["libopenh264".to_string(), "mpeg4".to_string()];
        assert_eq!(select_codec(&available).unwrap(), "libopenh264");
    }

    #[test]
    fn writer_unavailable_when_nothing_matches() {
        let available = vec!["prores".to_string()];
        assert!(matches!(select_codec(&available), Err(MediaError::WriterUnavailable)));
    }
}
