//! # ffmpeg-backed frame source
//!
//! Opens a video stream URL with the ffmpeg command line tools and yields luminance
//! frames. `ffprobe` reports the stream geometry up front, then `ffmpeg` decodes the
//! stream onto a raw gray8 pipe, one byte per pixel, which maps one-to-one onto
//! [`LumaFrame`]s of the probed size.
//!
//! Both binaries must be reachable through `PATH` at runtime.

use anyhow::Context;
use framediff::prelude::v1::*;
use log::*;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<usize>,
    height: Option<usize>,
    avg_frame_rate: Option<String>,
}

/// Parse an ffprobe rational such as `30000/1001`.
///
/// Zero rates and zero denominators mean the rate is unknown.
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = match rate.split_once('/') {
        Some((num, den)) => (num, den),
        None => (rate, "1"),
    };

    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;

    if num == 0.0 || den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Query the geometry and framerate of the first video stream.
fn probe_stream(url: &str) -> Result<(usize, usize, Option<f64>)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate",
            "-of",
            "json",
            url,
        ])
        .stdin(Stdio::null())
        .output()
        .context("failed to run ffprobe, is it installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("ffprobe failed for {}: {}", url, stderr.trim()));
    }

    let probe: ProbeOutput =
        serde_json::from_slice(&output.stdout).context("unparseable ffprobe output")?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| anyhow!("no video stream found in {}", url))?;

    let width = stream
        .width
        .ok_or_else(|| anyhow!("stream reports no width"))?;
    let height = stream
        .height
        .ok_or_else(|| anyhow!("stream reports no height"))?;
    let framerate = stream.avg_frame_rate.as_deref().and_then(parse_rate);

    Ok((width, height, framerate))
}

/// Luminance frame source decoding a stream URL through the ffmpeg tools.
pub struct AvSource {
    child: Child,
    stdout: ChildStdout,
    width: usize,
    height: usize,
    framerate: Option<f64>,
}

impl AvSource {
    /// Open a video stream.
    ///
    /// Probes the stream geometry with `ffprobe`, then spawns `ffmpeg` decoding the
    /// stream onto a raw luminance pipe. Fails if the stream cannot be opened or its
    /// geometry cannot be determined.
    ///
    /// # Arguments
    ///
    /// * `url` - stream location; RTSP URLs, files, and anything else ffmpeg can demux.
    pub fn open(url: &str) -> Result<Self> {
        let (width, height, framerate) = probe_stream(url)?;

        debug!(
            "probed {}: {}x{}, avg rate {:?}",
            url, width, height, framerate
        );

        let mut child = Command::new("ffmpeg")
            .args([
                "-nostdin", "-loglevel", "error", "-i", url, "-an", "-f", "rawvideo",
                "-pix_fmt", "gray", "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn ffmpeg, is it installed?")?;

        let stdout = child
            .stdout
            .take()
            .context("failed to capture ffmpeg stdout")?;

        // Keep the diagnostics pipe drained, or ffmpeg stalls once it fills.
        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().flatten() {
                    warn!("ffmpeg: {}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdout,
            width,
            height,
            framerate,
        })
    }
}

impl FrameSource for AvSource {
    fn next_frame(&mut self) -> Result<LumaFrame> {
        let mut data = vec![0; self.width * self.height];
        self.stdout
            .read_exact(&mut data)
            .context("video stream ended")?;

        LumaFrame::from_luma(data, self.width, self.height)
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some((self.width, self.height))
    }

    fn framerate(&self) -> Option<f64> {
        self.framerate
    }
}

impl Drop for AvSource {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}
