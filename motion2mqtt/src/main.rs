//! Watches a video stream and publishes a debounced MQTT message whenever it shows motion.

use anyhow::Context;
use av_source::AvSource;
use clap::Parser;
use framediff::prelude::v1::*;
use log::*;
use mqtt_notify::{MqttConfig, MqttPublisher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one connect-publish-disconnect exchange with the broker.
const MQTT_OP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "motion2mqtt")]
#[command(about = "Watches a video stream and raises debounced MQTT alerts on motion")]
#[command(version)]
struct Args {
    /// URL of the video stream (RTSP, or anything ffmpeg can open)
    #[arg(long)]
    video_url: String,

    /// Per-pixel intensity change above which a pixel counts as changed
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u8).range(1..))]
    threshold: u8,

    /// Changed pixel count above which a frame pair counts as motion
    #[arg(long, default_value = "0.0004")]
    threshold_count: f64,

    /// Hostname or IP address of the MQTT broker
    #[arg(long)]
    mqtt_server: String,

    /// Port of the MQTT broker
    #[arg(long, default_value = "1883")]
    mqtt_port: u16,

    /// Username for the MQTT broker, only applied together with a password
    #[arg(long)]
    mqtt_username: Option<String>,

    /// Password for the MQTT broker, only applied together with a username
    #[arg(long)]
    mqtt_password: Option<String>,

    /// Topic the alert message is published to
    #[arg(long)]
    mqtt_topic: String,

    /// Message value published on each alert
    #[arg(long)]
    mqtt_value: String,

    /// Seconds to wait after an alert before the next one may fire
    #[arg(long, default_value = "30")]
    backoff_time: u64,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = Args::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install the shutdown handler")?;

    let mut source = AvSource::open(&args.video_url)
        .with_context(|| format!("could not open video stream {}", args.video_url))?;

    match (source.dimensions(), source.framerate()) {
        (Some((width, height)), Some(rate)) => {
            info!(
                "opened {} ({}x{} @ {:.2} fps)",
                args.video_url, width, height, rate
            )
        }
        (Some((width, height)), None) => info!("opened {} ({}x{})", args.video_url, width, height),
        _ => info!("opened {}", args.video_url),
    }

    let detection = PixelDiffDetection::new(args.threshold, args.threshold_count);
    let mut dispatcher = AlertDispatcher::new(Duration::from_secs(args.backoff_time));
    let mut publisher = MqttPublisher::new(MqttConfig {
        host: args.mqtt_server,
        port: args.mqtt_port,
        username: args.mqtt_username,
        password: args.mqtt_password,
        topic: args.mqtt_topic,
        payload: args.mqtt_value,
        op_timeout: MQTT_OP_TIMEOUT,
    });

    framediff::pipeline::run(
        &mut source,
        &detection,
        &mut dispatcher,
        &mut publisher,
        &cancel,
    )
}
