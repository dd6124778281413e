use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use vpaid_creative::clock::SystemClock;
use vpaid_creative::creative;
use vpaid_creative::fetch::fetch_ad_parameters;
use vpaid_creative::models::{AdParameters, CreativeData};
use vpaid_creative::slot::{EnvironmentVars, MarkupSlot, SimulatedVideo, VideoSlot};
use vpaid_creative::{AdConfig, AdEvent, CreativeKind, VpaidNonLinear};

/// VPAID creative host simulator
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a creative's markup from its ad parameters
    Render {
        /// Path or URL of the AdParameters JSON
        #[arg(short, long)]
        params: String,

        /// Creative layout
        #[arg(short, long, value_enum, default_value_t = CreativeKind::Banner)]
        creative: CreativeKind,
    },

    /// Drive a creative through a full player session and print its events
    Run {
        /// Path or URL of the AdParameters JSON
        #[arg(short, long)]
        params: String,

        /// Creative layout
        #[arg(short, long, value_enum, default_value_t = CreativeKind::Banner)]
        creative: CreativeKind,

        /// Slot width in pixels
        #[arg(long, default_value_t = 640)]
        width: u32,

        /// Slot height in pixels
        #[arg(long, default_value_t = 360)]
        height: u32,

        /// Player view mode
        #[arg(long, default_value = "normal")]
        view_mode: String,

        /// Desired bitrate in kbps
        #[arg(long, default_value_t = 256)]
        bitrate: u32,

        /// Duration of the simulated video element, in seconds
        #[arg(long, default_value_t = 10.0)]
        video_duration: f64,

        /// Number of progress updates fed to the ad
        #[arg(long, default_value_t = 10)]
        steps: u32,

        /// JSON file overriding the ad configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ask the ad to skip before stopping
        #[arg(long)]
        skip: bool,

        /// End through the linear affordance instead of stopAd
        #[arg(long)]
        linear_click: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { params, creative: kind } => {
            let content = fetch_ad_parameters(&params).await?;
            let parameters = AdParameters::from_json(&content)?;
            let rendered = creative::render(kind, &parameters)?;
            log::info!("Rendered {:?} creative", rendered.kind);
            println!("{}", rendered.markup);
        }
        Commands::Run {
            params,
            creative: kind,
            width,
            height,
            view_mode,
            bitrate,
            video_duration,
            steps,
            config,
            skip,
            linear_click,
        } => {
            let content = fetch_ad_parameters(&params).await?;
            let config = match config {
                Some(path) => AdConfig::from_json(&tokio::fs::read_to_string(path).await?)?,
                None => AdConfig::default(),
            };

            let mut ad = VpaidNonLinear::new(kind, config, Rc::new(SystemClock::new()));
            for event in AdEvent::ALL {
                ad.subscribe(event, move |args| println!("{:<22} {:?}", event, args));
            }
            log::info!("Negotiated VPAID {}", ad.handshake_version("2.0"));

            let slot = Rc::new(RefCell::new(MarkupSlot::default()));
            let video = Rc::new(RefCell::new(SimulatedVideo::new(video_duration)));
            ad.init_ad(
                width,
                height,
                view_mode.as_str(),
                bitrate,
                &CreativeData::new(content),
                EnvironmentVars::new(slot.clone(), video.clone()),
            )?;
            ad.start_ad()?;
            for markup in &slot.borrow().mounted {
                log::info!("Mounted creative: {}", markup);
            }

            video.borrow_mut().play();
            ad.on_loaded_metadata();
            for step in 0..=steps {
                let position = video_duration * f64::from(step) / f64::from(steps.max(1));
                video.borrow_mut().seek(position);
                ad.on_time_update();
            }
            log::info!(
                "Remaining time: {:.3}s wall clock, {:?}s playhead",
                ad.get_ad_remaining_time(),
                ad.playback_remaining_time()
            );

            if skip {
                ad.skip_ad();
            }
            if linear_click {
                ad.on_linear_click();
            } else {
                ad.stop_ad();
            }

            let scheduler = ad.scheduler();
            while let Some(due) = scheduler.next_due() {
                let now = scheduler.now();
                if due > now {
                    tokio::time::sleep(due - now).await;
                }
                scheduler.run_due(&mut ad);
            }
            log::info!("Session ended in state {:?}", ad.state());
        }
    }

    Ok(())
}
