use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use smartvision_core::pipeline::engine::{EngineConfig, EngineOutput, TrackingEngine};
use smartvision_core::pipeline::engine_logger::StdoutEngineLogger;
use smartvision_core::pipeline::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use smartvision_core::recognition::engine::RecognitionEngine;
use smartvision_core::recognition::infrastructure::json_gallery_store::JsonGalleryStore;
use smartvision_core::recognition::infrastructure::onnx_descriptor_extractor::OnnxDescriptorExtractor;
use smartvision_core::recognition::infrastructure::onnx_landmark_extractor::OnnxLandmarkExtractor;
use smartvision_core::shared::frame::Frame;
use smartvision_core::shared::rect::Rect;
use smartvision_core::tracking::domain::descriptor_extractor::DescriptorExtractor;
use smartvision_core::tracking::domain::face_detector::FaceDetector;
use smartvision_core::tracking::domain::face_landmarks::FaceLandmarks;
use smartvision_core::tracking::domain::landmark_extractor::LandmarkExtractor;
use smartvision_core::tracking::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use smartvision_core::tracking::slot::SlotState;

const DETECTOR_MODEL: &str = "face_detection.onnx";
const LANDMARK_MODEL: &str = "face_landmarks.onnx";
const DESCRIPTOR_MODEL: &str = "face_recognition.onnx";

/// Multi-face tracking and recognition over video files.
#[derive(Parser)]
#[command(name = "smartvision")]
struct Cli {
    /// Directory containing the ONNX model files.
    #[arg(long, default_value = "models")]
    models: PathBuf,

    /// Path to the identity gallery JSON file.
    #[arg(long, default_value = "gallery.json")]
    gallery: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track and recognize faces in a video file.
    Run {
        /// Input video file.
        input: PathBuf,

        /// Face detection confidence threshold (0.0-1.0).
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
        confidence: f64,

        /// Write the final annotated frame to this image file.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Enroll a face from a photo into the gallery.
    Enroll {
        /// Name to store the face under.
        #[arg(long)]
        name: String,

        /// Photo containing exactly one face.
        image: PathBuf,
    },
    /// List enrolled names.
    List,
    /// Remove an enrolled name from the gallery.
    Remove {
        /// Name to remove.
        name: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = JsonGalleryStore::new(&cli.gallery);

    match cli.command {
        Command::Run {
            input,
            confidence,
            snapshot,
        } => run_engine(&input, &cli.models, &store, confidence, snapshot.as_deref()),
        Command::Enroll { name, image } => enroll(&name, &image, &cli.models, &store),
        Command::List => {
            for name in store.names()? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Remove { name } => {
            store.remove(&name)?;
            log::info!("Removed '{}' from the gallery", name.to_uppercase());
            Ok(())
        }
    }
}

fn run_engine(
    input: &Path,
    models: &Path,
    store: &JsonGalleryStore,
    confidence: f64,
    snapshot: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!("Confidence must be between 0.0 and 1.0, got {confidence}").into());
    }

    let source = FfmpegFrameSource::open(input)?;
    log::info!(
        "Opened {} ({}x{} @ {:.1} fps)",
        input.display(),
        source.width(),
        source.height(),
        source.fps()
    );

    let detector: Box<dyn FaceDetector> = Box::new(OnnxFaceDetector::new(
        &models.join(DETECTOR_MODEL),
        confidence,
    )?);
    let recognition = build_recognition(models)?;
    if !recognition.recognition_enabled() {
        log::warn!("Recognition disabled; tracking will label all faces UNKNOWN");
    }

    let gallery = store.load()?;
    log::info!("Gallery loaded: {} identities", gallery.len());

    let mut engine = TrackingEngine::new(
        Box::new(source),
        detector,
        recognition,
        Box::new(StdoutEngineLogger::default()),
        EngineConfig::default(),
    );
    engine.set_gallery(gallery);
    engine.start()?;

    let mut last_output: Option<EngineOutput> = None;
    let mut polls: usize = 0;
    while engine.is_running() {
        std::thread::sleep(Duration::from_millis(200));
        if let Some(output) = engine.take_output() {
            polls += 1;
            if polls % 5 == 0 {
                print_status(&output);
            }
            last_output = Some(output);
        }
    }
    engine.stop();

    if let Some(path) = snapshot {
        match last_output {
            Some(output) => {
                save_snapshot(&output.frame, path)?;
                log::info!("Snapshot written to {}", path.display());
            }
            None => log::warn!("No frames processed; snapshot skipped"),
        }
    }

    Ok(())
}

fn print_status(output: &EngineOutput) {
    if output.faces.is_empty() {
        return;
    }
    for face in &output.faces {
        let state = match face.state {
            SlotState::Idle => "IDLE",
            SlotState::Searching => "SEARCHING",
            SlotState::Confirmed => "CONFIRMED",
            SlotState::Lost => "LOST",
        };
        println!(
            "S{} {state:9} {:8} conf {:.1}  [{}, {}, {}, {}]",
            face.slot_id,
            face.name.as_deref().unwrap_or("UNKNOWN"),
            face.confidence,
            face.rect.left,
            face.rect.top,
            face.rect.right,
            face.rect.bottom,
        );
    }
}

/// Recognition needs the landmark and descriptor models; if either is
/// missing, recognition is disabled and tracking runs on its own.
fn build_recognition(models: &Path) -> Result<RecognitionEngine, Box<dyn std::error::Error>> {
    let landmark_path = models.join(LANDMARK_MODEL);
    let descriptor_path = models.join(DESCRIPTOR_MODEL);

    if !landmark_path.exists() {
        log::warn!("Landmark model not found at {}", landmark_path.display());
        return Ok(RecognitionEngine::new(
            Box::new(DisabledLandmarkExtractor),
            None,
        ));
    }

    let landmark_extractor: Box<dyn LandmarkExtractor> =
        Box::new(OnnxLandmarkExtractor::new(&landmark_path)?);

    let descriptor_extractor: Option<Box<dyn DescriptorExtractor>> = if descriptor_path.exists() {
        Some(Box::new(OnnxDescriptorExtractor::new(&descriptor_path)?))
    } else {
        log::warn!(
            "Recognition model not found at {}",
            descriptor_path.display()
        );
        None
    };

    Ok(RecognitionEngine::new(
        landmark_extractor,
        descriptor_extractor,
    ))
}

/// Stand-in landmark capability when the model file is absent.
struct DisabledLandmarkExtractor;

impl LandmarkExtractor for DisabledLandmarkExtractor {
    fn extract(
        &mut self,
        _frame: &Frame,
        _rect: &Rect,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
        Ok(None)
    }
}

fn enroll(
    name: &str,
    image_path: &Path,
    models: &Path,
    store: &JsonGalleryStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = load_image_as_frame(image_path)?;

    let mut detector = OnnxFaceDetector::new(&models.join(DETECTOR_MODEL), DEFAULT_CONFIDENCE)?;
    let faces = detector.detect(&frame)?;
    match faces.len() {
        1 => {}
        0 => return Err("No face found in the photo".into()),
        n => return Err(format!("Expected exactly one face in the photo, found {n}").into()),
    }

    let mut landmark_extractor = OnnxLandmarkExtractor::new(&models.join(LANDMARK_MODEL))?;
    let landmarks = landmark_extractor
        .extract(&frame, &faces[0])?
        .ok_or("No visible landmarks on the detected face")?;

    let mut descriptor_extractor =
        OnnxDescriptorExtractor::new(&models.join(DESCRIPTOR_MODEL))?;
    let embedding = descriptor_extractor.extract(&frame, &landmarks)?;

    store.add(name, embedding)?;
    log::info!("Enrolled '{}'", name.to_uppercase());
    Ok(())
}

/// Decode a photo into an RGB [`Frame`] for the ONNX adapters.
fn load_image_as_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.into_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, 0))
}

fn save_snapshot(frame: &Frame, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let img: image::RgbImage =
        image::ImageBuffer::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Frame buffer does not match its dimensions")?;
    img.save(path)?;
    Ok(())
}
