use std::sync::Arc;

use crate::adapters::{FfmpegTranscodeAdapter, FfprobeAdapter, TrimConfig};
use crate::app::trim_interactor::TrimInteractor;
use crate::ports::{ProbePort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn trim_interactor(&self) -> Arc<TrimInteractor>;
    fn probe(&self) -> Arc<dyn ProbePort>;
}

pub struct DefaultAppContainer {
    trim_interactor: Arc<TrimInteractor>,
    probe: Arc<dyn ProbePort>,
}

impl DefaultAppContainer {
    pub fn new(config: &TrimConfig) -> Self {
        let mut engine = FfmpegTranscodeAdapter::new(config.ffmpeg_path.clone());
        if let Some(work_dir) = &config.work_dir {
            engine = engine.with_work_root(work_dir);
        }
        let probe = Arc::new(FfprobeAdapter::new(config.ffprobe_path.clone()));

        Self::with_ports(Arc::new(engine), probe)
    }

    /// Wire the application around caller-provided ports
    pub fn with_ports(engine: Arc<dyn TranscodePort>, probe: Arc<dyn ProbePort>) -> Self {
        Self {
            trim_interactor: Arc::new(TrimInteractor::new(engine)),
            probe,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn trim_interactor(&self) -> Arc<TrimInteractor> {
        Arc::clone(&self.trim_interactor)
    }

    fn probe(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe)
    }
}
