use std::sync::Arc;

use dhakaclean_core::{AppServices, CameraDevice, CapturePipeline, ConversationSession, ViewCoordinator};
use tokio::sync::Mutex;

/// Shared application state accessible from all route handlers.
///
/// Every component lives for the whole process, whichever view is selected.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub chat: Arc<ConversationSession>,
    /// One capture action at a time; contenders get 409
    pub scanner: Arc<Mutex<CapturePipeline>>,
    pub views: Arc<Mutex<ViewCoordinator>>,
}

impl AppState {
    pub fn new(services: AppServices, camera: Arc<dyn CameraDevice>) -> Self {
        let chat = Arc::new(services.conversation());
        let scanner = Arc::new(Mutex::new(services.scanner(camera)));
        Self {
            services,
            chat,
            scanner,
            views: Arc::new(Mutex::new(ViewCoordinator::new())),
        }
    }
}
