pub mod camera;
pub mod config;
pub mod conversation;
pub mod dashboard;
pub mod location;
pub mod routing;
pub mod scanner;
pub mod view;

pub use camera::*;
pub use config::*;
pub use conversation::*;
pub use location::*;
pub use routing::*;
pub use scanner::*;
pub use view::*;

use std::sync::Arc;

use anyhow::Result;
use dhakaclean_gateway::AiGateway;
use dhakaclean_provider::create_model;

/// Long-lived handles shared by every component. Built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub config: AppConfig,
    pub gateway: Arc<AiGateway>,
}

impl AppServices {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let model = create_model(&config.provider)?;
        let gateway = Arc::new(AiGateway::new(model, config.gateway_config()));
        Ok(Self { config, gateway })
    }

    pub fn conversation(&self) -> ConversationSession {
        ConversationSession::new(self.gateway.clone(), self.config.default_locator())
            .with_location_timeout(self.config.location_timeout())
    }

    pub fn scanner(&self, camera: Arc<dyn CameraDevice>) -> CapturePipeline {
        CapturePipeline::new(camera, self.gateway.clone())
    }
}
