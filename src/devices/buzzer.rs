// MIT License - Copyright (c) 2026 The kb-link Authors

use std::sync::Arc;

use crate::error::Result;
use crate::panel::PanelController;
use crate::protocol::BuzzerMode;

/// The panel's buzzer.
#[derive(Debug, Clone)]
pub struct PanelBuzzer {
    panel: Arc<PanelController>,
}

impl PanelBuzzer {
    pub fn new(panel: Arc<PanelController>) -> Self {
        Self { panel }
    }

    pub fn name(&self) -> &'static str {
        "Buzzer"
    }

    pub async fn mode(&self) -> Result<BuzzerMode> {
        self.panel.get_buzzer_mode().await
    }

    pub async fn set_mode(&self, mode: BuzzerMode) -> Result<()> {
        self.panel.set_buzzer_mode(mode).await
    }

    pub async fn is_on(&self) -> Result<bool> {
        Ok(self.mode().await?.is_on())
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_mode(BuzzerMode::On).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_mode(BuzzerMode::Off).await
    }
}
