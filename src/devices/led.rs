// MIT License - Copyright (c) 2026 The kb-link Authors

use std::sync::Arc;

use crate::error::Result;
use crate::panel::PanelController;
use crate::protocol::{LedColor, LedMode};

/// One of the panel's three LEDs.
#[derive(Debug, Clone)]
pub struct PanelLed {
    panel: Arc<PanelController>,
    color: LedColor,
}

impl PanelLed {
    pub fn new(panel: Arc<PanelController>, color: LedColor) -> Self {
        Self { panel, color }
    }

    /// All three LEDs of `panel`, green first.
    pub fn all(panel: &Arc<PanelController>) -> Vec<Self> {
        LedColor::ALL
            .iter()
            .map(|&color| Self::new(panel.clone(), color))
            .collect()
    }

    pub fn color(&self) -> LedColor {
        self.color
    }

    /// Display name, e.g. "Green LED".
    pub fn name(&self) -> String {
        led_name(self.color)
    }

    pub async fn mode(&self) -> Result<LedMode> {
        self.panel.get_led_mode(self.color).await
    }

    pub async fn set_mode(&self, mode: LedMode) -> Result<()> {
        self.panel.set_led_mode(self.color, mode).await
    }

    pub async fn is_on(&self) -> Result<bool> {
        Ok(self.mode().await?.is_on())
    }

    /// Turn on with the given effect, or steady ON.
    pub async fn turn_on(&self, effect: Option<LedMode>) -> Result<()> {
        self.set_mode(effect.unwrap_or(LedMode::On)).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_mode(LedMode::Off).await
    }
}

fn led_name(color: LedColor) -> String {
    let name = color.as_str();
    format!("{}{} LED", &name[..1], name[1..].to_ascii_lowercase())
}
