// MIT License - Copyright (c) 2026 The kb-link Authors
//
// Per-device handles over the panel and relay controllers.

pub mod buzzer;
pub mod led;
pub mod relay_port;
