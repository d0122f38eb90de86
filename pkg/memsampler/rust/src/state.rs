// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Configuration resolved, log not yet opened.
    Initializing,
    /// Log open, ticking.
    Sampling,
    /// Terminal. Reached on a shutdown signal or a fatal error.
    Stopped,
}

impl SamplerState {
    pub(crate) fn can_transition_to(self, next: SamplerState) -> bool {
        use SamplerState::*;
        matches!(
            (self, next),
            (Initializing, Sampling) | (Initializing, Stopped) | (Sampling, Stopped)
        )
    }
}

impl fmt::Display for SamplerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerState::Initializing => write!(f, "initializing"),
            SamplerState::Sampling => write!(f, "sampling"),
            SamplerState::Stopped => write!(f, "stopped"),
        }
    }
}
