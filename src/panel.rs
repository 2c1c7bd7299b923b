// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Push button and indicator LEDs.

use crate::decode::Confidence;

/// Capture trigger, usually a push button.
pub trait Trigger {
    /// Non-blocking read of the trigger state.
    fn is_pressed(&mut self) -> bool;

    /// The trigger can never fire again.
    fn is_closed(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Led {
    /// Green.
    Status,
    /// Red.
    Alert,
}

pub trait Indicators {
    fn set(&mut self, led: Led, on: bool);

    fn all_off(&mut self) {
        self.set(Led::Status, false);
        self.set(Led::Alert, false);
    }

    /// High lights status only, medium lights both, low lights alert only.
    fn show_confidence(&mut self, confidence: Confidence) {
        let (status, alert) = match confidence {
            Confidence::High => (true, false),
            Confidence::Medium => (true, true),
            Confidence::Low => (false, true),
        };
        self.set(Led::Status, status);
        self.set(Led::Alert, alert);
    }
}
