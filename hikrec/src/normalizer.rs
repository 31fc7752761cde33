//! Conversion of raw notifications into recognitions

use std::time::Instant;

use onvif_events::RawMessage;

use crate::recognition::{Direction, Recognition};

/// Turn one notification into a recognition
///
/// Returns `None` when the message carries no usable plate. `pull_started`
/// is when the pull that delivered the message was issued.
pub fn normalize(message: &RawMessage, pull_started: Instant) -> Option<Recognition> {
    let mut plate = String::new();
    let mut confidence = 0;
    let mut direction = Direction::Unknown;
    let mut country = String::new();
    let mut nation = String::new();
    let mut picture_uri = None;

    for item in &message.data {
        match item.name.as_str() {
            "PlateNumber" => plate = item.value.clone(),
            "Likelihood" => {
                if let Some(value) = parse_confidence(&item.value) {
                    confidence = value;
                }
            }
            "Nation" => nation = item.value.clone(),
            "Country" => country = item.value.clone(),
            "VehicleDirection" => direction = Direction::from_vehicle_direction(&item.value),
            "PictureUri" => picture_uri = Some(item.value.clone()),
            _ => {}
        }
    }

    if plate.is_empty() || plate == "unknown" {
        tracing::trace!(topic = ?message.topic, "skipping notification without plate");
        return None;
    }

    Some(Recognition {
        plate,
        confidence,
        direction,
        country,
        nation,
        camera_response_duration: pull_started.elapsed(),
        picture_uri,
    })
}

/// Parse a `Likelihood` value onto the `0..=100` scale
///
/// Firmware reporting per-mille values is rescaled by ten.
pub fn parse_confidence(value: &str) -> Option<u8> {
    let raw: i64 = value.parse().ok()?;
    let scaled = if raw > 100 { raw / 10 } else { raw };
    Some(scaled.clamp(0, 100) as u8)
}
