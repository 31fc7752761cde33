//! Recognition records handed to the consumer

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of travel reported by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Approaching,
    Leaving,
    #[default]
    Unknown,
}

impl Direction {
    /// Map the camera's `VehicleDirection` value
    pub fn from_vehicle_direction(value: &str) -> Self {
        match value {
            "forward" => Direction::Approaching,
            "reverse" => Direction::Leaving,
            _ => Direction::Unknown,
        }
    }
}

/// One license plate read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Plate text as received, never empty
    pub plate: String,
    /// Normalized confidence in `0..=100`
    pub confidence: u8,
    pub direction: Direction,
    pub country: String,
    pub nation: String,
    /// Time between issuing the pull and producing this record
    pub camera_response_duration: Duration,
    /// Snapshot location, sent by some firmware revisions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_uri: Option<String>,
}

impl Recognition {
    /// Attach a fresh id and observation timestamp
    ///
    /// ```rust
    /// use hikrec::{Direction, Recognition};
    /// use std::time::Duration;
    ///
    /// let recognition = Recognition {
    ///     plate: "ABC123".to_string(),
    ///     confidence: 87,
    ///     direction: Direction::Approaching,
    ///     country: String::new(),
    ///     nation: String::new(),
    ///     camera_response_duration: Duration::from_millis(120),
    ///     picture_uri: None,
    /// };
    ///
    /// let identified = recognition.identify();
    /// assert_eq!(identified.recognition.plate, "ABC123");
    /// ```
    pub fn identify(self) -> IdentifiedRecognition {
        IdentifiedRecognition {
            id: Uuid::new_v4(),
            observed_at: Utc::now(),
            recognition: self,
        }
    }
}

/// A recognition tagged with caller-side identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedRecognition {
    pub id: Uuid,
    pub observed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub recognition: Recognition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Recognition {
        Recognition {
            plate: "ABC123".to_string(),
            confidence: 87,
            direction: Direction::Leaving,
            country: "DE".to_string(),
            nation: "EU".to_string(),
            camera_response_duration: Duration::from_millis(250),
            picture_uri: None,
        }
    }

    #[rstest]
    #[case("forward", Direction::Approaching)]
    #[case("reverse", Direction::Leaving)]
    #[case("unknown", Direction::Unknown)]
    #[case("Forward", Direction::Unknown)]
    #[case("", Direction::Unknown)]
    fn test_direction_mapping(#[case] value: &str, #[case] expected: Direction) {
        assert_eq!(Direction::from_vehicle_direction(value), expected);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["plate"], "ABC123");
        assert_eq!(json["confidence"], 87);
        assert_eq!(json["direction"], "Leaving");
        assert_eq!(json["country"], "DE");
        assert_eq!(json["nation"], "EU");
        assert!(json.get("camera_response_duration").is_some());
        assert!(json.get("picture_uri").is_none());
    }

    #[test]
    fn test_identify_assigns_unique_ids() {
        let first = sample().identify();
        let second = sample().identify();
        assert_ne!(first.id, second.id);
        assert_eq!(first.recognition, second.recognition);

        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["plate"], "ABC123");
        assert_eq!(json["id"], first.id.to_string());
    }
}
