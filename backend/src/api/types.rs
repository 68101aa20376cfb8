//! REST API types for the simulation server.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::Passenger;

/// Body of `POST /api/requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerRequest {
    /// Floor where the passenger waits
    pub origin: i32,
    pub destination: i32,
}

/// Response to an accepted passenger request.
///
/// The request is only queued for scheduling; progress shows up on
/// `/api/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerResponse {
    pub passenger_id: Uuid,
    pub origin: i32,
    pub destination: i32,
    /// Always "queued"
    pub status: String,
}

impl PassengerResponse {
    pub fn queued(passenger: &Passenger, origin: i32) -> Self {
        Self {
            passenger_id: passenger.id,
            origin,
            destination: passenger.destination(),
            status: "queued".to_string(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let passenger = Passenger::new(9);
        let json = serde_json::to_value(PassengerResponse::queued(&passenger, 2)).unwrap();

        assert_eq!(json["passengerId"], passenger.id.to_string());
        assert_eq!(json["origin"], 2);
        assert_eq!(json["destination"], 9);
        assert_eq!(json["status"], "queued");
    }

    #[test]
    fn test_error_response() {
        let json = error_response("Floor 40 is outside the building");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Floor 40 is outside the building");
    }
}
