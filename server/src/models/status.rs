use std::fmt;

use serde::{Deserialize, Serialize};

/// Flight status codes understood by the FlightSurety app contract.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Unrecognized codes map to `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            10 => FlightStatus::OnTime,
            20 => FlightStatus::LateAirline,
            30 => FlightStatus::LateWeather,
            40 => FlightStatus::LateTechnical,
            50 => FlightStatus::LateOther,
            _ => FlightStatus::Unknown,
        }
    }

    /// Parses the path segment of `/api/flight-status/:code`. Only the exact
    /// strings "10" through "50" select a status.
    pub fn from_param(param: &str) -> Self {
        match param {
            "10" => FlightStatus::OnTime,
            "20" => FlightStatus::LateAirline,
            "30" => FlightStatus::LateWeather,
            "40" => FlightStatus::LateTechnical,
            "50" => FlightStatus::LateOther,
            _ => FlightStatus::Unknown,
        }
    }

    /// Human label used in the dashboard messages, e.g. "LATE AIRLINE".
    pub fn label(self) -> &'static str {
        match self {
            FlightStatus::Unknown => "UNKNOWN",
            FlightStatus::OnTime => "ON TIME",
            FlightStatus::LateAirline => "LATE AIRLINE",
            FlightStatus::LateWeather => "LATE WEATHER",
            FlightStatus::LateTechnical => "LATE TECHNICAL",
            FlightStatus::LateOther => "LATE OTHER",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}
