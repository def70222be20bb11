//! Production line stations
//!
//! Static description of the seven process steps, in line order.

use serde::{Deserialize, Serialize};

use crate::consts::STATION_COUNT;

/// Station identifiers in line order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationId {
    Press,
    Drying,
    Glaze,
    Print,
    Kiln,
    Sorting,
    Packaging,
}

impl StationId {
    pub const ALL: [StationId; STATION_COUNT] = [
        StationId::Press,
        StationId::Drying,
        StationId::Glaze,
        StationId::Print,
        StationId::Kiln,
        StationId::Sorting,
        StationId::Packaging,
    ];

    /// Position on the line (0 = press)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StationId::Press => "press",
            StationId::Drying => "drying",
            StationId::Glaze => "glaze",
            StationId::Print => "print",
            StationId::Kiln => "kiln",
            StationId::Sorting => "sorting",
            StationId::Packaging => "packaging",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s.to_lowercase())
    }
}

/// A nominal machine reading shown on the station card
#[derive(Debug, Clone, Copy)]
pub struct StationStat {
    pub label: &'static str,
    pub value: &'static str,
    pub unit: &'static str,
}

impl StationStat {
    /// Leading numeric part of the value ("110-125" reads as 110), 0 if none
    pub fn numeric_value(&self) -> f64 {
        let end = self
            .value
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
            .map_or(self.value.len(), |(i, _)| i);
        self.value[..end].parse().unwrap_or(0.0)
    }
}

/// Static station description
#[derive(Debug, Clone, Copy)]
pub struct StationInfo {
    pub id: StationId,
    pub name: &'static str,
    pub protocol: &'static str,
    pub stats: &'static [StationStat],
}

const fn stat(label: &'static str, value: &'static str, unit: &'static str) -> StationStat {
    StationStat { label, value, unit }
}

/// The line, press first
pub const STATIONS: [StationInfo; STATION_COUNT] = [
    StationInfo {
        id: StationId::Press,
        name: "PRESS",
        protocol: "Modbus TCP",
        stats: &[stat("Press Force", "2500", "bar"), stat("Vibration", "0.8", "mm/s")],
    },
    StationInfo {
        id: StationId::Drying,
        name: "DRYING",
        protocol: "OPC-UA",
        stats: &[stat("Humidity", "5", "%"), stat("Temp", "110-125", "°C")],
    },
    StationInfo {
        id: StationId::Glaze,
        name: "GLAZE/COLOR",
        protocol: "Modbus RTU",
        stats: &[stat("Viscosity", "45", "s"), stat("Weight", "680", "g/m²")],
    },
    StationInfo {
        id: StationId::Print,
        name: "DIGITAL PRINT",
        protocol: "OPC-UA",
        stats: &[stat("Head Temp", "42", "°C"), stat("Pressure", "2.1", "bar")],
    },
    StationInfo {
        id: StationId::Kiln,
        name: "KILN",
        protocol: "Modbus TCP",
        stats: &[stat("Temp", "1203", "°C"), stat("Energy", "18.2", "kWh")],
    },
    StationInfo {
        id: StationId::Sorting,
        name: "SORTING",
        protocol: "AI Vision",
        stats: &[stat("Quality", "92.7", "%"), stat("Grade A", "85", "%")],
    },
    StationInfo {
        id: StationId::Packaging,
        name: "PACKAGING",
        protocol: "Modbus RTU",
        stats: &[stat("Count", "6", "pcs"), stat("Weight", "28.5", "kg")],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_in_line_order() {
        for (i, station) in STATIONS.iter().enumerate() {
            assert_eq!(station.id.index(), i);
            assert_eq!(StationId::ALL[i], station.id);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(StationId::from_str("Kiln"), Some(StationId::Kiln));
        assert_eq!(StationId::from_str("oven"), None);
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(stat("Temp", "110-125", "°C").numeric_value(), 110.0);
        assert_eq!(stat("Pressure", "2.1", "bar").numeric_value(), 2.1);
        assert_eq!(stat("Mode", "auto", "").numeric_value(), 0.0);
    }
}
