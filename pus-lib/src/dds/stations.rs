#[cfg(feature = "serde")]
use serde::Serialize;

/// A ground station that may have received archived packets.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundStation {
    pub id: u8,
    pub organisation: &'static str,
    pub name: &'static str,
}

impl GroundStation {
    /// Look up a station by the id carried in a DDS header. Ids not in [GROUND_STATIONS]
    /// resolve to [UNKNOWN_STATION].
    #[must_use]
    pub fn lookup(id: u16) -> &'static GroundStation {
        u8::try_from(id)
            .ok()
            .and_then(|id| GROUND_STATIONS.iter().find(|gs| gs.id == id))
            .unwrap_or(&UNKNOWN_STATION)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        *self == UNKNOWN_STATION
    }
}

impl std::fmt::Display for GroundStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.organisation)
    }
}

/// Placeholder for station ids that are not in the table.
pub const UNKNOWN_STATION: GroundStation = GroundStation {
    id: 0xff,
    organisation: "Unknown",
    name: "Unknown",
};

const fn station(id: u8, organisation: &'static str, name: &'static str) -> GroundStation {
    GroundStation {
        id,
        organisation,
        name,
    }
}

/// Known ground stations, by id. Id 0 means no station.
pub static GROUND_STATIONS: &[GroundStation] = &[
    station(0x00, "", "None"),
    station(0x0d, "ESA", "Kiruna"),
    station(0x0e, "ESA", "Redu"),
    station(0x0f, "ESA", "Villafranca"),
    station(0x10, "ESA", "Kourou"),
    station(0x11, "ESA", "Perth"),
    station(0x12, "ESA", "Maspalomas"),
    station(0x13, "ESA", "Santiago"),
    station(0x14, "ESA", "Svalbard"),
    station(0x15, "ESA", "Malindi"),
    station(0x16, "ESA", "Cebreros"),
    station(0x17, "ESA", "New Norcia"),
    station(0x18, "ESA", "Malargue"),
    station(0x1e, "NASA", "Goldstone"),
    station(0x1f, "NASA", "Canberra"),
    station(0x20, "NASA", "Madrid"),
    station(0x28, "JAXA", "Usuda"),
    station(0x29, "JAXA", "Uchinoura"),
    station(0x7f, "ESA", "Test Station"),
];
