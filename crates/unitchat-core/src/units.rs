//! Display-only catalog of supported unit categories. No conversion happens here.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnitCategory {
    pub icon: &'static str,
    pub title: &'static str,
    /// Example pairs, e.g. "Kilometers ↔ Miles".
    pub pairs: &'static [&'static str],
}

static UNIT_CATALOG: [UnitCategory; 5] = [
    UnitCategory {
        icon: "🔹",
        title: "Length",
        pairs: &[
            "Kilometers ↔ Miles",
            "Meters ↔ Feet",
            "Centimeters ↔ Inches",
            "Millimeters ↔ Inches",
            "Yards ↔ Meters",
            "Nautical Miles ↔ Miles",
        ],
    },
    UnitCategory {
        icon: "⚖️",
        title: "Weight & Mass",
        pairs: &[
            "Grams ↔ Pounds",
            "Kilograms ↔ Ounces",
            "Stones ↔ Kilograms",
            "Tons ↔ Kilograms",
            "Milligrams ↔ Micrograms",
        ],
    },
    UnitCategory {
        icon: "🌡️",
        title: "Temperature & Energy",
        pairs: &[
            "Celsius ↔ Fahrenheit",
            "Fahrenheit ↔ Celsius",
            "Kelvin ↔ Celsius",
            "Joules ↔ Calories",
            "Kilocalories ↔ Joules",
            "Kilojoules ↔ Calories",
        ],
    },
    UnitCategory {
        icon: "⏳",
        title: "Time & Speed",
        pairs: &[
            "Seconds ↔ Minutes",
            "Minutes ↔ Hours",
            "Hours ↔ Days",
            "Days ↔ Weeks",
            "Weeks ↔ Months",
            "Months ↔ Years",
            "Milliseconds ↔ Microseconds",
            "Meters per Second ↔ Kilometers per Hour",
            "Miles per Hour ↔ Kilometers per Hour",
            "Knots ↔ Kilometers per Hour",
        ],
    },
    UnitCategory {
        icon: "⚡",
        title: "Power, Pressure, & Digital Storage",
        pairs: &[
            "Watts ↔ Horsepower",
            "Kilowatts ↔ Megawatts",
            "Degrees ↔ Radians",
            "Pascals ↔ Atmospheres",
            "Bars ↔ PSI",
            "Bits ↔ Bytes",
            "Kilobytes ↔ Megabytes",
            "Gigabytes ↔ Terabytes",
        ],
    },
];

pub fn unit_catalog() -> &'static [UnitCategory] {
    &UNIT_CATALOG
}
