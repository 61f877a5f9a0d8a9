/// Today's temperatures for the configured point, in °C.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub weather_code: Option<u8>,
}

/// German description of a WMO weather interpretation code.
pub fn describe_weather_code(code: u8) -> Option<&'static str> {
    let text = match code {
        0 => "Klar",
        1 => "Überwiegend klar",
        2 => "Teilweise bewölkt",
        3 => "Bedeckt",
        45 | 48 => "Nebel",
        51 | 53 | 55 => "Nieselregen",
        56 | 57 => "Gefrierender Nieselregen",
        61 | 63 | 65 => "Regen",
        66 | 67 => "Gefrierender Regen",
        71 | 73 | 75 | 77 => "Schnee",
        80..=82 => "Regenschauer",
        85 | 86 => "Schneeschauer",
        95 => "Gewitter",
        96 | 99 => "Gewitter mit Hagel",
        _ => return None,
    };
    Some(text)
}
