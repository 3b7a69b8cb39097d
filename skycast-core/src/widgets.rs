//! View models for the dashboard grid.
//!
//! Every builder returns `None` when the data it needs is missing, which the
//! presentation layer renders as a loading placeholder. Temperatures arrive
//! in Kelvin and are converted for the chosen [`Unit`] here.

use chrono::NaiveDate;

use crate::{
    clock::unix_to_time,
    daily::{aggregate_five_day, todays_entries},
    model::{AirQuality, FiveDayForecast, Forecast, UvIndex},
    units::{Unit, convert_wind_speed, format_temperature},
};

/// Upper bound of the UV progress bar.
pub const UV_SCALE_MAX: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Drizzle,
    Rain,
    Snow,
    Clear,
    Fog,
    Clouds,
    Thunderstorm,
}

impl WeatherIcon {
    /// Icon for an OpenWeather condition group ("Rain", "Clouds", ...).
    pub fn for_condition(main: &str) -> Self {
        match main {
            "Drizzle" => WeatherIcon::Drizzle,
            "Rain" => WeatherIcon::Rain,
            "Snow" => WeatherIcon::Snow,
            "Clear" => WeatherIcon::Clear,
            "Atmosphere" => WeatherIcon::Fog,
            "Clouds" => WeatherIcon::Clouds,
            "Thunderstorm" => WeatherIcon::Thunderstorm,
            _ => WeatherIcon::Clear,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            WeatherIcon::Drizzle => "🌦",
            WeatherIcon::Rain => "🌧",
            WeatherIcon::Snow => "❄",
            WeatherIcon::Clear => "☀",
            WeatherIcon::Fog => "🌫",
            WeatherIcon::Clouds => "☁",
            WeatherIcon::Thunderstorm => "⛈",
        }
    }
}

pub fn humidity_band(humidity: f64) -> &'static str {
    match humidity {
        h if h < 20.0 => "Very Dry: May cause skin, eye, and respiratory irritation.",
        h if h < 30.0 => "Dry: Can lead to dry skin and discomfort.",
        h if h < 40.0 => "Slightly Dry: Acceptable but may feel a bit dry indoors.",
        h if h < 60.0 => "Comfortable: Ideal humidity for health and indoor comfort.",
        h if h < 70.0 => "Moderately Humid: May feel muggy; allergens may increase.",
        h if h < 85.0 => "High Humidity: Feels sticky and can lead to discomfort.",
        _ => "Very High Humidity: Risk of mold, mildew, and heat-related fatigue.",
    }
}

pub fn pressure_band(hpa: f64) -> &'static str {
    match hpa {
        p if p < 980.0 => "Very Low: Possible stormy or unsettled weather.",
        p if p < 1000.0 => "Low: Often associated with cloudy, rainy, or windy weather.",
        p if p < 1013.0 => "Slightly Below Average: May indicate changing weather conditions.",
        p if p == 1013.0 => "Average: Standard atmospheric pressure at sea level.",
        p if p <= 1025.0 => "Above Average: Often brings calm and clear weather.",
        _ => "High: Indicates very stable and dry conditions, often sunny.",
    }
}

pub fn visibility_band(km: f64) -> &'static str {
    match km {
        v if v >= 40.0 => "Excellent: Nearly unlimited visibility.",
        v if v >= 20.0 => "Very Good: Clear conditions.",
        v if v >= 10.0 => "Good: Easily navigable.",
        v if v >= 4.0 => "Moderate: Some limitations on long-distance clarity.",
        v if v >= 1.0 => "Poor: Restricted visibility, caution advised.",
        _ => "Very Poor: Dangerous for navigation.",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvCategory {
    pub label: &'static str,
    pub advice: &'static str,
}

pub fn uv_category(uv: f64) -> UvCategory {
    let (label, advice) = match uv {
        u if u <= 2.0 => ("Low", "No protection required."),
        u if u <= 5.0 => ("Moderate", "Stay in shade near midday."),
        u if u <= 7.0 => ("High", "Wear a hat and sunglasses."),
        u if u <= 10.0 => ("Very High", "Apply sunscreen and wear protective clothing."),
        _ => ("Extremely High", "Take extra precautions and avoid the sun."),
    };
    UvCategory { label, advice }
}

/// Position on the UV bar, 0..=100.
pub fn uv_progress(uv: f64) -> f64 {
    (uv / UV_SCALE_MAX * 100.0).min(100.0)
}

/// Description for an `aqi * 10` rating; `None` off the table.
pub fn air_quality_description(rating: u32) -> Option<&'static str> {
    Some(match rating {
        10 => "excellent",
        20 => "good",
        30 => "satisfactory",
        40 => "fair",
        50 | 60 => "moderate",
        70 | 80 => "poor",
        90 | 100 => "very poor",
        _ => return None,
    })
}

/// Compare the felt temperature with the midpoint of the day's range.
pub fn feels_like_description(feels_like: f64, temp_min: f64, temp_max: f64) -> &'static str {
    let avg = (temp_min + temp_max) / 2.0;

    if feels_like < avg - 5.0 {
        "Feels significantly colder than actual temperature."
    } else if feels_like >= avg - 5.0 && feels_like <= avg + 5.0 {
        "Feels close to actual temperature."
    } else if feels_like > avg + 5.0 {
        "Feels significantly warmer than actual temperature."
    } else {
        "Temperature feeling is typical for this range."
    }
}

/// "12.3M", "456.7K" or the plain number.
pub fn format_population(n: u64) -> String {
    match n {
        n if n >= 1_000_000 => format!("{:.1}M", n as f64 / 1_000_000.0),
        n if n >= 1_000 => format!("{:.1}K", n as f64 / 1_000.0),
        n => n.to_string(),
    }
}

pub fn wind_direction(degrees: f64) -> &'static str {
    match degrees.rem_euclid(360.0).round() as u16 {
        0..=11 | 349..=360 => "N",
        12..=33 => "NNE",
        34..=56 => "NE",
        57..=78 => "ENE",
        79..=101 => "E",
        102..=123 => "ESE",
        124..=146 => "SE",
        147..=168 => "SSE",
        169..=191 => "S",
        192..=213 => "SSW",
        214..=236 => "SW",
        237..=258 => "WSW",
        259..=281 => "W",
        282..=303 => "WNW",
        304..=326 => "NW",
        327..=348 => "NNW",
        _ => "N",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureView {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub icon: WeatherIcon,
    pub low: String,
    pub high: String,
    pub timezone: i32,
}

pub fn temperature_view(forecast: &Forecast, unit: Unit) -> Option<TemperatureView> {
    let main = forecast.main.as_ref()?;
    let condition = forecast.condition()?;

    Some(TemperatureView {
        city: forecast.name.clone().unwrap_or_default(),
        temperature: format_temperature(main.temp, unit),
        description: condition.description.clone(),
        icon: WeatherIcon::for_condition(&condition.main),
        low: format_temperature(main.temp_min, unit),
        high: format_temperature(main.temp_max, unit),
        timezone: forecast.timezone.unwrap_or_default(),
    })
}

/// A reading with its band description.
#[derive(Debug, Clone, PartialEq)]
pub struct BandView {
    pub value: String,
    pub description: &'static str,
}

pub fn feels_like_view(forecast: &Forecast, unit: Unit) -> Option<BandView> {
    let main = forecast.main.as_ref()?;

    Some(BandView {
        value: format_temperature(main.feels_like, unit),
        description: feels_like_description(main.feels_like, main.temp_min, main.temp_max),
    })
}

pub fn humidity_view(forecast: &Forecast) -> Option<BandView> {
    let humidity = forecast.main.as_ref()?.humidity;

    Some(BandView {
        value: format!("{humidity}%"),
        description: humidity_band(humidity),
    })
}

pub fn pressure_view(forecast: &Forecast) -> Option<BandView> {
    let pressure = forecast.main.as_ref()?.pressure;

    Some(BandView {
        value: format!("{pressure} hPa"),
        description: pressure_band(pressure),
    })
}

pub fn visibility_view(forecast: &Forecast) -> Option<BandView> {
    let km = forecast.visibility? / 1000.0;

    Some(BandView {
        value: format!("{} km", km.round()),
        description: visibility_band(km),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindView {
    pub speed: String,
    pub degrees: f64,
    pub direction: &'static str,
}

pub fn wind_view(forecast: &Forecast, unit: Unit) -> Option<WindView> {
    let wind = forecast.wind.as_ref()?;

    Some(WindView {
        speed: format!("{} {}", convert_wind_speed(wind.speed, unit), unit.speed_symbol()),
        degrees: wind.deg,
        direction: wind_direction(wind.deg),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunView {
    pub sunrise: String,
    pub sunset: String,
}

pub fn sun_view(forecast: &Forecast) -> Option<SunView> {
    let sys = forecast.sys.as_ref()?;
    let tz = forecast.timezone.unwrap_or_default();

    Some(SunView {
        sunrise: unix_to_time(sys.sunrise, tz),
        sunset: unix_to_time(sys.sunset, tz),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct UvView {
    /// One decimal place.
    pub value: String,
    pub category: UvCategory,
    pub progress: f64,
}

pub fn uv_view(uv: &UvIndex) -> Option<UvView> {
    let value = uv.result.as_ref()?.uv;
    let shown = format!("{value:.1}");
    // The label follows the number on screen; the advice follows the reading.
    let label = uv_category(shown.parse().unwrap_or(value)).label;

    Some(UvView {
        category: UvCategory { label, advice: uv_category(value).advice },
        value: shown,
        progress: uv_progress(value),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityView {
    /// `aqi * 10`, also the bar position out of 100.
    pub rating: u32,
    pub description: Option<&'static str>,
}

pub fn air_quality_view(air: &AirQuality) -> Option<AirQualityView> {
    let rating = u32::from(air.current()?.main.aqi) * 10;

    Some(AirQualityView {
        rating,
        description: air_quality_description(rating),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationView {
    pub city: String,
    pub population: String,
}

pub fn population_view(five_day: &FiveDayForecast) -> Option<PopulationView> {
    let city = five_day.city.as_ref()?;

    Some(PopulationView {
        city: city.name.clone(),
        population: format_population(city.population.unwrap_or_default()),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub day: String,
    pub low: String,
    pub high: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiveDayView {
    pub city: String,
    pub days: Vec<DayRow>,
}

pub fn five_day_view(five_day: &FiveDayForecast, unit: Unit) -> Option<FiveDayView> {
    let city = five_day.city.as_ref()?;

    let days = aggregate_five_day(&five_day.list, city.timezone)
        .into_iter()
        .map(|d| DayRow {
            day: d.day,
            low: format_temperature(d.min_temp, unit),
            high: format_temperature(d.max_temp, unit),
        })
        .collect();

    Some(FiveDayView { city: city.name.clone(), days })
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourSlot {
    /// "HH:MM" from the sample's UTC timestamp text.
    pub time: String,
    pub temperature: String,
    pub icon: WeatherIcon,
}

/// Today's 3-hourly slots. `None` until both the current and five-day
/// forecasts are present, or when no sample falls on `today`.
pub fn today_view(
    forecast: &Forecast,
    five_day: &FiveDayForecast,
    today: NaiveDate,
    unit: Unit,
) -> Option<Vec<HourSlot>> {
    forecast.condition()?;
    five_day.city.as_ref()?;

    let slots: Vec<_> = todays_entries(&five_day.list, today)
        .into_iter()
        .map(|item| HourSlot {
            time: item.dt_txt.get(11..16).unwrap_or_default().to_string(),
            temperature: format_temperature(item.main.temp, unit),
            icon: item
                .weather
                .first()
                .map_or(WeatherIcon::Clear, |c| WeatherIcon::for_condition(&c.main)),
        })
        .collect();

    (!slots.is_empty()).then_some(slots)
}
