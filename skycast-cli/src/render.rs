//! Plain-text rendering of the dashboard widgets.

use chrono::{DateTime, NaiveDate, Utc};
use skycast_core::{
    ChatMessage, DashboardData, Role, SearchHistoryItem, Unit,
    clock::CityTime,
    widgets::{self, BandView},
};

const PLACEHOLDER: &str = "(not available)";

fn section(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(title.chars().count()));
}

fn band(title: &str, view: Option<BandView>) {
    section(title);
    match view {
        Some(v) => {
            println!("{}", v.value);
            println!("{}", v.description);
        }
        None => println!("{PLACEHOLDER}"),
    }
}

/// Header line with the city's live clock.
pub fn clock_line(time: &CityTime) -> String {
    format!("{} {}", time.day, time.time)
}

pub fn dashboard(data: &DashboardData, unit: Unit, today: NaiveDate, time: Option<&CityTime>) {
    let forecast = data.forecast.data();
    let five_day = data.five_day.data();

    match forecast.and_then(|f| widgets::temperature_view(f, unit)) {
        Some(t) => {
            println!("{} {}  {}", t.icon.glyph(), t.city, t.temperature);
            if let Some(time) = time {
                println!("{}", clock_line(time));
            }
            println!("{}  (Low {}  High {})", t.description, t.low, t.high);
        }
        None => println!("{} {PLACEHOLDER}", data.at),
    }

    section("Today");
    match forecast
        .zip(five_day)
        .and_then(|(f, d)| widgets::today_view(f, d, today, unit))
    {
        Some(slots) => {
            let line: Vec<_> = slots
                .iter()
                .map(|s| format!("{} {} {}", s.time, s.icon.glyph(), s.temperature))
                .collect();
            println!("{}", line.join("   "));
        }
        None => println!("{PLACEHOLDER}"),
    }

    section("Air Pollution");
    match data.air_quality.data().and_then(widgets::air_quality_view) {
        Some(aq) => println!(
            "Air quality is {} ({}/100).",
            aq.description.unwrap_or("unknown"),
            aq.rating
        ),
        None => println!("{PLACEHOLDER}"),
    }

    section("Sunset");
    match forecast.and_then(widgets::sun_view) {
        Some(sun) => println!("Sunset {}  Sunrise {}", sun.sunset, sun.sunrise),
        None => println!("{PLACEHOLDER}"),
    }

    section("Wind");
    match forecast.and_then(|f| widgets::wind_view(f, unit)) {
        Some(w) => println!("{} from {} ({}°)", w.speed, w.direction, w.degrees),
        None => println!("{PLACEHOLDER}"),
    }

    section("UV Index");
    match data.uv_index.data().and_then(widgets::uv_view) {
        Some(uv) => {
            println!("{} ({})  [{}]", uv.value, uv.category.label, bar(uv.progress));
            println!("{}", uv.category.advice);
        }
        None => println!("{PLACEHOLDER}"),
    }

    section("Population");
    match five_day.and_then(widgets::population_view) {
        Some(p) => println!("{}: {}", p.city, p.population),
        None => println!("{PLACEHOLDER}"),
    }

    band("Feels Like", forecast.and_then(|f| widgets::feels_like_view(f, unit)));
    band("Humidity", forecast.and_then(widgets::humidity_view));
    band("Visibility", forecast.and_then(widgets::visibility_view));
    band("Pressure", forecast.and_then(widgets::pressure_view));

    match five_day.and_then(|d| widgets::five_day_view(d, unit)) {
        Some(view) => {
            section(&format!("5-Day Forecast for {}", view.city));
            for day in view.days {
                println!("{:<4} (Low) {:>6}   (High) {:>6}", day.day, day.low, day.high);
            }
        }
        None => {
            section("5-Day Forecast");
            println!("{PLACEHOLDER}");
        }
    }

    let failed = data.failed_resources();
    if !failed.is_empty() {
        eprintln!("\nSome data could not be loaded: {}", failed.join(", "));
    }
}

fn bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent / 100.0) * WIDTH as f64).round().clamp(0.0, WIDTH as f64) as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(WIDTH - filled))
}

pub fn history_item(item: &SearchHistoryItem) {
    let when = DateTime::<Utc>::from_timestamp_millis(item.searched_at)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    if item.query.is_empty() {
        println!("{}  {}  [{when}]", item.id, item.label());
    } else {
        println!("{}  {}  (\"{}\") [{when}]", item.id, item.label(), item.query);
    }
}

pub fn chat_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!("{who} [{}]:", message.timestamp.format("%H:%M"));
    println!("{}", message.content);
    if message.retryable {
        println!("(type /retry to ask again)");
    }
    println!();
}
