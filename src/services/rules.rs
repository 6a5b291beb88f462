// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity rules: decide which fields of a new activity to change.
//!
//! Each discipline has one pure rule over the activity snapshot and the
//! pre-fetched lookups. The weather line is a separate step whose diff is
//! merged on top of the rule's diff.

use crate::config::GearConfig;
use crate::models::{Activity, ActivityUpdate, Coordinates, Discipline, SummitTotal};
use crate::services::calendar::CalendarEvent;
use crate::services::weather::{WeatherInfo, WEATHER_MARKER};
use chrono::Timelike;
use std::ops::RangeInclusive;

/// Rides already named from the calendar start with this.
pub const CALENDAR_TITLE_PREFIX: &str = "TR: ";
const OUTSIDE_SUFFIX: &str = " - Outside";
/// `external_id` prefix of rides recorded by the TrainerRoad app on the trainer.
const TRAINER_SOURCE_PREFIX: &str = "trainerroad";

/// ErgZone puts its workout name on the first line and links back here.
const WORKOUT_LOG_SIGNATURE: &str = "app.erg.zone";
const WARM_UP_ROW: &str = "5:00 row";

/// Local hour before which a long walk is the morning dog walk.
const WALK_CUTOFF_HOUR: u32 = 9;
/// Seconds
const WALK_MIN_ELAPSED: i64 = 1200;
const DOG_WALK_TITLE: &str = "Emptying & Exercising the 🐶";

/// Seconds
const SHORT_STRENGTH_BAND: RangeInclusive<i64> = 180..=420;
const SHORT_STRENGTH_TITLE: &str = "Humane Burpees";

const NO_CHANGES: &str = "no activity changes";

/// Data gathered before the rules run.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub calendar_event: Option<CalendarEvent>,
    pub weather: Option<WeatherInfo>,
    pub summit: Option<SummitTotal>,
}

/// Outcome of the rules for one activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub update: ActivityUpdate,
    /// Human-readable summary for the logs
    pub reason: String,
}

/// Where the weather for an activity should be sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherLocation {
    /// Indoors or no GPS: use the configured home coordinate.
    Home,
    Gps(Coordinates),
}

/// Diff and reason produced by a single rule.
type RuleOutput = (ActivityUpdate, Option<String>);
type Rule = fn(&Activity, &Lookups, &GearConfig) -> RuleOutput;

fn rule_for(discipline: &Discipline) -> Option<Rule> {
    let rule: Rule = match discipline {
        Discipline::Handcycle => no_op,
        Discipline::Ride => ride,
        Discipline::VirtualRide => virtual_ride,
        Discipline::Rowing => rowing,
        Discipline::Walk => walk,
        Discipline::WeightTraining => weight_training,
        Discipline::Run | Discipline::Other(_) => return None,
    };
    Some(rule)
}

/// The fixed rule catalogue, parameterized by gear ids.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    gear: GearConfig,
}

impl RuleEngine {
    pub fn new(gear: GearConfig) -> Self {
        Self { gear }
    }

    /// Whether the rules will want a calendar event for this activity.
    pub fn needs_calendar(activity: &Activity) -> bool {
        activity.discipline() == Discipline::Ride
            && !activity.name.starts_with(CALENDAR_TITLE_PREFIX)
    }

    /// Where to sample weather, or `None` if no weather line should be added.
    pub fn weather_location(activity: &Activity) -> Option<WeatherLocation> {
        let discipline = activity.discipline();
        if discipline == Discipline::Handcycle || activity.description().contains(WEATHER_MARKER)
        {
            return None;
        }

        match activity.start_coordinates() {
            Some(coordinates) if !discipline.is_indoor() => {
                Some(WeatherLocation::Gps(coordinates))
            }
            _ => Some(WeatherLocation::Home),
        }
    }

    pub fn decide(&self, activity: &Activity, lookups: &Lookups) -> Decision {
        let (mut update, rule_reason) = match rule_for(&activity.discipline()) {
            Some(rule) => rule(activity, lookups, &self.gear),
            None => (ActivityUpdate::default(), None),
        };

        let mut reasons: Vec<String> = rule_reason.into_iter().collect();

        if let (Some(location), Some(weather)) =
            (Self::weather_location(activity), lookups.weather.as_ref())
        {
            let enrichment = weather_update(activity, &update, weather, location, lookups.summit);
            update = update.merge(enrichment);
            reasons.push("added weather".to_string());
        }

        let reason = if reasons.is_empty() {
            NO_CHANGES.to_string()
        } else {
            reasons.join(" & ")
        };

        Decision { update, reason }
    }
}

/// Append the weather line to the description the rule left behind.
fn weather_update(
    activity: &Activity,
    rule_update: &ActivityUpdate,
    weather: &WeatherInfo,
    location: WeatherLocation,
    summit: Option<SummitTotal>,
) -> ActivityUpdate {
    let mut weather = weather.clone();
    if location == WeatherLocation::Home {
        weather.start.coordinates = None;
        weather.end.coordinates = None;
    }
    let line = weather.render(summit.as_ref());

    // A rule that reset the description wants the weather line on its own.
    let base = rule_update
        .description
        .as_deref()
        .unwrap_or(activity.description());

    let description = if base.is_empty() {
        line
    } else {
        format!("{}\n\n{}", base, line)
    };

    ActivityUpdate {
        description: Some(description),
        ..Default::default()
    }
}

// ─── Rules ───────────────────────────────────────────────────

/// Never recorded for real; proves unmatched activities are left alone.
fn no_op(_: &Activity, _: &Lookups, _: &GearConfig) -> RuleOutput {
    (ActivityUpdate::default(), None)
}

fn ride(activity: &Activity, lookups: &Lookups, gear: &GearConfig) -> RuleOutput {
    let mut update = ActivityUpdate::default();
    let mut title = activity.name.clone();

    if !title.starts_with(CALENDAR_TITLE_PREFIX) {
        match lookups.calendar_event.as_ref().map(CalendarEvent::title) {
            Some(workout) if !workout.is_empty() => {
                title = format!("{}{}", CALENDAR_TITLE_PREFIX, workout);
            }
            _ => tracing::debug!(activity_id = activity.id, "No scheduled workout for ride"),
        }
    }

    if activity.is_from_external_source(TRAINER_SOURCE_PREFIX) {
        update.gear_id = Some(gear.trainer.clone());
        update.trainer = Some(true);
    } else {
        update.gear_id = Some(gear.bike.clone());
        if title.starts_with(CALENDAR_TITLE_PREFIX) && !title.ends_with(OUTSIDE_SUFFIX) {
            title.push_str(OUTSIDE_SUFFIX);
        }
    }

    let reason = if title != activity.name {
        let reason = format!("renamed ride to {:?} and set gear", title);
        update.name = Some(title);
        reason
    } else {
        "set ride gear".to_string()
    };

    (update, Some(reason))
}

fn virtual_ride(_: &Activity, _: &Lookups, gear: &GearConfig) -> RuleOutput {
    let update = ActivityUpdate {
        gear_id: Some(gear.trainer.clone()),
        trainer: Some(true),
        ..Default::default()
    };
    (update, Some("set gear to trainer".to_string()))
}

/// Human titles for ErgZone's generated interval workout names.
fn known_row_title(name: &str) -> Option<&'static str> {
    match name {
        "v250m/1:30r...7 row" | "v5:00/1:00r...15 row" => {
            Some("Speed Pyramid Row w/ 1.5' Active RI per 250m work")
        }
        "8x500m/3:30r row" | "v5:00/1:00r...17 row" => Some("8x 500m w/ 3.5' Active RI Row"),
        "5x1500m/5:00r row" => Some("5x 1500m w/ 5' RI Row"),
        "4x2000m/5:00r row" | "v5:00/1:00r...9 row" => Some("4x 2000m w/5' Active RI Row"),
        "4x1000m/5:00r row" => Some("4x 1000m /5' RI Row"),
        "v3000m/5:00r...3 row" | "v5:00/1:00r...7 row" => {
            Some("Waterfall of 3k, 2.5k, 2k w/ 5' Active RI Row")
        }
        WARM_UP_ROW => Some("Warm-up Row"),
        _ => None,
    }
}

fn rowing(activity: &Activity, _: &Lookups, _: &GearConfig) -> RuleOutput {
    let mut update = ActivityUpdate::default();
    let description = activity.description();

    let logged_title = description
        .contains(WORKOUT_LOG_SIGNATURE)
        .then(|| description.lines().next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty());

    let title = match logged_title {
        Some(title) => {
            update.description = Some(String::new());
            title.to_string()
        }
        None => match known_row_title(&activity.name) {
            Some(title) => {
                if activity.name == WARM_UP_ROW {
                    update.hide_from_home = Some(true);
                }
                title.to_string()
            }
            None => return (update, None),
        },
    };

    let reason = format!("set title to {:?}", title);
    update.name = Some(title);
    (update, Some(reason))
}

fn walk(activity: &Activity, _: &Lookups, gear: &GearConfig) -> RuleOutput {
    let mut update = ActivityUpdate {
        gear_id: Some(gear.walking_shoes.clone()),
        ..Default::default()
    };

    let early = activity.start_date_local.hour() < WALK_CUTOFF_HOUR;
    if early && activity.elapsed_time >= WALK_MIN_ELAPSED {
        update.name = Some(DOG_WALK_TITLE.to_string());
        update.private = Some(false);
        (update, Some("set dog walking title and made public".to_string()))
    } else {
        update.hide_from_home = Some(true);
        (update, Some("muted walk".to_string()))
    }
}

fn weight_training(activity: &Activity, _: &Lookups, _: &GearConfig) -> RuleOutput {
    if !SHORT_STRENGTH_BAND.contains(&activity.elapsed_time) {
        return (ActivityUpdate::default(), None);
    }

    let update = ActivityUpdate {
        name: Some(SHORT_STRENGTH_TITLE.to_string()),
        hide_from_home: Some(true),
        ..Default::default()
    };
    (update, Some("set humane burpees title".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummitDiscipline;
    use crate::services::aqi::AqiCategory;
    use crate::services::weather::PeriodWeather;
    use chrono::{DateTime, NaiveDate, Utc};

    fn activity(kind: &str) -> Activity {
        let start: DateTime<Utc> = "2024-03-01T07:30:00Z".parse().unwrap();
        Activity {
            id: 1234,
            name: "Morning Activity".to_string(),
            activity_type: kind.to_string(),
            sport_type: None,
            external_id: None,
            trainer: false,
            commute: false,
            private: true,
            hide_from_home: false,
            elapsed_time: 3600,
            start_date: start,
            start_date_local: start,
            start_latlng: None,
            end_latlng: None,
            description: None,
            total_elevation_gain: 0.0,
            gear_id: None,
        }
    }

    fn weather() -> WeatherInfo {
        let sample = PeriodWeather {
            icon: "☀️",
            description: "Clear Sky".to_string(),
            temperature: 19.0,
            feels_like: 16.0,
            humidity: 64.0,
            wind_speed_kmh: 13.0,
            wind_direction: "↓",
            coordinates: Some(Coordinates { lat: 1.0, lon: 2.0 }),
        };
        WeatherInfo {
            start: sample.clone(),
            end: sample,
            aqi: Some(AqiCategory::Good),
        }
    }

    fn event(summary: &str) -> CalendarEvent {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        CalendarEvent::all_day(summary, start, start.succ_opt().unwrap())
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(GearConfig::default())
    }

    #[test]
    fn test_handcycle_is_untouched() {
        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };
        let decision = engine().decide(&activity("Handcycle"), &lookups);
        assert!(decision.update.is_empty());
        assert_eq!(decision.reason, NO_CHANGES);
        assert_eq!(RuleEngine::weather_location(&activity("Handcycle")), None);
    }

    #[test]
    fn test_unmatched_discipline_only_gets_weather() {
        let decision = engine().decide(&activity("Run"), &Lookups::default());
        assert!(decision.update.is_empty());

        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };
        let decision = engine().decide(&activity("Kitesurf"), &lookups);
        assert_eq!(decision.update.name, None);
        assert!(decision.update.description.is_some());
    }

    #[test]
    fn test_strength_band_boundaries() {
        for (elapsed, in_band) in [(179, false), (180, true), (420, true), (421, false)] {
            let mut a = activity("WeightTraining");
            a.elapsed_time = elapsed;
            let decision = engine().decide(&a, &Lookups::default());

            if in_band {
                assert_eq!(decision.update.name.as_deref(), Some(SHORT_STRENGTH_TITLE));
                assert_eq!(decision.update.hide_from_home, Some(true));
            } else {
                assert!(decision.update.is_empty(), "elapsed {}", elapsed);
            }
        }
    }

    #[test]
    fn test_trainer_ride_always_tagged_trainer() {
        let gear = GearConfig::default();
        for latlng in [None, Some(vec![51.5, -0.1])] {
            let mut a = activity("Ride");
            a.external_id = Some("trainerroad-1234.fit".to_string());
            a.start_latlng = latlng;

            let decision = engine().decide(&a, &Lookups::default());
            assert_eq!(decision.update.gear_id.as_deref(), Some(gear.trainer.as_str()));
            assert_eq!(decision.update.trainer, Some(true));
        }
    }

    #[test]
    fn test_trainer_ride_named_from_calendar() {
        let mut a = activity("Ride");
        a.external_id = Some("trainerroad-1234.fit".to_string());
        let lookups = Lookups {
            calendar_event: Some(event("Week 1 Day 2 - Pettit")),
            ..Default::default()
        };

        let decision = engine().decide(&a, &lookups);
        assert_eq!(decision.update.name.as_deref(), Some("TR: Pettit"));
    }

    #[test]
    fn test_outdoor_ride_from_calendar_gets_suffix_and_bike() {
        let a = activity("Ride");
        let lookups = Lookups {
            calendar_event: Some(event("Week 1 Day 2 - Pettit")),
            ..Default::default()
        };

        let decision = engine().decide(&a, &lookups);
        assert_eq!(decision.update.name.as_deref(), Some("TR: Pettit - Outside"));
        assert_eq!(decision.update.gear_id.as_deref(), Some("b10013574"));
        assert_eq!(decision.update.trainer, None);
    }

    #[test]
    fn test_already_named_ride_is_not_renamed() {
        let mut a = activity("Ride");
        a.name = "TR: Pettit - Outside".to_string();
        assert!(!RuleEngine::needs_calendar(&a));

        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(decision.update.name, None);
        assert_eq!(decision.update.gear_id.as_deref(), Some("b10013574"));
    }

    #[test]
    fn test_ride_without_event_keeps_name() {
        let a = activity("Ride");
        assert!(RuleEngine::needs_calendar(&a));
        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(decision.update.name, None);
    }

    #[test]
    fn test_virtual_ride_is_indoor() {
        let mut a = activity("VirtualRide");
        a.start_latlng = Some(vec![51.5, -0.1]);

        assert_eq!(RuleEngine::weather_location(&a), Some(WeatherLocation::Home));
        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(decision.update.trainer, Some(true));
        assert_eq!(decision.update.gear_id.as_deref(), Some("b9880609"));
    }

    #[test]
    fn test_rowing_title_from_workout_log() {
        let mut a = activity("Rowing");
        a.description = Some("10x 1' on / 1' off\nhttps://app.erg.zone/workouts/123".to_string());
        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };

        let decision = engine().decide(&a, &lookups);
        assert_eq!(decision.update.name.as_deref(), Some("10x 1' on / 1' off"));
        let description = decision.update.description.unwrap();
        assert!(description.starts_with("The Pain Cave: "));
        assert!(!description.contains("app.erg.zone"));
    }

    #[test]
    fn test_rowing_log_without_weather_clears_description() {
        let mut a = activity("Rowing");
        a.description = Some("Pyramid\nhttps://app.erg.zone/workouts/123".to_string());

        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(decision.update.description.as_deref(), Some(""));
    }

    #[test]
    fn test_rowing_title_table() {
        let mut a = activity("Rowing");
        a.name = "8x500m/3:30r row".to_string();
        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(
            decision.update.name.as_deref(),
            Some("8x 500m w/ 3.5' Active RI Row")
        );
        assert_eq!(decision.update.hide_from_home, None);
    }

    #[test]
    fn test_warm_up_row_is_hidden() {
        let mut a = activity("Rowing");
        a.name = WARM_UP_ROW.to_string();
        let decision = engine().decide(&a, &Lookups::default());
        assert_eq!(decision.update.name.as_deref(), Some("Warm-up Row"));
        assert_eq!(decision.update.hide_from_home, Some(true));
    }

    #[test]
    fn test_unknown_row_is_untouched() {
        let mut a = activity("Rowing");
        a.name = "Afternoon Row".to_string();
        assert!(engine().decide(&a, &Lookups::default()).update.is_empty());
    }

    #[test]
    fn test_early_long_walk_is_dog_walk() {
        let mut a = activity("Walk");
        a.elapsed_time = WALK_MIN_ELAPSED;
        let decision = engine().decide(&a, &Lookups::default());

        assert_eq!(decision.update.name.as_deref(), Some(DOG_WALK_TITLE));
        assert_eq!(decision.update.private, Some(false));
        assert_eq!(decision.update.gear_id.as_deref(), Some("g10043849"));
        assert_eq!(decision.update.hide_from_home, None);
    }

    #[test]
    fn test_late_or_short_walk_is_muted() {
        let mut late = activity("Walk");
        late.start_date_local = "2024-03-01T09:00:00Z".parse().unwrap();
        let mut short = activity("Walk");
        short.elapsed_time = WALK_MIN_ELAPSED - 1;

        for a in [late, short] {
            let decision = engine().decide(&a, &Lookups::default());
            assert_eq!(decision.update.name, None);
            assert_eq!(decision.update.hide_from_home, Some(true));
            assert_eq!(decision.update.gear_id.as_deref(), Some("g10043849"));
        }
    }

    #[test]
    fn test_weather_appended_after_blank_line() {
        let mut a = activity("Run");
        a.description = Some("Easy miles".to_string());
        a.start_latlng = Some(vec![1.0, 2.0]);
        let lookups = Lookups {
            weather: Some(weather()),
            summit: Some(SummitTotal {
                discipline: SummitDiscipline::Run,
                year: 2024,
                total: 321.0,
            }),
            ..Default::default()
        };

        let decision = engine().decide(&a, &lookups);
        assert_eq!(
            decision.update.description.as_deref(),
            Some("Easy miles\n\n☀️ Clear Sky | 🌡 19-19°C | 👌 16°C | 💦 64-64% | 💨 13km/h ↓ | ⛰ 321m YTD | AQI 💚\n")
        );
        assert_eq!(decision.reason, "added weather");
    }

    #[test]
    fn test_no_gps_uses_home_rendering() {
        let a = activity("Run");
        assert_eq!(RuleEngine::weather_location(&a), Some(WeatherLocation::Home));

        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };
        let decision = engine().decide(&a, &lookups);
        assert!(decision
            .update
            .description
            .unwrap()
            .starts_with("The Pain Cave: ☀️ Clear Sky"));
    }

    #[test]
    fn test_existing_weather_is_not_repeated() {
        let mut a = activity("Run");
        a.description = Some("☀️ Clear Sky | AQI 💚".to_string());
        assert_eq!(RuleEngine::weather_location(&a), None);

        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };
        assert!(engine().decide(&a, &lookups).update.is_empty());
    }

    #[test]
    fn test_reasons_are_joined() {
        let mut a = activity("WeightTraining");
        a.elapsed_time = 300;
        let lookups = Lookups {
            weather: Some(weather()),
            ..Default::default()
        };
        assert_eq!(
            engine().decide(&a, &lookups).reason,
            "set humane burpees title & added weather"
        );
    }
}
