//! Mouse recording data model.
//!
//! Recordings are JSON arrays of raw button transitions; replay wants
//! paired click events. The OS-level capture and injection hooks are
//! collaborator seams ([`MouseRecorder`], [`MousePlayer`]); the
//! transformations between the two shapes live here and are pure.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One raw button transition as captured by an input hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub x: f64,
    pub y: f64,
    /// Button name as reported by the hook, e.g. `"Button.left"`.
    pub button: String,
    /// True on press, false on release.
    pub pressed: bool,
    /// Seconds since the epoch at capture time.
    pub time: f64,
}

/// One complete click: a press location, a release location and the timing
/// between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Seconds the button was held.
    pub duration: f64,
    pub pressed_time: f64,
    pub depressed_time: f64,
}

impl ClickEvent {
    pub fn from_button_pair(pressed: &ButtonEvent, released: &ButtonEvent) -> Self {
        Self {
            x0: pressed.x,
            y0: pressed.y,
            x1: released.x,
            y1: released.y,
            duration: released.time - pressed.time,
            pressed_time: pressed.time,
            depressed_time: released.time,
        }
    }
}

/// Wire form of a recording entry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MouseEvent {
    Button(ButtonEvent),
    Click(ClickEvent),
}

/// Collapse raw button transitions into click events.
///
/// Events are ordered by capture time first; each press is paired with the
/// next release. A press with no following release is dropped, as is a
/// release with no preceding press.
pub fn to_click_events(events: &[ButtonEvent]) -> Vec<ClickEvent> {
    let mut ordered: Vec<&ButtonEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut result = Vec::new();
    let mut pressed: Option<&ButtonEvent> = None;
    for event in ordered {
        match (pressed, event.pressed) {
            (None, true) => pressed = Some(event),
            (Some(down), false) => {
                result.push(ClickEvent::from_button_pair(down, event));
                pressed = None;
            }
            _ => {}
        }
    }
    result
}

/// Inter-event pauses for replaying `events` at `speed` (1.0 is real time,
/// 2.0 half speed). The first entry is always zero; entry `i` is the
/// recorded gap between click `i-1` starting and click `i` finishing.
pub fn playback_delays(events: &[ClickEvent], speed: f64) -> Vec<std::time::Duration> {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            if i == 0 {
                return std::time::Duration::ZERO;
            }
            let gap = (event.depressed_time - events[i - 1].pressed_time) / speed;
            if gap > 0.0 {
                std::time::Duration::from_secs_f64(gap)
            } else {
                std::time::Duration::ZERO
            }
        })
        .collect()
}

/// Read a recording file, accepting either raw or post-processed arrays
/// and normalizing to click events.
pub fn load_click_events(path: &Path) -> Result<Vec<ClickEvent>> {
    let raw = std::fs::read_to_string(path)?;
    let events: Vec<MouseEvent> = serde_json::from_str(&raw)?;

    let mut buttons = Vec::new();
    let mut clicks = Vec::new();
    for event in events {
        match event {
            MouseEvent::Button(b) => buttons.push(b),
            MouseEvent::Click(c) => clicks.push(c),
        }
    }
    match (buttons.is_empty(), clicks.is_empty()) {
        (false, true) => Ok(to_click_events(&buttons)),
        (true, false) => Ok(clicks),
        (true, true) => Ok(Vec::new()),
        (false, false) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: mixed button and click events", path.display()),
        )
        .into()),
    }
}

/// Write a recording file.
pub fn write_events(path: &Path, events: &[MouseEvent]) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(events)?)?;
    Ok(())
}

/// OS input-hook seam: captures raw button events until stopped.
pub trait MouseRecorder {
    fn record(&mut self) -> Result<Vec<ButtonEvent>>;
}

/// OS input-injection seam: replays click events at the given speed.
pub trait MousePlayer {
    fn play(&mut self, events: &[ClickEvent], speed: f64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(pressed: bool, time: f64, x: f64, y: f64) -> ButtonEvent {
        ButtonEvent {
            x,
            y,
            button: "Button.left".to_string(),
            pressed,
            time,
        }
    }

    #[test]
    fn button_event_wire_format() {
        let event = MouseEvent::Button(button(true, 10.5, 3.0, 4.0));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "button",
                "x": 3.0,
                "y": 4.0,
                "button": "Button.left",
                "pressed": true,
                "time": 10.5,
            })
        );
        let back: MouseEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn click_event_wire_format_round_trips() {
        let event = MouseEvent::Click(ClickEvent {
            x0: 1.0,
            y0: 2.0,
            x1: 3.0,
            y1: 4.0,
            duration: 0.25,
            pressed_time: 10.0,
            depressed_time: 10.25,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"click\""));
        let back: MouseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn presses_pair_with_the_next_release() {
        let events = vec![
            button(true, 1.0, 10.0, 10.0),
            button(false, 1.2, 11.0, 11.0),
            button(true, 2.0, 20.0, 20.0),
            button(false, 2.5, 21.0, 21.0),
        ];

        let clicks = to_click_events(&events);
        assert_eq!(clicks.len(), 2);
        assert_eq!((clicks[0].x0, clicks[0].x1), (10.0, 11.0));
        assert!((clicks[0].duration - 0.2).abs() < 1e-9);
        assert_eq!(clicks[1].pressed_time, 2.0);
        assert_eq!(clicks[1].depressed_time, 2.5);
    }

    #[test]
    fn unpaired_events_are_dropped() {
        // Leading release, trailing press: neither forms a click.
        let events = vec![
            button(false, 0.5, 0.0, 0.0),
            button(true, 1.0, 1.0, 1.0),
            button(false, 1.1, 1.0, 1.0),
            button(true, 9.0, 2.0, 2.0),
        ];
        assert_eq!(to_click_events(&events).len(), 1);
    }

    #[test]
    fn pairing_orders_by_time_first() {
        let events = vec![
            button(false, 1.2, 11.0, 11.0),
            button(true, 1.0, 10.0, 10.0),
        ];
        let clicks = to_click_events(&events);
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].x0, 10.0);
    }

    #[test]
    fn delays_scale_with_speed() {
        let clicks = vec![
            ClickEvent {
                x0: 0.0,
                y0: 0.0,
                x1: 0.0,
                y1: 0.0,
                duration: 0.1,
                pressed_time: 1.0,
                depressed_time: 1.1,
            },
            ClickEvent {
                x0: 0.0,
                y0: 0.0,
                x1: 0.0,
                y1: 0.0,
                duration: 0.1,
                pressed_time: 2.9,
                depressed_time: 3.0,
            },
        ];

        let delays = playback_delays(&clicks, 2.0);
        assert_eq!(delays[0], std::time::Duration::ZERO);
        assert!((delays[1].as_secs_f64() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recording_files_round_trip_and_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mouse_clicks.json");

        let raw = vec![
            MouseEvent::Button(button(true, 1.0, 5.0, 5.0)),
            MouseEvent::Button(button(false, 1.3, 6.0, 6.0)),
        ];
        write_events(&path, &raw).unwrap();

        let clicks = load_click_events(&path).unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!((clicks[0].x0, clicks[0].x1), (5.0, 6.0));
    }
}
