//! Text mining for QLC+ capability labels.
//!
//! QLC+ capability labels are free text; many carry machine-usable speed
//! and direction information ("Rotation slow to fast CCW", "Strobe
//! 1Hz-10Hz"). The miners here are pure: they take the label, return the
//! extracted values and the label with the matched substrings removed,
//! and never touch the model.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{EntityRange, EntityValue};

/// Rotation direction mined from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Result of mining a label for speed information.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedSpeed {
    pub speed: EntityRange,
    pub direction: Option<RotationDirection>,
    /// The label with the matched substrings removed, `None` when
    /// nothing else remains.
    pub remaining: Option<String>,
}

// A speed endpoint is "slow", "fast" or a frequency like "2.5Hz".
static SPEED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(slow|fast|\d+(?:\.\d+)?\s*hz)\s*(?:-|to|\.\.\.?|>)\s*(slow|fast|\d+(?:\.\d+)?\s*hz)\b",
    )
    .unwrap()
});

static DIRECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(counter[\s-]?clockwise|anti[\s-]?clockwise|ccw|clockwise|cw)\b").unwrap()
});

/// Mine a capability label for a speed pair and an optional rotation
/// direction. Returns `None` when the label carries no speed pair.
pub fn mine_speed(label: &str) -> Option<MinedSpeed> {
    let captures = SPEED_PAIR.captures(label)?;
    let pair_match = captures.get(0)?;

    let start = speed_endpoint(captures.get(1)?.as_str())?;
    let end = speed_endpoint(captures.get(2)?.as_str())?;

    let mut stripped = String::new();
    stripped.push_str(&label[..pair_match.start()]);
    stripped.push_str(&label[pair_match.end()..]);

    let found = DIRECTION
        .find(&stripped)
        .map(|m| (m.range(), m.as_str().to_lowercase()));
    let direction = found.map(|(range, token)| {
        stripped.replace_range(range, "");
        if token == "cw" || token == "clockwise" {
            RotationDirection::Clockwise
        } else {
            RotationDirection::CounterClockwise
        }
    });

    let remaining = normalize_whitespace(&stripped);

    Some(MinedSpeed {
        speed: (start, end),
        direction,
        remaining: (!remaining.is_empty()).then_some(remaining),
    })
}

/// Mine a label for a rotation direction alone.
pub fn mine_direction(label: &str) -> Option<RotationDirection> {
    let token = DIRECTION.find(label)?.as_str().to_lowercase();
    if token == "cw" || token == "clockwise" {
        Some(RotationDirection::Clockwise)
    } else {
        Some(RotationDirection::CounterClockwise)
    }
}

/// Attach a direction to a mined speed endpoint: keywords gain a
/// ` CW`/` CCW` suffix, frequencies are negated for counter-clockwise.
pub fn apply_direction(value: EntityValue, direction: RotationDirection) -> EntityValue {
    match (value, direction) {
        (EntityValue::Keyword(keyword), RotationDirection::Clockwise) => {
            EntityValue::keyword(format!("{keyword} CW"))
        }
        (EntityValue::Keyword(keyword), RotationDirection::CounterClockwise) => {
            EntityValue::keyword(format!("{keyword} CCW"))
        }
        (value @ EntityValue::Number { .. }, RotationDirection::Clockwise) => value,
        (EntityValue::Number { value: number, unit }, RotationDirection::CounterClockwise) => {
            EntityValue::number(-number, unit)
        }
    }
}

fn speed_endpoint(token: &str) -> Option<EntityValue> {
    let lowered = token.to_lowercase();
    match lowered.as_str() {
        "slow" => Some(EntityValue::keyword("slow")),
        "fast" => Some(EntityValue::keyword("fast")),
        _ => {
            let number = lowered.strip_suffix("hz")?.trim();
            number.parse().ok().map(EntityValue::hertz)
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
