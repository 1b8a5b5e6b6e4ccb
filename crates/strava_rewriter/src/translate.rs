//! Russian to English translation of default activity names.
//!
//! Strava names a new activity after the time of day and the sport, in the
//! athlete's language ("Утренний забег"). Only names of exactly that shape are
//! rewritten; anything else is left alone.

use std::collections::HashMap;

/// Lowercase Russian word to lowercase English word. Masculine and feminine
/// forms of the same time of day map to the same word.
const RU_EN_WORDS: &[(&str, &str)] = &[
    // time of day
    ("утренний", "morning"),
    ("утренняя", "morning"),
    ("полуденный", "lunch"),
    ("полуденная", "lunch"),
    ("дневной", "afternoon"),
    ("дневная", "afternoon"),
    ("вечерний", "evening"),
    ("вечерняя", "evening"),
    ("ночной", "night"),
    ("ночная", "night"),
    // sport
    ("забег", "run"),
    ("заезд", "ride"),
    ("велозаезд", "ride"),
    ("заплыв", "swim"),
    ("ходьба", "walk"),
    ("тренировка", "workout"),
];

#[derive(Clone, Debug)]
pub struct Translator {
    words: HashMap<&'static str, &'static str>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    pub fn new() -> Self {
        Self {
            words: RU_EN_WORDS.iter().copied().collect(),
        }
    }

    /// Translate a "time of day + sport" activity name.
    ///
    /// Returns `name` unchanged unless it is exactly two known words separated
    /// by a single space; the translation is rendered in Title Case.
    pub fn activity_name(&self, name: &str) -> String {
        let lowered = name.trim().to_lowercase();

        let Some((time_of_day, sport_type)) = lowered.split_once(' ') else {
            return name.to_string();
        };
        if time_of_day.is_empty() || sport_type.is_empty() {
            return name.to_string();
        }

        let (Some(tr_time_of_day), Some(tr_sport_type)) =
            (self.words.get(time_of_day), self.words.get(sport_type))
        else {
            return name.to_string();
        };

        format!("{} {}", title(tr_time_of_day), title(tr_sport_type))
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}
