use serde::{Deserialize, Serialize};

/// A 7-valued weekday enum with an attached localization table, used only at
/// display boundaries (Design Notes §9: "model them as a 7-valued enum...
/// Persist as the enum's integer ordinal").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Ordinal used for persistence and for indexing the default lookup
    /// tables in [`crate::config`]. `Monday = 0 .. Sunday = 6`.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal % 7).copied()
    }

    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        Self::from_ordinal(weekday.num_days_from_monday() as usize).expect("modulo 7 is always in range")
    }

    /// Display-boundary localization table; never used for comparisons or
    /// persistence, only for human-facing rendering (CLI, trace messages).
    pub fn display_name_pt(self) -> &'static str {
        match self {
            Weekday::Monday => "SEGUNDA-FEIRA",
            Weekday::Tuesday => "TERÇA-FEIRA",
            Weekday::Wednesday => "QUARTA-FEIRA",
            Weekday::Thursday => "QUINTA-FEIRA",
            Weekday::Friday => "SEXTA-FEIRA",
            Weekday::Saturday => "SÁBADO",
            Weekday::Sunday => "DOMINGO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_round_trips() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_ordinal(day.ordinal()), Some(day));
        }
    }

    #[test]
    fn chrono_conversion_matches_monday_start() {
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Mon), Weekday::Monday);
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Sun), Weekday::Sunday);
    }
}
