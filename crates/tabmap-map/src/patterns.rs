//! Domain header patterns for GPS and performance exports.
//!
//! Two tables live here: the ordered regex cascade used by the pattern tier
//! of the suggestion engine, and the alias dictionary used by eager
//! auto-matching. Rule order matters; the first rule whose regex matches and
//! whose target is still free wins.

use std::sync::LazyLock;

use regex::Regex;

/// One entry of the pattern cascade.
#[derive(Debug)]
pub struct PatternRule {
    /// Short identifier used in logs.
    pub name: &'static str,
    pub regex: Regex,
    /// Catalog field key or synthetic `custom.<slug>` key.
    pub target: &'static str,
    /// Fixed confidence, 90-95.
    pub confidence: u8,
    pub rationale: &'static str,
}

impl PatternRule {
    fn new(
        name: &'static str,
        pattern: &str,
        target: &'static str,
        confidence: u8,
        rationale: &'static str,
    ) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid header pattern regex"),
            target,
            confidence,
            rationale,
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        self.regex.is_match(header.trim())
    }
}

/// Ordered pattern cascade. Specific rules precede the general ones they
/// would otherwise be shadowed by (sprint distance before total distance).
pub static PATTERN_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        PatternRule::new(
            "player",
            r"(?i)^((giocatore|atleta|player|athlete|nome|name)([\s_-]*(name|nome|id|completo))?|(full|first|last|user)[\s_-]*name|surname|cognome[\s_-]*nome|nome[\s_-]*cognome|(shirt|jersey)[\s_-]*(number|num|no)|numero[\s_-]*maglia|participant)$",
            "playerId",
            95,
            "Reference to the player",
        ),
        PatternRule::new(
            "session_date",
            r"(?i)^((session|training|match|workout|activity|exercise)[\s_-]*date|data([\s_-]*(allenamento|sessione|partita))?|date|giorno|timestamp|recorded[\s_-]*on)$",
            "session_date",
            95,
            "Reference to the session date",
        ),
        PatternRule::new(
            "session_type",
            r"(?i)^((session|training|activity)[\s_-]*type|tipo[\s_-]*sessione)$",
            "session_type",
            90,
            "Reference to the session type",
        ),
        PatternRule::new(
            "rpe",
            r"(?i)(^|[^a-z])(rpe|borg)([^a-z]|$)|perceived[\s_-]*exertion",
            "custom.rpe",
            90,
            "Reference to perceived exertion (custom field)",
        ),
        PatternRule::new(
            "sprint_distance",
            r"(?i)sprint[\s_-]*(dist|distance|distanza)|(dist|distance|distanza)[\s_-]*sprint|high[\s_-]*speed[\s_-]*(running|distance)|^hsr$",
            "sprint_distance_m",
            92,
            "Reference to sprint distance",
        ),
        PatternRule::new(
            "equivalent_distance",
            r"(?i)(equivalent|equiv|equivalente)[\s_-]*(dist|distance|distanza)|(dist|distance|distanza)[\s_-]*(equivalent|equivalente)",
            "equivalent_distance_m",
            92,
            "Reference to equivalent distance",
        ),
        PatternRule::new(
            "distance_per_minute",
            r"(?i)(dist|distance|distanza|^m)[\s_-]*(/|per)[\s_-]*(min|minute|minuto)",
            "distance_per_min",
            92,
            "Reference to distance per minute",
        ),
        PatternRule::new(
            "metabolic_power",
            r"(?i)metabolic[\s_-]*power|potenza[\s_-]*metabolica|^met[\s_-]*power",
            "avg_metabolic_power_wkg",
            92,
            "Reference to metabolic power",
        ),
        PatternRule::new(
            "accelerations",
            r"(?i)accel|accelerazion|acc[\s_-]*(dist|distance)",
            "distance_acc_over_2_ms2_m",
            90,
            "Reference to accelerations",
        ),
        PatternRule::new(
            "decelerations",
            r"(?i)decel|decelerazion|dec[\s_-]*(dist|distance)",
            "distance_dec_over_minus2_ms2_m",
            90,
            "Reference to decelerations",
        ),
        PatternRule::new(
            "top_speed",
            r"(?i)(max|maximum|top|peak)[\s_-]*(speed|velocity|vel)|(speed|velocity|vel)[\s_-]*(max|top|peak)|velocit[aà][\s_-]*(massima|max|picco)|^v\.?max$|^fastest$",
            "top_speed_kmh",
            93,
            "Reference to top speed",
        ),
        PatternRule::new(
            "avg_speed",
            r"(?i)(avg|average|mean)[\s_-]*(speed|velocity|vel)|(speed|velocity|vel)[\s_-]*(avg|average|mean)|velocit[aà][\s_-]*media|^v\.?avg$",
            "avg_speed_kmh",
            93,
            "Reference to average speed",
        ),
        PatternRule::new(
            "max_heart_rate",
            r"(?i)(max|maximum|peak)[\s_-]*(hr|heart[\s_-]*rate)|(hr|heart[\s_-]*rate)[\s_-]*(max|peak)|frequenza[\s_-]*(cardiaca[\s_-]*)?(massima|max)",
            "max_heart_rate",
            93,
            "Reference to maximum heart rate",
        ),
        PatternRule::new(
            "avg_heart_rate",
            r"(?i)(avg|average|mean)[\s_-]*(hr|heart[\s_-]*rate)|(hr|heart[\s_-]*rate)[\s_-]*(avg|average|mean)|frequenza[\s_-]*(cardiaca[\s_-]*)?media|^(hr|bpm|fc|pulse[\s_-]*rate|heart[\s_-]*rate)([\s_-]*\(?bpm\)?)?$",
            "avg_heart_rate",
            92,
            "Reference to average heart rate",
        ),
        PatternRule::new(
            "total_distance",
            r"(?i)(^|[^a-z])(dist|distance|distanza)([^a-z]|$)|^(total|covered|running)[\s_-]*dist|^(kilometers|kilometres|meters|metres|km|percorso)$",
            "total_distance_m",
            90,
            "Reference to total distance",
        ),
        PatternRule::new(
            "duration",
            r"(?i)^(duration|durata|minutes|minuti|mins?|ore|hours|tempo([\s_-]*(totale|allenamento))?|(session|training|playing|elapsed|total|active)[\s_-]*time|workout[\s_-]*duration)$",
            "duration_minutes",
            90,
            "Reference to session duration",
        ),
        PatternRule::new(
            "training_load",
            r"(?i)training[\s_-]*load|^(trimp|tl)$",
            "training_load",
            90,
            "Reference to training load",
        ),
        PatternRule::new(
            "player_load",
            r"(?i)player[\s_-]*load|^(load|carico)$",
            "player_load",
            90,
            "Reference to player load",
        ),
        PatternRule::new(
            "high_intensity_runs",
            r"(?i)high[\s_-]*intensity[\s_-]*(runs|efforts)|^(hir|hi[\s_-]*runs)$|corse[\s_-]*alta[\s_-]*intensit",
            "high_intensity_runs",
            90,
            "Reference to high intensity runs",
        ),
        PatternRule::new(
            "rvp_index",
            r"(?i)(^|[^a-z])rvp([^a-z]|$)",
            "rvp_index",
            92,
            "Reference to the RVP index",
        ),
        PatternRule::new(
            "session_day",
            r"(?i)^(day|weekday|day[\s_-]*of[\s_-]*week|session[\s_-]*day|giorno[\s_-]*settimana)$",
            "session_day",
            90,
            "Reference to the day of the week",
        ),
        PatternRule::new(
            "drill_name",
            r"(?i)^(drill|exercise|esercizio)([\s_-]*name)?$",
            "drill_name",
            90,
            "Reference to the drill name",
        ),
        PatternRule::new(
            "source_device",
            r"(?i)^(device|tracker|vendor|source)([\s_-]*(name|id))?$",
            "source_device",
            90,
            "Reference to the source device",
        ),
        PatternRule::new(
            "notes",
            r"(?i)^(notes?|comments?|remarks?)$",
            "notes",
            90,
            "Reference to notes",
        ),
    ]
});

/// Normalized header to field key, used by eager auto-matching.
const ALIASES: &[(&str, &str)] = &[
    ("player", "playerId"),
    ("playerid", "playerId"),
    ("date", "session_date"),
    ("sessiondate", "session_date"),
    ("duration", "duration_minutes"),
    ("durationminutes", "duration_minutes"),
    ("distance", "total_distance_m"),
    ("totaldistance", "total_distance_m"),
    ("sprint", "sprint_distance_m"),
    ("sprintdistance", "sprint_distance_m"),
    ("speed", "avg_speed_kmh"),
    ("avgspeed", "avg_speed_kmh"),
    ("topspeed", "top_speed_kmh"),
    ("heartrate", "avg_heart_rate"),
    ("avgheartrate", "avg_heart_rate"),
    ("maxheartrate", "max_heart_rate"),
    ("load", "player_load"),
    ("playerload", "player_load"),
    ("runs", "high_intensity_runs"),
    ("highintensityruns", "high_intensity_runs"),
];

/// Confidence recorded for alias-dictionary auto-matches.
pub const ALIAS_CONFIDENCE: u8 = 80;

/// Look up the alias dictionary with an already normalized header.
pub fn alias_target(normalized: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| *field)
}

/// Metric families used to offer alternatives: a header and a field that
/// both contain the keyword are considered related.
pub const ALTERNATIVE_FAMILIES: &[(&str, &str)] = &[
    ("distance", "Similar distance field"),
    ("speed", "Similar speed field"),
    ("heart", "Similar heart rate field"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(header: &str) -> Option<&'static str> {
        PATTERN_RULES
            .iter()
            .find(|rule| rule.matches(header))
            .map(|rule| rule.target)
    }

    #[test]
    fn confidences_stay_in_pattern_band() {
        for rule in PATTERN_RULES.iter() {
            assert!(
                (90..=95).contains(&rule.confidence),
                "{} has {}",
                rule.name,
                rule.confidence
            );
        }
    }

    #[test]
    fn vendor_headers_hit_expected_rules() {
        assert_eq!(first_match("Player Name"), Some("playerId"));
        assert_eq!(first_match("Match Date"), Some("session_date"));
        assert_eq!(first_match("Minutes"), Some("duration_minutes"));
        assert_eq!(first_match("Dist_Total"), Some("total_distance_m"));
        assert_eq!(first_match("Total Distance (m)"), Some("total_distance_m"));
        assert_eq!(first_match("Sprint Distance"), Some("sprint_distance_m"));
        assert_eq!(first_match("Max Speed"), Some("top_speed_kmh"));
        assert_eq!(first_match("HR Avg"), Some("avg_heart_rate"));
        assert_eq!(first_match("Max HR"), Some("max_heart_rate"));
        assert_eq!(first_match("Accelerations"), Some("distance_acc_over_2_ms2_m"));
        assert_eq!(first_match("RPE"), Some("custom.rpe"));
        assert_eq!(first_match("Player Load"), Some("player_load"));
    }

    #[test]
    fn unrelated_headers_do_not_match() {
        assert_eq!(first_match("Jersey Colour"), None);
        assert_eq!(first_match("Weather"), None);
        assert_eq!(first_match("Distinct"), None);
    }

    #[test]
    fn alias_lookup_uses_normalized_keys() {
        assert_eq!(alias_target("player"), Some("playerId"));
        assert_eq!(alias_target("topspeed"), Some("top_speed_kmh"));
        assert_eq!(alias_target("Player"), None);
    }
}
