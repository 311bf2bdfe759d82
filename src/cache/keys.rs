//! Cache Keys and TTL Policy
//!
//! Keys are derived deterministically from the logical resource so the same
//! resource always lands in the same slot across restarts.

use std::fmt;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

// == Resource Class ==
/// Kind of upstream resource, which fixes how long it stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Match listings with live scores
    Matches,
    /// AI-generated match predictions
    Prediction,
    /// League tables
    Standings,
    /// News feed
    News,
    /// Team and player profiles
    Stats,
    /// Daily combo bet
    Combo,
}

impl ResourceClass {
    /// Time-to-live for this class.
    pub const fn ttl(self) -> Duration {
        let secs = match self {
            ResourceClass::Matches => 2 * MINUTE,
            ResourceClass::Prediction => 24 * HOUR,
            ResourceClass::Standings => 24 * HOUR,
            ResourceClass::News => 4 * HOUR,
            ResourceClass::Stats => 72 * HOUR,
            ResourceClass::Combo => 4 * HOUR,
        };
        Duration::from_secs(secs)
    }
}

// == Cache Key ==
/// A logical cache slot and the TTL class of what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    class: ResourceClass,
}

impl CacheKey {
    fn new(name: String, class: ResourceClass) -> Self {
        Self { name, class }
    }

    pub fn upcoming_matches() -> Self {
        Self::new("upcoming_matches".to_string(), ResourceClass::Matches)
    }

    pub fn standing(league: impl fmt::Display) -> Self {
        Self::new(format!("standing_{}", league), ResourceClass::Standings)
    }

    pub fn prediction(match_id: &str) -> Self {
        Self::new(format!("pred_{}", match_id), ResourceClass::Prediction)
    }

    pub fn team_stats(team_id: &str, league_id: &str) -> Self {
        Self::new(
            format!("team_stats_{}_{}", team_id, league_id),
            ResourceClass::Stats,
        )
    }

    /// Odds move with the match, so they share the listing TTL.
    pub fn odds(match_id: &str) -> Self {
        Self::new(format!("odds_{}", match_id), ResourceClass::Matches)
    }

    pub fn news() -> Self {
        Self::new("football_news".to_string(), ResourceClass::News)
    }

    /// Free-text entity lookup; whitespace runs become `_`, then lowercased.
    pub fn stats(query: &str) -> Self {
        Self::new(
            format!("stats_{}", normalize_query(query)),
            ResourceClass::Stats,
        )
    }

    /// Whole-number odds render without a fractional part (`2.0` → `2`).
    pub fn combo(target_odds: f64) -> Self {
        Self::new(
            format!("daily_combo_odds_{}", target_odds),
            ResourceClass::Combo,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    pub fn ttl(&self) -> Duration {
        self.class.ttl()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Unicode white space and line terminators, plus BOM, minus NEL.
fn is_query_space(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

fn normalize_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut in_space = false;

    for c in query.chars() {
        if is_query_space(c) {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out.to_lowercase()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_table() {
        assert_eq!(ResourceClass::Matches.ttl(), Duration::from_secs(120));
        assert_eq!(ResourceClass::Prediction.ttl(), Duration::from_secs(86_400));
        assert_eq!(ResourceClass::Standings.ttl(), Duration::from_secs(86_400));
        assert_eq!(ResourceClass::News.ttl(), Duration::from_secs(4 * 3600));
        assert_eq!(ResourceClass::Stats.ttl(), Duration::from_secs(72 * 3600));
        assert_eq!(ResourceClass::Combo.ttl(), Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(CacheKey::upcoming_matches().as_str(), "upcoming_matches");
        assert_eq!(CacheKey::standing(39).as_str(), "standing_39");
        assert_eq!(CacheKey::standing("Ligue 1").as_str(), "standing_Ligue 1");
        assert_eq!(CacheKey::prediction("1208").as_str(), "pred_1208");
        assert_eq!(CacheKey::team_stats("85", "61").as_str(), "team_stats_85_61");
        assert_eq!(CacheKey::odds("1208").as_str(), "odds_1208");
        assert_eq!(CacheKey::news().as_str(), "football_news");
        assert_eq!(CacheKey::combo(2.0).as_str(), "daily_combo_odds_2");
        assert_eq!(CacheKey::combo(3.5).as_str(), "daily_combo_odds_3.5");
    }

    #[test]
    fn test_stats_query_normalization() {
        assert_eq!(CacheKey::stats("Kylian  Mbappé").as_str(), "stats_kylian_mbappé");
        assert_eq!(CacheKey::stats(" PSG\tFC ").as_str(), "stats__psg_fc_");
        assert_eq!(CacheKey::stats("Real Madrid"), CacheKey::stats("real madrid"));
        assert_eq!(CacheKey::stats("Lens\u{feff}\u{3000}RC").as_str(), "stats_lens_rc");
        assert_eq!(CacheKey::stats("Lens\u{85}RC").as_str(), "stats_lens\u{85}rc");
    }

    #[test]
    fn test_key_classes() {
        assert_eq!(CacheKey::odds("1").class(), ResourceClass::Matches);
        assert_eq!(CacheKey::team_stats("1", "2").ttl(), ResourceClass::Stats.ttl());
        assert_eq!(CacheKey::prediction("1").to_string(), "pred_1");
    }
}
