use serde::{Deserialize, Deserializer};

use crate::error::RelayError;

/// One inbound TradingView alert, as deserialized from the webhook body.
/// TradingView templates are inconsistent about field names, so the
/// aliases below accept both spellings (first present wins).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Alert {
    #[serde(default, alias = "ticker")]
    pub symbol: Option<String>,

    #[serde(default)]
    pub timeframe: Option<String>,

    /// Strategy label, `version` in older alert templates.
    #[serde(default, alias = "version")]
    pub strategy: Option<String>,

    /// Alert price. TradingView sends this as either a JSON number or a
    /// quoted string depending on the template.
    #[serde(default, deserialize_with = "de_price")]
    pub price: Option<f64>,

    /// The raw signal word, `signal` in older alert templates.
    #[serde(default, alias = "signal")]
    pub alert: Option<String>,

    /// Legacy fixed-quantity override; bypasses risk sizing when set.
    #[serde(default)]
    pub qty: Option<i64>,

    /// Caller-supplied idempotency token. Optional; see the engine for
    /// the timestamp fallback used when absent.
    #[serde(default)]
    pub signal_id: Option<String>,
}

impl Alert {
    /// The validated instrument symbol. Missing or empty fails the request.
    pub fn ticker(&self) -> Result<&str, RelayError> {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(RelayError::MissingField("ticker"))
    }

    /// The canonical action for this alert. Missing or unrecognized signal
    /// words fail the request; they are never silently ignored.
    pub fn action(&self) -> Result<CanonicalAction, RelayError> {
        let raw = self
            .alert
            .as_deref()
            .ok_or(RelayError::MissingField("alert"))?;
        match normalize(raw) {
            CanonicalAction::Unknown => Err(RelayError::UnknownSignal(raw.to_string())),
            action => Ok(action),
        }
    }
}

fn de_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Num(f64),
        Str(String),
    }

    match Option::<RawPrice>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPrice::Num(n)) => Ok(Some(n)),
        Some(RawPrice::Str(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid price: {s:?}")))
        }
    }
}

/// The five recognized signal kinds, plus Unknown for everything else.
/// Derived once per request and immutable; all downstream branching keys
/// off this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanonicalAction {
    LongEntry,
    ShortEntry,
    ExitLong,
    ExitShort,
    Exit,
    Unknown,
}

impl CanonicalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalAction::LongEntry => "long_entry",
            CanonicalAction::ShortEntry => "short_entry",
            CanonicalAction::ExitLong => "exit_long",
            CanonicalAction::ExitShort => "exit_short",
            CanonicalAction::Exit => "exit",
            CanonicalAction::Unknown => "unknown",
        }
    }

    /// Space- and separator-free form used inside client_order_id.
    pub fn key_token(&self) -> &'static str {
        match self {
            CanonicalAction::LongEntry => "longentry",
            CanonicalAction::ShortEntry => "shortentry",
            CanonicalAction::ExitLong => "exitlong",
            CanonicalAction::ExitShort => "exitshort",
            CanonicalAction::Exit => "exit",
            CanonicalAction::Unknown => "unknown",
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, CanonicalAction::LongEntry | CanonicalAction::ShortEntry)
    }
}

/// Map a free-form signal word to its canonical action.
///
/// Lowercase, trim, underscores to spaces, then exact membership in the
/// synonym table. No partial or fuzzy matching.
pub fn normalize(raw: &str) -> CanonicalAction {
    let cleaned = raw.to_lowercase().replace('_', " ");
    let cleaned = cleaned.trim();

    match cleaned {
        "long" | "long entry" | "entry long" | "buy" => CanonicalAction::LongEntry,
        "short" | "short entry" | "entry short" | "sell" => CanonicalAction::ShortEntry,
        "exit long" | "close long" => CanonicalAction::ExitLong,
        "exit short" | "close short" => CanonicalAction::ExitShort,
        "exit" | "close" => CanonicalAction::Exit,
        _ => CanonicalAction::Unknown,
    }
}
