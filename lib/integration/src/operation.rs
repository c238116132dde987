//! The fixed table of provider operations.
//!
//! Each operation knows its endpoint path and how to turn its typed
//! fields into the string parameters that get signed and sent.

use crate::connector::OperationRequest;
use crate::error::ConnectorError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use zadarma_signer::ParameterMap;

/// Endpoint for PBX call statistics.
pub const CALL_STATISTICS_PATH: &str = "/v1/statistics/pbx/";

/// Endpoint for requesting a call recording download link.
pub const RECORDING_LINK_PATH: &str = "/v1/pbx/record/request/";

/// Date-time layout the provider accepts: UTC, whole seconds, no zone suffix.
const PROVIDER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Host-side spellings accepted for wire field names.
const FIELD_ALIASES: &[(&str, &str)] = &[("call_id", "callId")];

/// Renders a timestamp the way the provider expects it.
///
/// Sub-second precision is truncated.
#[must_use]
pub fn format_provider_datetime(value: &DateTime<Utc>) -> String {
    value.format(PROVIDER_DATETIME_FORMAT).to_string()
}

/// How date-times without an explicit offset are interpreted.
///
/// Inputs that carry an offset (RFC 3339) are always converted to UTC
/// exactly; this only decides what a bare `2024-01-01 10:00:00` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NaiveDateTimeConvention {
    /// Treat naive values as UTC.
    #[default]
    Utc,
    /// Treat naive values as local time at a fixed offset east of UTC.
    FixedOffset { seconds_east: i32 },
}

impl NaiveDateTimeConvention {
    /// Parses a caller-supplied date or date-time into UTC.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`,
    /// `YYYY-MM-DDTHH:MM:SS[.fff]` and a bare `YYYY-MM-DD` (midnight).
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the value cannot be parsed
    /// or the configured offset is out of range.
    pub fn parse(&self, input: &str) -> Result<DateTime<Utc>, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("value is empty".to_string());
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
            return Ok(parsed.with_timezone(&Utc));
        }

        let naive = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(input, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| format!("'{input}' is not a recognised date or date-time"))?;

        self.localize(naive)
    }

    fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<Utc>, String> {
        match *self {
            Self::Utc => Ok(naive.and_utc()),
            Self::FixedOffset { seconds_east } => {
                let offset = FixedOffset::east_opt(seconds_east)
                    .ok_or_else(|| format!("UTC offset of {seconds_east}s is out of range"))?;
                offset
                    .from_local_datetime(&naive)
                    .single()
                    .map(|local| local.with_timezone(&Utc))
                    .ok_or_else(|| format!("'{naive}' is ambiguous at offset {offset}"))
            }
        }
    }
}

/// A provider operation with its typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOperation {
    /// PBX call statistics for a time window.
    CallStatistics {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Download link for a call recording.
    RecordingLink { call_id: String },
}

impl ApiOperation {
    /// Wire name of [`ApiOperation::CallStatistics`].
    pub const CALL_STATISTICS: &'static str = "get-call-statistics";
    /// Wire name of [`ApiOperation::RecordingLink`].
    pub const RECORDING_LINK: &'static str = "get-recording-link";

    /// Creates a call statistics operation.
    #[must_use]
    pub const fn call_statistics(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::CallStatistics { start, end }
    }

    /// Creates a recording link operation.
    #[must_use]
    pub fn recording_link(call_id: impl Into<String>) -> Self {
        Self::RecordingLink {
            call_id: call_id.into(),
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CallStatistics { .. } => Self::CALL_STATISTICS,
            Self::RecordingLink { .. } => Self::RECORDING_LINK,
        }
    }

    /// Returns the endpoint path.
    #[must_use]
    pub const fn endpoint_path(&self) -> &'static str {
        match self {
            Self::CallStatistics { .. } => CALL_STATISTICS_PATH,
            Self::RecordingLink { .. } => RECORDING_LINK_PATH,
        }
    }

    /// Builds the request parameters. Every operation asks for JSON.
    #[must_use]
    pub fn parameters(&self) -> ParameterMap {
        let params = ParameterMap::new().with("format", "json");
        match self {
            Self::CallStatistics { start, end } => params
                .with("start", format_provider_datetime(start))
                .with("end", format_provider_datetime(end)),
            Self::RecordingLink { call_id } => params.with("call_id", call_id.as_str()),
        }
    }

    /// Resolves a host request into a typed operation.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::OperationNotSupported`] for unknown names and
    /// [`ConnectorError::InvalidParameters`] for missing or malformed fields.
    pub fn from_request(
        request: &OperationRequest,
        convention: NaiveDateTimeConvention,
    ) -> Result<Self, ConnectorError> {
        let fields = FieldReader::new(request)?;

        match request.name.as_str() {
            Self::CALL_STATISTICS => {
                let start = fields.datetime("start", convention)?;
                let end = fields.datetime("end", convention)?;
                Ok(Self::call_statistics(start, end))
            }
            Self::RECORDING_LINK => Ok(Self::recording_link(fields.identifier("call_id")?)),
            other => Err(ConnectorError::OperationNotSupported {
                operation: other.to_string(),
            }),
        }
    }
}

/// Typed access to the JSON parameters of a request.
struct FieldReader<'a> {
    operation: &'a str,
    fields: &'a serde_json::Map<String, JsonValue>,
}

impl<'a> FieldReader<'a> {
    fn new(request: &'a OperationRequest) -> Result<Self, ConnectorError> {
        let fields = request
            .parameters
            .as_object()
            .ok_or_else(|| ConnectorError::InvalidParameters {
                operation: request.name.clone(),
                reason: "parameters must be a JSON object".to_string(),
            })?;

        Ok(Self {
            operation: &request.name,
            fields,
        })
    }

    fn invalid(&self, reason: String) -> ConnectorError {
        ConnectorError::InvalidParameters {
            operation: self.operation.to_string(),
            reason,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a JsonValue> {
        self.fields.get(name).or_else(|| {
            FIELD_ALIASES
                .iter()
                .find(|(wire, _)| *wire == name)
                .and_then(|(_, alias)| self.fields.get(*alias))
        })
    }

    fn string(&self, name: &str) -> Result<&'a str, ConnectorError> {
        match self.lookup(name) {
            None | Some(JsonValue::Null) => Err(self.invalid(format!("'{name}' is required"))),
            Some(JsonValue::String(value)) => Ok(value.as_str()),
            Some(other) => Err(self.invalid(format!("'{name}' must be a string, got {other}"))),
        }
    }

    fn datetime(
        &self,
        name: &str,
        convention: NaiveDateTimeConvention,
    ) -> Result<DateTime<Utc>, ConnectorError> {
        let raw = self.string(name)?;
        convention
            .parse(raw)
            .map_err(|reason| self.invalid(format!("'{name}': {reason}")))
    }

    /// Identifiers may arrive as JSON numbers; they are signed as text.
    fn identifier(&self, name: &str) -> Result<String, ConnectorError> {
        let value = match self.lookup(name) {
            Some(JsonValue::Number(number)) => number.to_string(),
            _ => self.string(name)?.trim().to_string(),
        };

        if value.is_empty() {
            return Err(self.invalid(format!("'{name}' must not be blank")));
        }
        Ok(value)
    }
}
