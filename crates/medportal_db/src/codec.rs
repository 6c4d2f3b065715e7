//! Text encoding of timestamps.
//!
//! The `Any` driver cannot decode chrono types, so appointment times are stored
//! as `YYYY-MM-DD HH:MM:SS`. The format sorts lexically in chronological order,
//! which the range queries rely on.

use crate::error::DbError;
use chrono::NaiveDateTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn encode_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(raw: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| DbError::DecodeError(format!("invalid timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn encodes_with_second_precision() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        assert_eq!(encode_timestamp(ts), "2025-01-10 09:30:00");
        assert_eq!(decode_timestamp("2025-01-10 09:30:00").unwrap(), ts);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_timestamp("tomorrow"),
            Err(DbError::DecodeError(_))
        ));
    }
}
