//! Core data types for the harvester.
//!
//! Two families live here: the output model that is serialized into
//! artifacts, and the upstream documents that a validated XML tree is read
//! into. Upstream documents keep the provider's field names.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A radio station from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
}

/// All programs of one broadcast day, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramsInDate {
    /// Provider date encoding (YYYYMMDD), carried through unchanged.
    pub date: Number,
    pub programs: Vec<Program>,
}

/// A single broadcast program.
///
/// Every field is an opaque provider string; none of them is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    /// Broadcast start.
    pub ft: String,
    /// Broadcast end.
    pub to: String,
    pub dur: String,
    pub title: String,
    pub url: String,
    pub info: String,
    pub img: String,
    pub personality: String,
}

/// Upstream station directory (`<stations><station id=".."><name/>..`).
#[derive(Debug, Clone, Deserialize)]
pub struct StationListDocument {
    pub stations: StationList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationList {
    pub station: Vec<StationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationEntry {
    pub id: String,
    pub name: String,
}

/// Upstream weekly schedule (`<radiko><stations><station>..<progs>..`).
#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyScheduleDocument {
    pub radiko: ScheduleRoot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRoot {
    pub stations: ScheduleStations,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleStations {
    pub station: ScheduleStation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleStation {
    pub id: String,
    pub name: String,
    pub progs: Vec<ProgsEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgsEntry {
    pub date: Number,
    pub prog: Vec<ProgEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgEntry {
    pub id: String,
    pub ft: String,
    pub to: String,
    pub dur: String,
    pub title: String,
    pub url: String,
    /// Required upstream, never propagated to [`Program`].
    pub desc: String,
    pub info: String,
    pub pfm: String,
    pub img: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_serializes_compact_in_field_order() {
        let stations = vec![Station {
            id: "TBS".to_string(),
            name: "TBSラジオ".to_string(),
        }];
        let json = serde_json::to_string(&stations).unwrap();
        assert_eq!(json, r#"[{"id":"TBS","name":"TBSラジオ"}]"#);
    }

    #[test]
    fn test_programs_in_date_keeps_date_as_number() {
        let day = ProgramsInDate {
            date: Number::from(20240115u32),
            programs: vec![],
        };
        let json = serde_json::to_string(&day).unwrap();
        assert_eq!(json, r#"{"date":20240115,"programs":[]}"#);
    }

    #[test]
    fn test_program_field_order() {
        let program = Program {
            id: "1".to_string(),
            ft: "20240115050000".to_string(),
            to: "20240115063000".to_string(),
            dur: "5400".to_string(),
            title: "t".to_string(),
            url: "u".to_string(),
            info: "i".to_string(),
            img: "m".to_string(),
            personality: "p".to_string(),
        };
        let json = serde_json::to_string(&program).unwrap();
        assert_eq!(
            json,
            r#"{"id":"1","ft":"20240115050000","to":"20240115063000","dur":"5400","title":"t","url":"u","info":"i","img":"m","personality":"p"}"#
        );
    }
}
