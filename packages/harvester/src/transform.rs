//! Map validated upstream documents into the artifact model.
//!
//! These functions cannot fail: every shape question was settled by
//! [`crate::schema`].

use crate::types::{
    ProgEntry, Program, ProgramsInDate, Station, StationListDocument, WeeklyScheduleDocument,
};

/// Select `id` and `name` of every directory entry, in source order.
pub fn to_stations(doc: StationListDocument) -> Vec<Station> {
    doc.stations
        .station
        .into_iter()
        .map(|entry| Station {
            id: entry.id,
            name: entry.name,
        })
        .collect()
}

/// One `ProgramsInDate` per upstream `progs` entry, order untouched.
pub fn to_schedule(doc: WeeklyScheduleDocument) -> Vec<ProgramsInDate> {
    doc.radiko
        .stations
        .station
        .progs
        .into_iter()
        .map(|day| ProgramsInDate {
            date: day.date,
            programs: day.prog.into_iter().map(to_program).collect(),
        })
        .collect()
}

fn to_program(entry: ProgEntry) -> Program {
    Program {
        id: entry.id,
        ft: entry.ft,
        to: entry.to,
        dur: entry.dur,
        title: entry.title,
        url: entry.url,
        info: entry.info,
        img: entry.img,
        personality: entry.pfm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate_station_directory, validate_weekly_schedule, ArrayShape};
    use crate::xml::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_stations_preserves_order() {
        let xml = r#"<stations area_id="JP13" area_name="TOKYO JAPAN">
            <station><id>TBS</id><name>TBSラジオ</name></station>
            <station><id>QRR</id><name>文化放送</name></station>
            <station><id>JORF</id><name>ラジオ日本</name></station>
        </stations>"#;
        let doc = validate_station_directory(&decode(xml).unwrap(), ArrayShape::Strict).unwrap();
        let stations = to_stations(doc);
        assert_eq!(
            stations,
            vec![
                Station { id: "TBS".into(), name: "TBSラジオ".into() },
                Station { id: "QRR".into(), name: "文化放送".into() },
                Station { id: "JORF".into(), name: "ラジオ日本".into() },
            ]
        );
    }

    #[test]
    fn test_to_schedule_renames_pfm_and_drops_desc() {
        let xml = r#"<radiko><stations><station id="TBS"><name>TBSラジオ</name>
            <progs><date>20240115</date>
              <prog id="100" ft="20240115050000" to="20240115063000" dur="5400">
                <title>朝</title><url>https://example.jp/a</url>
                <desc>secret description</desc><info>info a</info>
                <pfm>出演者A</pfm><img>https://example.jp/a.jpg</img>
              </prog>
              <prog id="101" ft="20240115063000" to="20240115083000" dur="7200">
                <title>昼</title><url/><desc/><info/><pfm/><img/>
              </prog>
            </progs>
            <progs><date>20240114</date>
              <prog id="99" ft="20240114050000" to="20240114060000" dur="3600">
                <title>前日</title><url/><desc/><info/><pfm>出演者B</pfm><img/>
              </prog>
              <prog id="98" ft="20240114060000" to="20240114070000" dur="3600">
                <title>前日2</title><url/><desc/><info/><pfm/><img/>
              </prog>
            </progs>
        </station></stations></radiko>"#;

        let doc = validate_weekly_schedule(&decode(xml).unwrap(), ArrayShape::Strict).unwrap();
        let schedule = to_schedule(doc);

        // Upstream order is kept even when dates are not ascending
        let dates: Vec<u64> = schedule.iter().map(|d| d.date.as_u64().unwrap()).collect();
        assert_eq!(dates, vec![20240115, 20240114]);

        assert_eq!(schedule[0].programs.len(), 2);
        assert_eq!(schedule[0].programs[0].personality, "出演者A");
        assert_eq!(schedule[0].programs[0].dur, "5400");
        assert_eq!(schedule[0].programs[1].url, "");
        assert_eq!(schedule[1].programs.len(), 2);
        assert_eq!(schedule[1].programs[0].personality, "出演者B");

        let json = serde_json::to_string(&schedule).unwrap();
        assert!(!json.contains("desc"));
        assert!(!json.contains("secret description"));
        assert!(!json.contains("pfm"));
    }
}
