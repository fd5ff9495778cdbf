//! XMLTV export of stored programs
//!
//! Reference: https://github.com/XMLTV/xmltv/blob/master/xmltv.dtd

use quick_xml::events::BytesText;
use quick_xml::Writer;
use std::io::Write;

use super::program::ProgramRecord;
use crate::error::Result;

const XMLTV_TIME: &str = "%Y%m%d%H%M%S %z";

/// Write `programs` as an XMLTV document
pub fn write_xmltv<W: Write>(out: W, generator: &str, programs: &[ProgramRecord]) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer
        .get_mut()
        .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE tv SYSTEM \"xmltv.dtd\">\n")?;

    writer
        .create_element("tv")
        .with_attribute(("generator-info-name", generator))
        .write_inner_content(|w| {
            for id in channel_ids(programs) {
                w.create_element("channel")
                    .with_attribute(("id", id))
                    .write_inner_content(|w| {
                        w.create_element("display-name")
                            .write_text_content(BytesText::new(id))?;
                        Ok(())
                    })?;
            }
            for program in programs {
                write_programme(w, program)?;
            }
            Ok(())
        })?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

/// Distinct channel IDs in first-seen order
fn channel_ids(programs: &[ProgramRecord]) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for p in programs {
        if !ids.contains(&p.channel.as_str()) {
            ids.push(&p.channel);
        }
    }
    ids
}

fn write_programme<W: Write>(w: &mut Writer<W>, p: &ProgramRecord) -> std::io::Result<()> {
    let start = p.start.format(XMLTV_TIME).to_string();
    let stop = p.stop.format(XMLTV_TIME).to_string();

    w.create_element("programme")
        .with_attribute(("start", start.as_str()))
        .with_attribute(("stop", stop.as_str()))
        .with_attribute(("channel", p.channel.as_str()))
        .write_inner_content(|w| {
            text_element(w, "title", &p.title)?;
            if let Some(sub) = &p.subtitle {
                text_element(w, "sub-title", sub)?;
            }
            text_element(w, "desc", &p.description)?;
            if let Some(date) = &p.air_date {
                text_element(w, "date", date)?;
            }
            for genre in p.genres.iter().flatten() {
                text_element(w, "category", genre)?;
            }
            text_element(w, "length", &p.length_minutes.to_string())?;
            if let Some(icon) = &p.icon {
                w.create_element("icon").with_attribute(("src", icon.as_str())).write_empty()?;
            }
            if let Some(ns) = &p.season_episode_ns_label {
                w.create_element("episode-num")
                    .with_attribute(("system", "xmltv_ns"))
                    .write_text_content(BytesText::new(ns))?;
            }
            if let Some(common) = &p.season_episode_label {
                w.create_element("episode-num")
                    .with_attribute(("system", "onscreen"))
                    .write_text_content(BytesText::new(common))?;
            }
            if p.is_live {
                w.create_element("live").write_empty()?;
            }
            if p.is_new {
                w.create_element("new").write_empty()?;
            }
            if let Some(rating) = &p.rating {
                w.create_element("rating")
                    .write_inner_content(|w| text_element(w, "value", rating))?;
            }
            Ok(())
        })?;
    Ok(())
}

fn text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> std::io::Result<()> {
    w.create_element(name).write_text_content(BytesText::new(text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epg::normalizer::{normalize, NormalizeOptions};
    use crate::epg::schedule::parse_schedule;

    fn programs() -> Vec<ProgramRecord> {
        let channels = parse_schedule(
            r#"[{
                "_id": "ch-1",
                "timelines": [
                    {
                        "start": "2024-01-15T12:00:00Z",
                        "stop": "2024-01-15T12:30:00Z",
                        "title": "Law & Order",
                        "genre": "Crime",
                        "genres": "Crime and Drama",
                        "episode": {
                            "duration": 1800000,
                            "season": 2,
                            "number": 5,
                            "name": "<Heist>",
                            "rating": "TV-14",
                            "liveBroadcast": true,
                            "firstAired": "2009-03-07T00:00:00Z",
                            "poster": {"path": "http://img/p.jpg?w=1&h=2"}
                        }
                    },
                    {
                        "start": "2024-01-15T12:30:00Z",
                        "stop": "2024-01-15T13:00:00Z",
                        "title": "Filler",
                        "episode": {"duration": 0}
                    }
                ]
            }]"#,
        )
        .unwrap();

        let options = NormalizeOptions::default();
        channels[0]
            .timelines
            .iter()
            .filter_map(|e| normalize(&channels[0], e, &options).into_program())
            .collect()
    }

    fn render(programs: &[ProgramRecord]) -> String {
        let mut out = Vec::new();
        write_xmltv(&mut out, "plutotv_epg", programs).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_xmltv_document() {
        let xml = render(&programs());

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<tv generator-info-name="plutotv_epg">"#));
        assert_eq!(xml.matches("<channel id=\"ch-1\">").count(), 1);
        assert_eq!(xml.matches("<programme ").count(), 1);
        assert!(xml.contains("<title>Law &amp; Order</title>"));
        assert!(xml.contains("<sub-title>S02E05 &lt;Heist&gt;</sub-title>"));
        assert!(xml.contains("<desc>Unavailable</desc>"));
        assert!(xml.contains("<date>20090307</date>"));
        assert!(xml.contains("<category>Crime</category>"));
        assert!(xml.contains("<category>Drama</category>"));
        assert!(xml.contains(r#"<icon src="http://img/p.jpg?w=1&amp;h=2"/>"#));
        assert!(xml.contains(r#"<episode-num system="xmltv_ns">1.4.0/1</episode-num>"#));
        assert!(xml.contains(r#"<episode-num system="onscreen">S02E05</episode-num>"#));
        assert!(xml.contains("<live/>"));
        assert!(xml.contains("<new/>"));
        assert!(xml.contains("<value>TV-14</value>"));
    }

    #[test]
    fn test_programme_times() {
        let p = &programs()[0];
        let xml = render(std::slice::from_ref(p));
        let start = p.start.format(XMLTV_TIME).to_string();
        assert!(xml.contains(&format!("start=\"{}\"", start)));
        assert!(start.starts_with(&p.start.format("%Y%m%d").to_string()));
    }

    #[test]
    fn test_empty_document() {
        let xml = render(&[]);
        assert!(xml.contains("<tv generator-info-name=\"plutotv_epg\">"));
        assert!(!xml.contains("<programme"));
    }
}
