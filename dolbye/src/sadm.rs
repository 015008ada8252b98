//! Serial ADM document generation.
//!
//! Projects a parsed frame into an S-ADM `frame` document per
//! ITU-R BS.2125-1: an `audioFormatExtended` section with one
//! programme/content/object chain per Dolby E program, transport tracks
//! derived from each program's AC-3 channel mode, and a `dbmd` custom set
//! carrying the Dolby E and AC-3 metadata for downstream encoders.

use anyhow::{Result, bail};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use uuid::Uuid;

use crate::process::parse::DescriptionText;
use crate::structs::MAX_PROGRAMS;
use crate::structs::ac3::Ac3Program;
use crate::structs::frame::FrameInfo;
use crate::utils::errors::SadmError;

const AUDIO_TRACK_UID: &str = "ATU_0000000";
const AUDIO_PACK_FORMAT_ID: &str = "AP_0001000";
const AUDIO_CHANNEL_FORMAT_ID: &str = "AC_0001000";
const AUDIO_OBJECT_ID: &str = "AO_100";
const AUDIO_CONTENT_ID: &str = "ACO_100";
const AUDIO_PROGRAMME_ID: &str = "APR_100";

/// Generates the S-ADM document for one parsed frame.
pub fn document(
    frame: &FrameInfo,
    descriptions: &[DescriptionText; MAX_PROGRAMS],
) -> Result<String> {
    let mut xml = Xml {
        w: Writer::new_with_indent(Vec::new(), b' ', 2),
    };

    xml.w
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    xml.open("frame", &[("version", "ITU-R_BS.2125-1")])?;

    write_frame_header(&mut xml, frame)?;
    write_audio_format_extended(&mut xml, frame, descriptions)?;
    write_audio_format_custom(&mut xml, frame, descriptions)?;

    xml.close("frame")?;

    Ok(String::from_utf8(xml.w.into_inner())?)
}

fn write_frame_header(xml: &mut Xml, frame: &FrameInfo) -> Result<()> {
    let Some(samples) = frame.frame_rate.samples_per_frame() else {
        bail!(SadmError::UnsupportedFrameRate(frame.frame_rate.code()));
    };

    // Fractional frame rates get the first value of the five-frame sample
    // sequence; the flow id is freshly generated per document.
    let duration = format!("00:00:00.0{samples}S48000");
    let flow_id = Uuid::new_v4().to_string();

    xml.open("frameHeader", &[])?;
    xml.leaf_attrs(
        "frameFormat",
        &[
            ("frameFormatID", "FF_00000001"),
            ("type", "full"),
            ("start", "00:00:00.00000S48000"),
            ("duration", &duration),
            ("timeReference", "local"),
            ("flowID", &flow_id),
        ],
    )?;

    write_transport_track_format(xml, frame)?;
    write_profile_list(xml)?;

    xml.close("frameHeader")?;

    Ok(())
}

fn write_transport_track_format(xml: &mut Xml, frame: &FrameInfo) -> Result<()> {
    let mut tracks = 0u32;
    for pgm in 0..frame.n_programs {
        tracks += acmod_track_count(frame.ac3_metadata.programs[pgm].acmod)?;
    }

    let count = tracks.to_string();
    xml.open(
        "transportTrackFormat",
        &[
            ("transportID", "TP_0001"),
            ("transportName", "X"),
            ("numIDs", &count),
            ("numTracks", &count),
        ],
    )?;

    for track in 1..=tracks {
        xml.open(
            "audioTrack",
            &[
                ("trackID", &track.to_string()),
                ("formatLabel", "0001"),
                ("formatDefinition", "PCM"),
            ],
        )?;
        xml.leaf("audioTrackUIDRef", &track_uid(track))?;
        xml.close("audioTrack")?;
    }

    xml.close("transportTrackFormat")?;

    Ok(())
}

fn write_profile_list(xml: &mut Xml) -> Result<()> {
    xml.open("profileList", &[])?;
    xml.leaf_with(
        "profile",
        &[
            (
                "profileName",
                "Advanced sound system: ADM and S-ADM profile for emission",
            ),
            ("profileVersion", "1"),
            ("profileLevel", "1"),
        ],
        "ITU-R BS.2168",
    )?;
    xml.leaf_with(
        "profile",
        &[
            ("profileName", "Dolby E ADM and S-ADM Profile for emission"),
            ("profileVersion", "1"),
            ("profileLevel", "1"),
        ],
        "Dolby E ADM and S-ADM Profile for emission",
    )?;
    xml.close("profileList")?;

    Ok(())
}

fn write_audio_format_extended(
    xml: &mut Xml,
    frame: &FrameInfo,
    descriptions: &[DescriptionText; MAX_PROGRAMS],
) -> Result<()> {
    xml.open("audioFormatExtended", &[("version", "ITU-R_BS.2076-3")])?;
    write_profile_list(xml)?;

    let mut track_offset = 0;
    for pgm in 0..frame.n_programs {
        track_offset = write_programme(xml, frame, descriptions, pgm, track_offset)?;
    }

    xml.close("audioFormatExtended")?;

    Ok(())
}

/// One programme/content/object chain plus its track UIDs. Returns the
/// track counter advanced past this programme's tracks.
fn write_programme(
    xml: &mut Xml,
    frame: &FrameInfo,
    descriptions: &[DescriptionText; MAX_PROGRAMS],
    pgm: usize,
    track_offset: u32,
) -> Result<u32> {
    let ac3 = &frame.ac3_metadata.programs[pgm];
    let number = pgm + 1;
    let loudness = -(ac3.dialnorm as i32);

    let mut programme_name = format!("Programme {number}");
    if let Some(text) = descriptions[pgm].text() {
        programme_name = format!("{programme_name} ({text})");
    }

    xml.open(
        "audioProgramme",
        &[
            ("audioProgrammeID", &format!("{AUDIO_PROGRAMME_ID}{number}")),
            ("audioProgrammeName", &programme_name),
            ("audioProgrammeLanguage", "und"),
        ],
    )?;
    xml.leaf("audioContentIDRef", &format!("{AUDIO_CONTENT_ID}{number}"))?;
    xml.open("loudnessMetadata", &[])?;
    xml.leaf("dialogueLoudness", &loudness.to_string())?;
    xml.close("loudnessMetadata")?;
    xml.close("audioProgramme")?;

    xml.open(
        "audioContent",
        &[
            ("audioContentID", &format!("{AUDIO_CONTENT_ID}{number}")),
            ("audioContentName", &format!("Content {number}")),
            ("audioContentLanguage", "und"),
        ],
    )?;
    xml.leaf("audioObjectIDRef", &format!("{AUDIO_OBJECT_ID}{number}"))?;
    xml.open("loudnessMetadata", &[])?;
    xml.leaf("dialogueLoudness", &loudness.to_string())?;
    xml.close("loudnessMetadata")?;

    let (dialogue, kind_attr, kind) = match ac3.bsmod {
        0 => ("2", "mixedContentKind", "1"),
        1 => ("0", "nonDialogueContentKind", "3"),
        2 => ("2", "mixedContentKind", "4"),
        4 | 5 => ("1", "dialogueContentKind", "5"),
        6 => ("1", "dialogueContentKind", "6"),
        _ => ("2", "mixedContentKind", "0"),
    };
    xml.leaf_with("dialogue", &[(kind_attr, kind)], dialogue)?;
    xml.close("audioContent")?;

    let pack = format!("{AUDIO_PACK_FORMAT_ID}{}", acmod_pack_suffix(ac3.acmod)?);
    let tracks = acmod_track_count(ac3.acmod)?;

    xml.open(
        "audioObject",
        &[
            ("audioObjectID", &format!("{AUDIO_OBJECT_ID}{number}")),
            ("audioObjectName", &format!("Object {number}")),
            ("interact", "0"),
        ],
    )?;
    xml.leaf("audioPackFormatIDRef", &pack)?;
    for track in 1..=tracks {
        xml.leaf("audioTrackUIDRef", &track_uid(track_offset + track))?;
    }
    xml.close("audioObject")?;

    for track in 1..=tracks {
        xml.open("audioTrackUID", &[("UID", &track_uid(track_offset + track))])?;
        xml.leaf(
            "audioChannelFormatIDRef",
            &format!("{AUDIO_CHANNEL_FORMAT_ID}{track}"),
        )?;
        xml.leaf("audioPackFormatIDRef", &pack)?;
        xml.close("audioTrackUID")?;
    }

    Ok(track_offset + tracks)
}

fn write_audio_format_custom(
    xml: &mut Xml,
    frame: &FrameInfo,
    descriptions: &[DescriptionText; MAX_PROGRAMS],
) -> Result<()> {
    xml.open("audioFormatCustom", &[])?;
    xml.open(
        "audioFormatCustomSet",
        &[
            ("audioFormatCustomSetID", "AFC_1001"),
            ("audioFormatCustomSetName", "DolbyE DBMD Chunk"),
            (
                "audioFormatCustomSetType",
                "CUSTOM_SET_TYPE_DOLBYE_DBMD_CHUNK",
            ),
            ("audioFormatCustomSetVersion", "1"),
        ],
    )?;
    xml.open("dbmd", &[])?;

    write_dolby_e_segment(xml, frame)?;

    xml.open("metadataSegment", &[("ID", "3")])?;
    for pgm in 0..frame.n_programs {
        write_ac3_program(xml, frame, descriptions, pgm)?;
    }
    xml.close("metadataSegment")?;

    xml.open("metadataSegment", &[("ID", "11")])?;
    for pgm in 0..frame.n_programs {
        write_encode_parameters(xml, &frame.ac3_metadata.programs[pgm], pgm)?;
    }
    xml.close("metadataSegment")?;

    xml.close("dbmd")?;
    xml.close("audioFormatCustomSet")?;
    xml.close("audioFormatCustom")?;

    Ok(())
}

fn write_dolby_e_segment(xml: &mut Xml, frame: &FrameInfo) -> Result<()> {
    xml.open("metadataSegment", &[("ID", "1")])?;
    xml.open("dolbyE", &[("ID", "0")])?;
    xml.leaf("programConfig", &frame.program_config.code().to_string())?;
    xml.leaf("frameRateCode", &frame.frame_rate.code().to_string())?;
    xml.leaf("smpteTimeCode", &frame.timecode.to_string())?;
    xml.close("dolbyE")?;
    xml.close("metadataSegment")?;

    match frame.program_config.code() {
        0 | 6 | 11 | 19 => log::info!("Valid Dolby E programme configuration detected"),
        _ => log::warn!("Unsupported Dolby E programme configuration detected"),
    }

    Ok(())
}

fn write_ac3_program(
    xml: &mut Xml,
    frame: &FrameInfo,
    descriptions: &[DescriptionText; MAX_PROGRAMS],
    pgm: usize,
) -> Result<()> {
    let ac3 = &frame.ac3_metadata.programs[pgm];
    let id = pgm.to_string();

    xml.open("ac3Program", &[("ID", &id)])?;

    xml.open("programInfo", &[])?;
    xml.leaf("acMod", &ac3.acmod.to_string())?;
    xml.leaf("bsMod", &ac3.bsmod.to_string())?;
    xml.leaf("lfeOn", &ac3.lfeon.to_string())?;
    xml.close("programInfo")?;

    xml.leaf("cMixLev", &ac3.cmixlev.to_string())?;
    xml.leaf("surMixLev", &ac3.surmixlev.to_string())?;
    xml.leaf("dSurMod", &ac3.dsurmod.to_string())?;
    xml.leaf("dialNorm", &ac3.dialnorm.to_string())?;
    xml.leaf("copyRightB", &ac3.copyrightb.to_string())?;
    xml.leaf("origBs", &ac3.origbs.to_string())?;

    xml.open("langCode", &[("exists", &ac3.langcode.to_string())])?;
    xml.leaf("langCod", &ac3.langcod.to_string())?;
    xml.close("langCode")?;

    xml.open("audioProdInfo", &[("exists", &ac3.audprodie.to_string())])?;
    xml.leaf("mixLevel", &ac3.mixlevel.to_string())?;
    xml.leaf("roomTyp", &ac3.roomtyp.to_string())?;
    xml.close("audioProdInfo")?;

    xml.open("extBsi1e", &[("exists", &ac3.xbsi1e.to_string())])?;
    xml.leaf("loRoCMixLev", &ac3.lorocmixlev.to_string())?;
    xml.leaf("loRoSurMixLev", &ac3.lorosurmixlev.to_string())?;
    xml.leaf("ltRtCMixLev", &ac3.ltrtcmixlev.to_string())?;
    xml.leaf("ltRtSurMixLev", &ac3.ltrtsurmixlev.to_string())?;
    xml.leaf("dMixMod", &ac3.dmixmod.to_string())?;
    xml.close("extBsi1e")?;

    xml.open("extBsi2e", &[("exists", &ac3.xbsi2e.to_string())])?;
    xml.leaf("dSurExMod", &ac3.dsurexmod.to_string())?;
    xml.leaf("dHeadPhonMod", &ac3.dheadphonmod.to_string())?;
    xml.leaf("adConvTyp", &ac3.adconvtyp.to_string())?;
    xml.close("extBsi2e")?;

    xml.leaf_with(
        "compr1",
        &[("exists", &ac3.compre.to_string())],
        &ac3.compr1.to_string(),
    )?;
    xml.leaf_with(
        "dynRng1",
        &[("exists", &ac3.dynrnge.to_string())],
        &ac3.dynrng1.to_string(),
    )?;

    if let Some(text) = descriptions[pgm].text() {
        xml.leaf("programDescriptionText", text)?;
    }

    xml.close("ac3Program")?;

    match ac3.acmod {
        2 | 7 => log::info!("Valid AC-3 channel configuration detected"),
        _ => log::warn!("Unsupported AC-3 channel configuration detected"),
    }

    Ok(())
}

fn write_encode_parameters(xml: &mut Xml, ac3: &Ac3Program, pgm: usize) -> Result<()> {
    xml.open("encodeParameters", &[("ID", &pgm.to_string())])?;
    xml.leaf("hpFOn", &ac3.hpfon.to_string())?;
    xml.leaf("bwLpFOn", &ac3.bwlpfon.to_string())?;
    xml.leaf("lfeLpFOn", &ac3.lfelpfon.to_string())?;
    xml.leaf("sur90On", &ac3.sur90on.to_string())?;
    xml.leaf("surAttOn", &ac3.suratton.to_string())?;
    xml.leaf("rfPremphOn", &ac3.rfpremphon.to_string())?;
    xml.close("encodeParameters")?;

    Ok(())
}

/// Number of transport tracks an AC-3 channel mode occupies.
fn acmod_track_count(acmod: u8) -> Result<u32> {
    Ok(match acmod {
        1 => 1,
        2 => 2,
        3 | 4 => 3,
        5 | 6 => 4,
        7 => 6,
        _ => bail!(SadmError::InvalidAcmod(acmod)),
    })
}

/// Common-definitions pack format suffix for an AC-3 channel mode.
/// Channel modes without a common pack map to the nearest equivalent.
fn acmod_pack_suffix(acmod: u8) -> Result<&'static str> {
    Ok(match acmod {
        1 => "1",
        2 => "2",
        3 | 4 => "a",
        5 | 6 => "b",
        7 => "3",
        _ => bail!(SadmError::InvalidAcmod(acmod)),
    })
}

fn track_uid(n: u32) -> String {
    // Keeps twelve characters for double-digit track numbers by dropping
    // one digit of zero padding.
    let mut uid = format!("{AUDIO_TRACK_UID}{n}");
    if uid.len() > 12 {
        uid.remove(4);
    }
    uid
}

struct Xml {
    w: Writer<Vec<u8>>,
}

impl Xml {
    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for &(key, value) in attrs {
            start.push_attribute((key, value));
        }
        self.w.write_event(Event::Start(start))?;

        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.w.write_event(Event::End(BytesEnd::new(name)))?;

        Ok(())
    }

    fn leaf(&mut self, name: &str, text: &str) -> Result<()> {
        self.leaf_with(name, &[], text)
    }

    fn leaf_attrs(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for &(key, value) in attrs {
            start.push_attribute((key, value));
        }
        self.w.write_event(Event::Empty(start))?;

        Ok(())
    }

    fn leaf_with(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.open(name, attrs)?;
        self.w.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::sequence::Sequencer;
    use crate::structs::config::BitDepth;
    use crate::testkit::FrameBuilder;

    fn first_frame_document(bytes: Vec<u8>) -> Result<String> {
        let mut seq = Sequencer::new(Cursor::new(bytes))?;
        let frame = seq.next_frame()?;
        document(&frame, seq.descriptions())
    }

    #[test]
    fn emits_programme_chain_per_program() {
        // 2+2 at 25 fps: two programs of AC-3 acmod 2/0.
        let bytes = FrameBuilder::new(BitDepth::Bits24, 19, 3).build();
        let xml = first_frame_document(bytes).unwrap();

        assert!(xml.contains(r#"<frame version="ITU-R_BS.2125-1">"#));
        assert!(xml.contains(r#"duration="00:00:00.01920S48000""#));
        assert!(xml.contains(r#"audioProgrammeID="APR_1001""#));
        assert!(xml.contains(r#"audioProgrammeID="APR_1002""#));
        assert!(xml.contains("<dialogueLoudness>-27</dialogueLoudness>"));

        // Two stereo programs: four tracks, sequentially numbered.
        assert!(xml.contains(r#"numTracks="4""#));
        assert!(xml.contains("<audioTrackUIDRef>ATU_00000004</audioTrackUIDRef>"));

        // dbmd custom set with the AC-3 program parameters.
        assert!(xml.contains("CUSTOM_SET_TYPE_DOLBYE_DBMD_CHUNK"));
        assert!(xml.contains("<acMod>2</acMod>"));
        assert!(xml.contains("<dialNorm>27</dialNorm>"));
        assert!(xml.contains(r#"<compr1 exists="1">66</compr1>"#));
        assert!(xml.contains("<hpFOn>1</hpFOn>"));
    }

    #[test]
    fn received_description_names_programme() {
        let mut bytes = Vec::new();
        for (n, ch) in [0x02, b'N', b'e', b'w', b's', 0x03].into_iter().enumerate() {
            bytes.extend(
                FrameBuilder::new(BitDepth::Bits16, 11, 5)
                    .frame_count(n as u16)
                    .description_char(0, ch)
                    .build(),
            );
        }

        let xml = first_frame_document(bytes).unwrap();
        assert!(xml.contains(r#"audioProgrammeName="Programme 1 (News)""#));
        assert!(xml.contains("<programDescriptionText>News</programDescriptionText>"));
    }

    #[test]
    fn high_frame_rate_has_no_defined_duration() {
        let mut seq = Sequencer::new(Cursor::new(
            FrameBuilder::new(BitDepth::Bits16, 11, 6).build(),
        ))
        .unwrap();
        let frame = seq.next_frame().unwrap();
        let err = document(&frame, seq.descriptions()).unwrap_err();
        assert!(
            err.downcast_ref::<SadmError>()
                .is_some_and(|e| matches!(e, SadmError::UnsupportedFrameRate(6)))
        );
    }
}
