//! AC-3 re-encoding metadata subsegments.
//!
//! Dolby E frames carry the metadata an AC-3 encoder needs to transcode
//! each program without operator input. The primary metadata segment holds
//! one subsegment per supported revision (with or without extended BSI);
//! low-frame-rate frames add an extension subsegment with the second half
//! of the compression words.

use std::io::Read;

use anyhow::Result;

use crate::structs::{MAX_ADDBSI_BYTES, MAX_PROGRAMS};
use crate::utils::word_reader::WordReader;

/// Per-program AC-3 metadata.
///
/// Field names and widths follow the AC-3 BSI syntax. Exactly one of the
/// XBSI group (`xbsi1e`..`encinfo`) and the timecode group
/// (`timecod1e`..`timecod2`) is transmitted, selected by the subsegment id;
/// the untransmitted group stays zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ac3Program {
    pub datarate: u8,
    pub bsmod: u8,
    pub acmod: u8,
    pub cmixlev: u8,
    pub surmixlev: u8,
    pub dsurmod: u8,
    pub lfeon: u8,
    pub dialnorm: u8,
    pub langcode: u8,
    pub langcod: u8,
    pub audprodie: u8,
    pub mixlevel: u8,
    pub roomtyp: u8,
    pub copyrightb: u8,
    pub origbs: u8,

    pub xbsi1e: u8,
    pub dmixmod: u8,
    pub ltrtcmixlev: u8,
    pub ltrtsurmixlev: u8,
    pub lorocmixlev: u8,
    pub lorosurmixlev: u8,
    pub xbsi2e: u8,
    pub dsurexmod: u8,
    pub dheadphonmod: u8,
    pub adconvtyp: u8,
    pub xbsi2: u8,
    pub encinfo: u8,

    pub timecod1e: u8,
    pub timecod1: u16,
    pub timecod2e: u8,
    pub timecod2: u16,

    pub hpfon: u8,
    pub bwlpfon: u8,
    pub lfelpfon: u8,
    pub sur90on: u8,
    pub suratton: u8,
    pub rfpremphon: u8,
    pub compre: u8,
    pub compr1: u8,
    pub dynrnge: u8,
    pub dynrng1: u8,
    pub dynrng2: u8,
    pub dynrng3: u8,
    pub dynrng4: u8,

    pub addbsie: u8,
    /// Additional BSI length in bytes, already incremented per the syntax.
    pub addbsil: u8,
    pub addbsi: [u8; MAX_ADDBSI_BYTES],
}

impl Default for Ac3Program {
    fn default() -> Self {
        Self {
            datarate: Default::default(),
            bsmod: Default::default(),
            acmod: Default::default(),
            cmixlev: Default::default(),
            surmixlev: Default::default(),
            dsurmod: Default::default(),
            lfeon: Default::default(),
            dialnorm: Default::default(),
            langcode: Default::default(),
            langcod: Default::default(),
            audprodie: Default::default(),
            mixlevel: Default::default(),
            roomtyp: Default::default(),
            copyrightb: Default::default(),
            origbs: Default::default(),

            xbsi1e: Default::default(),
            dmixmod: Default::default(),
            ltrtcmixlev: Default::default(),
            ltrtsurmixlev: Default::default(),
            lorocmixlev: Default::default(),
            lorosurmixlev: Default::default(),
            xbsi2e: Default::default(),
            dsurexmod: Default::default(),
            dheadphonmod: Default::default(),
            adconvtyp: Default::default(),
            xbsi2: Default::default(),
            encinfo: Default::default(),

            timecod1e: Default::default(),
            timecod1: Default::default(),
            timecod2e: Default::default(),
            timecod2: Default::default(),

            hpfon: Default::default(),
            bwlpfon: Default::default(),
            lfelpfon: Default::default(),
            sur90on: Default::default(),
            suratton: Default::default(),
            rfpremphon: Default::default(),
            compre: Default::default(),
            compr1: Default::default(),
            dynrnge: Default::default(),
            dynrng1: Default::default(),
            dynrng2: Default::default(),
            dynrng3: Default::default(),
            dynrng4: Default::default(),

            addbsie: Default::default(),
            addbsil: Default::default(),
            addbsi: [0; MAX_ADDBSI_BYTES],
        }
    }
}

/// AC-3 metadata subsegment: one [`Ac3Program`] per program plus the
/// trailing additional-BSI loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ac3MetadataSegment {
    pub programs: [Ac3Program; MAX_PROGRAMS],
}

impl Ac3MetadataSegment {
    /// Reads the subsegment body. `xbsi` selects the extended-BSI variant
    /// (subsegment id 1) over the timecode variant (id 2).
    pub(crate) fn read<R: Read>(
        &mut self,
        reader: &mut WordReader<R>,
        n_programs: usize,
        xbsi: bool,
    ) -> Result<()> {
        for pgm in self.programs.iter_mut().take(n_programs) {
            pgm.datarate = reader.read(5)? as u8;
            pgm.bsmod = reader.read(3)? as u8;
            pgm.acmod = reader.read(3)? as u8;
            pgm.cmixlev = reader.read(2)? as u8;
            pgm.surmixlev = reader.read(2)? as u8;
            pgm.dsurmod = reader.read(2)? as u8;
            pgm.lfeon = reader.read(1)? as u8;
            pgm.dialnorm = reader.read(5)? as u8;
            pgm.langcode = reader.read(1)? as u8;
            pgm.langcod = reader.read(8)? as u8;
            pgm.audprodie = reader.read(1)? as u8;
            pgm.mixlevel = reader.read(5)? as u8;
            pgm.roomtyp = reader.read(2)? as u8;
            pgm.copyrightb = reader.read(1)? as u8;
            pgm.origbs = reader.read(1)? as u8;

            if xbsi {
                pgm.xbsi1e = reader.read(1)? as u8;
                pgm.dmixmod = reader.read(2)? as u8;
                pgm.ltrtcmixlev = reader.read(3)? as u8;
                pgm.ltrtsurmixlev = reader.read(3)? as u8;
                pgm.lorocmixlev = reader.read(3)? as u8;
                pgm.lorosurmixlev = reader.read(3)? as u8;
                pgm.xbsi2e = reader.read(1)? as u8;
                pgm.dsurexmod = reader.read(2)? as u8;
                pgm.dheadphonmod = reader.read(2)? as u8;
                pgm.adconvtyp = reader.read(1)? as u8;
                pgm.xbsi2 = reader.read(8)? as u8;
                pgm.encinfo = reader.read(1)? as u8;
            } else {
                pgm.timecod1e = reader.read(1)? as u8;
                pgm.timecod1 = reader.read(14)? as u16;
                pgm.timecod2e = reader.read(1)? as u8;
                pgm.timecod2 = reader.read(14)? as u16;
            }

            pgm.hpfon = reader.read(1)? as u8;
            pgm.bwlpfon = reader.read(1)? as u8;
            pgm.lfelpfon = reader.read(1)? as u8;
            pgm.sur90on = reader.read(1)? as u8;
            pgm.suratton = reader.read(1)? as u8;
            pgm.rfpremphon = reader.read(1)? as u8;
            pgm.compre = reader.read(1)? as u8;
            pgm.compr1 = reader.read(8)? as u8;
            pgm.dynrnge = reader.read(1)? as u8;
            pgm.dynrng1 = reader.read(8)? as u8;
            pgm.dynrng2 = reader.read(8)? as u8;
            pgm.dynrng3 = reader.read(8)? as u8;
            pgm.dynrng4 = reader.read(8)? as u8;
        }

        for pgm in self.programs.iter_mut().take(n_programs) {
            pgm.addbsie = reader.read(1)? as u8;
            if pgm.addbsie != 0 {
                pgm.addbsil = reader.read(6)? as u8 + 1;
                for i in 0..pgm.addbsil as usize {
                    pgm.addbsi[i] = reader.read(8)? as u8;
                }
            }
        }

        Ok(())
    }
}

/// Per-program AC-3 extension metadata: the second compression word and
/// dynamic-range words five through eight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ac3ExtProgram {
    pub compr2: u8,
    pub dynrng5: u8,
    pub dynrng6: u8,
    pub dynrng7: u8,
    pub dynrng8: u8,
}

/// AC-3 metadata extension subsegment (low frame rates only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ac3MetadataExtSegment {
    pub programs: [Ac3ExtProgram; MAX_PROGRAMS],
}

impl Ac3MetadataExtSegment {
    pub(crate) fn read<R: Read>(
        &mut self,
        reader: &mut WordReader<R>,
        n_programs: usize,
    ) -> Result<()> {
        for pgm in self.programs.iter_mut().take(n_programs) {
            pgm.compr2 = reader.read(8)? as u8;
            pgm.dynrng5 = reader.read(8)? as u8;
            pgm.dynrng6 = reader.read(8)? as u8;
            pgm.dynrng7 = reader.read(8)? as u8;
            pgm.dynrng8 = reader.read(8)? as u8;
        }

        Ok(())
    }
}
