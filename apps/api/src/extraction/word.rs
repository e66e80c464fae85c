//! Text extraction from legacy Word 97-2003 (`.doc`) files.
//!
//! A `.doc` is an OLE compound file. The `WordDocument` stream opens with the
//! FIB; its CLX offset points into the `0Table` or `1Table` stream, where the
//! piece table maps character positions onto byte ranges of `WordDocument`.
//! Only the main document text (the first `ccpText` characters) is returned.

use std::io::{Cursor, Read, Seek};

use crate::extraction::resume::{tidy_lines, ResumeParseError};

/// Leading bytes of every OLE compound file.
pub const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const WORD_IDENT: u16 = 0xA5EC;

// FIB offsets (Word 97 and later).
const FIB_FLAGS: usize = 0x000A;
const FIB_CCP_TEXT: usize = 0x004C;
const FIB_FC_CLX: usize = 0x01A2;
const FIB_LCB_CLX: usize = 0x01A6;

const F_ENCRYPTED: u16 = 0x0100;
const F_WHICH_TBL_STM: u16 = 0x0200;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const CP_SIZE: usize = 4;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    /// Byte offset into `WordDocument`.
    offset: usize,
    /// 8-bit cp1252 text when set, UTF-16LE otherwise.
    compressed: bool,
    chars: usize,
}

pub fn extract_doc_text(data: &[u8]) -> Result<String, ResumeParseError> {
    let mut file = cfb::CompoundFile::open(Cursor::new(data))?;
    let word = read_stream(&mut file, "/WordDocument")?;

    if read_u16(&word, 0)? != WORD_IDENT {
        return Err(doc_error("missing Word FIB signature"));
    }
    let flags = read_u16(&word, FIB_FLAGS)?;
    if flags & F_ENCRYPTED != 0 {
        return Err(doc_error("document is encrypted"));
    }

    let table_name = if flags & F_WHICH_TBL_STM != 0 {
        "/1Table"
    } else {
        "/0Table"
    };
    let table = read_stream(&mut file, table_name)?;

    let ccp_text = read_u32(&word, FIB_CCP_TEXT)? as usize;
    let fc_clx = read_u32(&word, FIB_FC_CLX)? as usize;
    let lcb_clx = read_u32(&word, FIB_LCB_CLX)? as usize;
    let clx = table
        .get(fc_clx..fc_clx.saturating_add(lcb_clx))
        .ok_or_else(|| doc_error("CLX lies outside the table stream"))?;

    let mut raw = String::new();
    let mut remaining = ccp_text;
    for piece in parse_piece_table(clx)? {
        if remaining == 0 {
            break;
        }
        let count = piece.chars.min(remaining);
        decode_piece(&word, piece, count, &mut raw)?;
        remaining -= count;
    }

    Ok(clean_word_text(&raw))
}

fn read_stream<F: Read + Seek>(
    file: &mut cfb::CompoundFile<F>,
    path: &str,
) -> Result<Vec<u8>, ResumeParseError> {
    let mut stream = file.open_stream(path)?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

fn parse_piece_table(clx: &[u8]) -> Result<Vec<Piece>, ResumeParseError> {
    let mut pos = 0;
    // Property modifiers may precede the piece table.
    while clx.get(pos) == Some(&CLX_PRC) {
        let cb = read_u16(clx, pos + 1)? as usize;
        pos += 3 + cb;
    }
    if clx.get(pos) != Some(&CLX_PCDT) {
        return Err(doc_error("piece table not found"));
    }

    let lcb = read_u32(clx, pos + 1)? as usize;
    let plc = clx
        .get(pos + 5..(pos + 5).saturating_add(lcb))
        .ok_or_else(|| doc_error("truncated piece table"))?;
    if lcb < CP_SIZE || (lcb - CP_SIZE) % (CP_SIZE + PCD_SIZE) != 0 {
        return Err(doc_error("malformed piece table"));
    }

    let count = (lcb - CP_SIZE) / (CP_SIZE + PCD_SIZE);
    let pcd_base = (count + 1) * CP_SIZE;
    (0..count)
        .map(|i| {
            let start = read_u32(plc, i * CP_SIZE)?;
            let end = read_u32(plc, (i + 1) * CP_SIZE)?;
            let fc = read_u32(plc, pcd_base + i * PCD_SIZE + 2)?;
            let compressed = fc & FC_COMPRESSED != 0;
            let fc = (fc & FC_MASK) as usize;
            Ok(Piece {
                offset: if compressed { fc / 2 } else { fc },
                compressed,
                chars: end.saturating_sub(start) as usize,
            })
        })
        .collect()
}

fn decode_piece(
    word: &[u8],
    piece: Piece,
    count: usize,
    out: &mut String,
) -> Result<(), ResumeParseError> {
    let len = if piece.compressed { count } else { count * 2 };
    let bytes = word
        .get(piece.offset..piece.offset.saturating_add(len))
        .ok_or_else(|| doc_error("text piece lies outside the document stream"))?;

    if piece.compressed {
        out.extend(bytes.iter().map(|&b| cp1252(b)));
    } else {
        let units = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
    }
    Ok(())
}

/// Windows-1252 for the 0x80..0x9F block Word uses in compressed pieces.
fn cp1252(b: u8) -> char {
    match b {
        0x80 => '\u{20AC}',
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x99 => '\u{2122}',
        _ => char::from(b),
    }
}

/// Maps Word's in-text control characters to plain text and keeps only the
/// displayed result of fields (`0x13 instruction 0x14 result 0x15`).
fn clean_word_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // One entry per open field; true while inside its instruction.
    let mut fields: Vec<bool> = Vec::new();

    for c in raw.chars() {
        match c {
            '\u{13}' => {
                fields.push(true);
                continue;
            }
            '\u{14}' => {
                if let Some(in_instruction) = fields.last_mut() {
                    *in_instruction = false;
                }
                continue;
            }
            '\u{15}' => {
                fields.pop();
                continue;
            }
            _ => {}
        }
        if fields.iter().any(|&in_instruction| in_instruction) {
            continue;
        }

        match c {
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\u{1E}' => out.push('-'),
            '\u{A0}' => out.push(' '),
            '\t' | '\n' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    tidy_lines(&out)
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16, ResumeParseError> {
    buf.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| doc_error("unexpected end of data"))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32, ResumeParseError> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| doc_error("unexpected end of data"))
}

fn doc_error(msg: &str) -> ResumeParseError {
    ResumeParseError::Doc(msg.to_string())
}

/// Builds minimal Word 97 files for tests. Each piece is `(text, compressed)`;
/// compressed pieces must be ASCII.
#[cfg(test)]
pub(crate) fn word_file(pieces: &[(&str, bool)], ccp_text: usize) -> Vec<u8> {
    use std::io::Write;

    let mut word = vec![0u8; 0x200];
    word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
    word[FIB_FLAGS..FIB_FLAGS + 2].copy_from_slice(&F_WHICH_TBL_STM.to_le_bytes());
    word[FIB_CCP_TEXT..FIB_CCP_TEXT + 4].copy_from_slice(&(ccp_text as u32).to_le_bytes());

    let mut cps = vec![0u32];
    let mut pcds = Vec::new();
    for (text, compressed) in pieces {
        let offset = word.len() as u32;
        let (chars, fc) = if *compressed {
            word.extend_from_slice(text.as_bytes());
            (text.len() as u32, (offset * 2) | FC_COMPRESSED)
        } else {
            let units: Vec<u16> = text.encode_utf16().collect();
            for unit in &units {
                word.extend_from_slice(&unit.to_le_bytes());
            }
            (units.len() as u32, offset)
        };
        cps.push(cps[cps.len() - 1] + chars);
        pcds.extend_from_slice(&[0, 0]);
        pcds.extend_from_slice(&fc.to_le_bytes());
        pcds.extend_from_slice(&[0, 0]);
    }

    let mut plc: Vec<u8> = cps.iter().flat_map(|cp| cp.to_le_bytes()).collect();
    plc.extend_from_slice(&pcds);
    let mut clx = vec![CLX_PCDT];
    clx.extend_from_slice(&(plc.len() as u32).to_le_bytes());
    clx.extend_from_slice(&plc);
    word[FIB_LCB_CLX..FIB_LCB_CLX + 4].copy_from_slice(&(clx.len() as u32).to_le_bytes());

    let mut file = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    for (path, bytes) in [("/WordDocument", &word), ("/1Table", &clx)] {
        let mut stream = file.create_stream(path).unwrap();
        stream.write_all(bytes).unwrap();
        stream.flush().unwrap();
    }
    file.flush().unwrap();
    file.into_inner().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_compressed_and_unicode_pieces() {
        let data = word_file(
            &[
                ("Jane Doe\rjane@example.com\r", true),
                ("Zo\u{eb} Doe\r+1 (555) 123-4567\r", false),
            ],
            52,
        );
        assert_eq!(
            extract_doc_text(&data).unwrap(),
            "Jane Doe\njane@example.com\nZo\u{eb} Doe\n+1 (555) 123-4567"
        );
    }

    #[test]
    fn test_text_past_main_document_is_dropped() {
        let data = word_file(&[("Resume body\rFootnote text\r", true)], 12);
        assert_eq!(extract_doc_text(&data).unwrap(), "Resume body");
    }

    #[test]
    fn test_field_instructions_removed() {
        let raw = "Site: \u{13} HYPERLINK \"https://x.dev\" \u{14}x.dev\u{15}\u{07}Rust\r";
        assert_eq!(clean_word_text(raw), "Site: x.dev\tRust");
    }

    #[test]
    fn test_cp1252_quotes_mapped() {
        assert_eq!(cp1252(0x93), '\u{201C}');
        assert_eq!(cp1252(b'A'), 'A');
        assert_eq!(cp1252(0xE9), '\u{e9}');
    }

    #[test]
    fn test_piece_table_skips_property_modifiers() {
        let mut clx = vec![CLX_PRC, 0x02, 0x00, 0xAA, 0xBB, CLX_PCDT];
        let mut plc = Vec::new();
        plc.extend_from_slice(&0u32.to_le_bytes());
        plc.extend_from_slice(&5u32.to_le_bytes());
        plc.extend_from_slice(&[0, 0]);
        plc.extend_from_slice(&(0x400u32 | FC_COMPRESSED).to_le_bytes());
        plc.extend_from_slice(&[0, 0]);
        clx.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        clx.extend_from_slice(&plc);

        assert_eq!(
            parse_piece_table(&clx).unwrap(),
            vec![Piece {
                offset: 0x200,
                compressed: true,
                chars: 5
            }]
        );
    }

    #[test]
    fn test_not_a_compound_file_is_error() {
        assert!(extract_doc_text(b"plain text, not OLE").is_err());
    }
}
