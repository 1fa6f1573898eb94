//! On-disk layouts for the dictionary, postings, and document statistics.
//!
//! Each variant owns three sibling files under the index directory:
//!
//! - `<stem>.docinfo` — fixed 12-byte records `{docId, maxTf, docLen}`;
//! - `<stem>.index` — dictionary terms and postings payload;
//! - `<stem>.pointers` — per-term document frequency and byte offsets into
//!   the index file for random access.
//!
//! `<stem>` is `uncompressed` or `compressed.<gamma|delta>[.frontcoding]`.
//! All integers are 4-byte big-endian except the 1-byte term lengths inside
//! compressed dictionary blocks. Offsets recorded in a pointers file are
//! true cumulative byte positions in the sibling index file.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use crate::codes::{pack_bits, BitReader, GapCode};
use crate::error::{IndexError, Result};
use crate::spimi::{DocumentInfo, Index, PostingsEntry};
use crate::DocId;

/// Knobs for the compressed family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionParams {
    /// Dictionary terms per block; a block offset is recorded for every
    /// `block_size`-th term instead of every term.
    pub block_size: usize,
    pub code: GapCode,
    pub front_coding: bool,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            block_size: 8,
            code: GapCode::Gamma,
            front_coding: false,
        }
    }
}

impl CompressionParams {
    pub fn file_stem(&self) -> String {
        let mut stem = format!("compressed.{}", self.code.as_str());
        if self.front_coding {
            stem.push_str(".frontcoding");
        }
        stem
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn file(&self, stem: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{stem}.{ext}"))
    }

    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Build metadata kept next to the binary files.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)
        .map_err(|e| IndexError::Corrupt(e.to_string()))?;
    let mut f = File::create(paths.meta())?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut buf = String::new();
    File::open(paths.meta())?.read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(|e| IndexError::Corrupt(e.to_string()))
}

fn write_doc_info(paths: &IndexPaths, stem: &str, index: &Index) -> Result<()> {
    let mut out = BufWriter::new(File::create(paths.file(stem, "docinfo"))?);
    for (&doc_id, info) in &index.doc_info {
        out.write_u32::<BigEndian>(doc_id)?;
        out.write_u32::<BigEndian>(info.max_term_frequency)?;
        out.write_u32::<BigEndian>(info.document_length)?;
    }
    out.flush()?;
    Ok(())
}

fn read_doc_info(paths: &IndexPaths, stem: &str) -> Result<BTreeMap<DocId, DocumentInfo>> {
    let mut bytes = Vec::new();
    File::open(paths.file(stem, "docinfo"))?.read_to_end(&mut bytes)?;
    if bytes.len() % 12 != 0 {
        return Err(IndexError::Corrupt(format!(
            "docinfo length {} is not a multiple of 12",
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let mut doc_info = BTreeMap::new();
    for _ in 0..cursor.get_ref().len() / 12 {
        let doc_id = cursor.read_u32::<BigEndian>()?;
        let max_term_frequency = cursor.read_u32::<BigEndian>()?;
        let document_length = cursor.read_u32::<BigEndian>()?;
        doc_info.insert(
            doc_id,
            DocumentInfo {
                max_term_frequency,
                document_length,
            },
        );
    }
    Ok(doc_info)
}

/// Write the uncompressed variant: fixed-width dictionary terms (width of
/// the longest term, zero right-padded) interleaved with flat
/// `(docId, tf)` posting pairs; pointers record `(df, termOffset,
/// postingsOffset)` per term.
pub fn write_uncompressed(index: &Index, paths: &IndexPaths) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_doc_info(paths, "uncompressed", index)?;

    let fixed_width = index
        .dictionary
        .keys()
        .map(|t| t.len())
        .max()
        .unwrap_or(0);

    let mut out = BufWriter::new(File::create(paths.file("uncompressed", "index"))?);
    let mut refs = BufWriter::new(File::create(paths.file("uncompressed", "pointers"))?);
    let mut position: u32 = 0;
    for (term, entry) in &index.dictionary {
        refs.write_u32::<BigEndian>(entry.document_frequency)?;
        refs.write_u32::<BigEndian>(position)?;

        let mut term_bytes = vec![0u8; fixed_width];
        term_bytes[..term.len()].copy_from_slice(term.as_bytes());
        out.write_all(&term_bytes)?;
        position += fixed_width as u32;

        refs.write_u32::<BigEndian>(position)?;
        for (&doc_id, &tf) in &entry.postings {
            out.write_u32::<BigEndian>(doc_id)?;
            out.write_u32::<BigEndian>(tf)?;
        }
        position += entry.postings.len() as u32 * 8;
    }
    out.flush()?;
    refs.flush()?;
    tracing::debug!(
        terms = index.dictionary.len(),
        fixed_width,
        bytes = position,
        "wrote uncompressed index"
    );
    Ok(())
}

/// Read the uncompressed variant back into an in-memory index.
pub fn read_uncompressed(paths: &IndexPaths) -> Result<Index> {
    let doc_info = read_doc_info(paths, "uncompressed")?;

    let mut pointer_bytes = Vec::new();
    File::open(paths.file("uncompressed", "pointers"))?.read_to_end(&mut pointer_bytes)?;
    if pointer_bytes.len() % 12 != 0 {
        return Err(IndexError::Corrupt(format!(
            "pointers length {} is not a multiple of 12",
            pointer_bytes.len()
        )));
    }
    let mut cursor = Cursor::new(&pointer_bytes);
    let mut records = Vec::with_capacity(pointer_bytes.len() / 12);
    for _ in 0..pointer_bytes.len() / 12 {
        let df = cursor.read_u32::<BigEndian>()?;
        let term_offset = cursor.read_u32::<BigEndian>()? as usize;
        let postings_offset = cursor.read_u32::<BigEndian>()? as usize;
        records.push((df, term_offset, postings_offset));
    }

    let mut data = Vec::new();
    File::open(paths.file("uncompressed", "index"))?.read_to_end(&mut data)?;

    let mut dictionary = BTreeMap::new();
    for (i, &(df, term_offset, postings_offset)) in records.iter().enumerate() {
        let postings_end = records
            .get(i + 1)
            .map(|&(_, next_term, _)| next_term)
            .unwrap_or(data.len());
        let term_slice = data
            .get(term_offset..postings_offset)
            .ok_or_else(|| IndexError::Corrupt("term offset out of bounds".into()))?;
        let term_bytes: Vec<u8> = term_slice
            .iter()
            .copied()
            .take_while(|&b| b != 0)
            .collect();
        let term = String::from_utf8(term_bytes)
            .map_err(|_| IndexError::Corrupt("term is not valid UTF-8".into()))?;

        let posting_slice = data
            .get(postings_offset..postings_end)
            .ok_or_else(|| IndexError::Corrupt("postings offset out of bounds".into()))?;
        if posting_slice.len() % 8 != 0 {
            return Err(IndexError::Corrupt(format!(
                "postings block for '{term}' is not a multiple of 8 bytes"
            )));
        }
        let mut postings = BTreeMap::new();
        let mut pcursor = Cursor::new(posting_slice);
        for _ in 0..posting_slice.len() / 8 {
            let doc_id = pcursor.read_u32::<BigEndian>()?;
            let tf = pcursor.read_u32::<BigEndian>()?;
            postings.insert(doc_id, tf);
        }
        if postings.len() as u32 != df {
            return Err(IndexError::Corrupt(format!(
                "document frequency {df} does not match {} postings for '{term}'",
                postings.len()
            )));
        }
        dictionary.insert(
            term,
            PostingsEntry {
                document_frequency: df,
                postings,
            },
        );
    }

    Ok(Index {
        dictionary,
        doc_info,
    })
}

/// Serialize one dictionary block as `(len, term bytes)` records.
fn plain_block_bytes(block: &[&String]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for term in block {
        out.push(term_len_byte(term)?);
        out.extend_from_slice(term.as_bytes());
    }
    Ok(out)
}

/// Front-code one dictionary block: the first term carries the block's
/// common prefix, a `*` separator, and its suffix; later terms carry `|`
/// plus their suffix. The first length byte is the first term's full
/// length, later length bytes count the stored `|suffix` bytes.
fn front_coded_block_bytes(block: &[&String]) -> Result<Vec<u8>> {
    let prefix = longest_common_prefix(block);
    let mut out = Vec::new();
    for (i, term) in block.iter().enumerate() {
        if i == 0 {
            out.push(term_len_byte(term)?);
            out.extend_from_slice(&prefix);
            out.push(b'*');
            out.extend_from_slice(&term.as_bytes()[prefix.len()..]);
        } else {
            let suffix = &term.as_bytes()[prefix.len()..];
            if suffix.len() + 1 > u8::MAX as usize {
                return Err(IndexError::TermTooLong((*term).clone()));
            }
            out.push(suffix.len() as u8 + 1);
            out.push(b'|');
            out.extend_from_slice(suffix);
        }
    }
    Ok(out)
}

fn term_len_byte(term: &str) -> Result<u8> {
    u8::try_from(term.len()).map_err(|_| IndexError::TermTooLong(term.to_string()))
}

fn longest_common_prefix(block: &[&String]) -> Vec<u8> {
    let Some(first) = block.first() else {
        return Vec::new();
    };
    let mut len = first.len();
    for term in &block[1..] {
        len = len.min(
            first
                .as_bytes()
                .iter()
                .zip(term.as_bytes())
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    first.as_bytes()[..len].to_vec()
}

/// Serialize one term's postings: the first docId raw, every later docId as
/// a gap code packed to its own byte boundary, every posting followed by
/// its raw term frequency.
fn compressed_postings_bytes(
    postings: &BTreeMap<DocId, u32>,
    code: GapCode,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut previous: Option<DocId> = None;
    for (&doc_id, &tf) in postings {
        match previous {
            None => out.write_u32::<BigEndian>(doc_id)?,
            Some(prev) => {
                let gap = doc_id
                    .checked_sub(prev)
                    .filter(|&g| g > 0)
                    .ok_or(IndexError::NonPositiveGap)?;
                out.extend_from_slice(&pack_bits(&code.encode(gap)?));
            }
        }
        out.write_u32::<BigEndian>(tf)?;
        previous = Some(doc_id);
    }
    Ok(out)
}

/// Write the compressed variant: blocked (optionally front-coded)
/// dictionary first, gap-coded postings after, pointers interleaving
/// `(df, [blockOffset every block_size terms], postingsOffset)`.
pub fn write_compressed(
    index: &Index,
    paths: &IndexPaths,
    params: &CompressionParams,
) -> Result<()> {
    create_dir_all(&paths.root)?;
    let stem = params.file_stem();
    let block_size = params.block_size.max(1);
    write_doc_info(paths, &stem, index)?;

    let mut out = BufWriter::new(File::create(paths.file(&stem, "index"))?);
    let mut position: u32 = 0;

    let terms: Vec<&String> = index.dictionary.keys().collect();
    let mut block_offsets = Vec::with_capacity(terms.len().div_ceil(block_size));
    for block in terms.chunks(block_size) {
        block_offsets.push(position);
        let bytes = if params.front_coding {
            front_coded_block_bytes(block)?
        } else {
            plain_block_bytes(block)?
        };
        out.write_all(&bytes)?;
        position += bytes.len() as u32;
    }

    let mut posting_offsets = Vec::with_capacity(index.dictionary.len());
    for entry in index.dictionary.values() {
        posting_offsets.push(position);
        let bytes = compressed_postings_bytes(&entry.postings, params.code)?;
        out.write_all(&bytes)?;
        position += bytes.len() as u32;
    }
    out.flush()?;

    let mut refs = BufWriter::new(File::create(paths.file(&stem, "pointers"))?);
    for (i, entry) in index.dictionary.values().enumerate() {
        refs.write_u32::<BigEndian>(entry.document_frequency)?;
        if i % block_size == 0 {
            refs.write_u32::<BigEndian>(block_offsets[i / block_size])?;
        }
        refs.write_u32::<BigEndian>(posting_offsets[i])?;
    }
    refs.flush()?;
    tracing::debug!(
        variant = %stem,
        terms = terms.len(),
        bytes = position,
        "wrote compressed index"
    );
    Ok(())
}

/// Read a compressed variant back into an in-memory index.
pub fn read_compressed(paths: &IndexPaths, params: &CompressionParams) -> Result<Index> {
    let stem = params.file_stem();
    let block_size = params.block_size.max(1);
    let doc_info = read_doc_info(paths, &stem)?;

    let mut pointer_bytes = Vec::new();
    File::open(paths.file(&stem, "pointers"))?.read_to_end(&mut pointer_bytes)?;

    // record widths alternate with the block boundary, so parse positionally
    let mut dfs = Vec::new();
    let mut block_offsets = Vec::new();
    let mut posting_offsets = Vec::new();
    let mut cursor = Cursor::new(&pointer_bytes);
    let mut remaining = pointer_bytes.len();
    let mut i = 0usize;
    while remaining > 0 {
        let record = if i % block_size == 0 { 12 } else { 8 };
        if remaining < record {
            return Err(IndexError::Corrupt("truncated pointers file".into()));
        }
        dfs.push(cursor.read_u32::<BigEndian>()?);
        if i % block_size == 0 {
            block_offsets.push(cursor.read_u32::<BigEndian>()? as usize);
        }
        posting_offsets.push(cursor.read_u32::<BigEndian>()? as usize);
        remaining -= record;
        i += 1;
    }

    let mut data = Vec::new();
    File::open(paths.file(&stem, "index"))?.read_to_end(&mut data)?;

    let num_terms = dfs.len();
    if block_offsets.len() != num_terms.div_ceil(block_size) {
        return Err(IndexError::Corrupt("pointers block count mismatch".into()));
    }
    let mut terms = Vec::with_capacity(num_terms);
    for (b, &start) in block_offsets.iter().enumerate() {
        let in_block = block_size.min(num_terms - b * block_size);
        let mut pos = start;
        if params.front_coding {
            decode_front_coded_block(&data, &mut pos, in_block, &mut terms)?;
        } else {
            decode_plain_block(&data, &mut pos, in_block, &mut terms)?;
        }
    }

    let mut dictionary = BTreeMap::new();
    for ((term, &df), &offset) in terms.iter().zip(&dfs).zip(&posting_offsets) {
        let postings = decode_compressed_postings(&data, offset, df, params.code)?;
        dictionary.insert(
            term.clone(),
            PostingsEntry {
                document_frequency: df,
                postings,
            },
        );
    }

    Ok(Index {
        dictionary,
        doc_info,
    })
}

fn take<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    let slice = data
        .get(*pos..*pos + len)
        .ok_or_else(|| IndexError::Corrupt("dictionary block out of bounds".into()))?;
    *pos += len;
    Ok(slice)
}

fn decode_plain_block(
    data: &[u8],
    pos: &mut usize,
    count: usize,
    terms: &mut Vec<String>,
) -> Result<()> {
    for _ in 0..count {
        let len = take(data, pos, 1)?[0] as usize;
        let bytes = take(data, pos, len)?;
        let term = String::from_utf8(bytes.to_vec())
            .map_err(|_| IndexError::Corrupt("term is not valid UTF-8".into()))?;
        terms.push(term);
    }
    Ok(())
}

fn decode_front_coded_block(
    data: &[u8],
    pos: &mut usize,
    count: usize,
    terms: &mut Vec<String>,
) -> Result<()> {
    // first record stores the full first term split by '*' at the prefix
    let len = take(data, pos, 1)?[0] as usize;
    let bytes = take(data, pos, len + 1)?;
    let star = bytes
        .iter()
        .position(|&b| b == b'*')
        .ok_or_else(|| IndexError::Corrupt("front-coded block missing '*'".into()))?;
    let prefix = bytes[..star].to_vec();
    let mut first = prefix.clone();
    first.extend_from_slice(&bytes[star + 1..]);
    terms.push(
        String::from_utf8(first)
            .map_err(|_| IndexError::Corrupt("term is not valid UTF-8".into()))?,
    );

    for _ in 1..count {
        let len = take(data, pos, 1)?[0] as usize;
        let bytes = take(data, pos, len)?;
        if bytes.first() != Some(&b'|') {
            return Err(IndexError::Corrupt("front-coded suffix missing '|'".into()));
        }
        let mut term = prefix.clone();
        term.extend_from_slice(&bytes[1..]);
        terms.push(
            String::from_utf8(term)
                .map_err(|_| IndexError::Corrupt("term is not valid UTF-8".into()))?,
        );
    }
    Ok(())
}

fn decode_compressed_postings(
    data: &[u8],
    offset: usize,
    df: u32,
    code: GapCode,
) -> Result<BTreeMap<DocId, u32>> {
    let mut postings = BTreeMap::new();
    if df == 0 {
        return Ok(postings);
    }
    let mut pos = offset;
    let mut doc_id = Cursor::new(take(data, &mut pos, 4)?).read_u32::<BigEndian>()?;
    let mut tf = Cursor::new(take(data, &mut pos, 4)?).read_u32::<BigEndian>()?;
    postings.insert(doc_id, tf);
    for _ in 1..df {
        let rest = data
            .get(pos..)
            .ok_or_else(|| IndexError::Corrupt("postings block out of bounds".into()))?;
        let mut reader = BitReader::new(rest);
        let gap = code.decode(&mut reader)?;
        pos += reader.bytes_consumed();
        doc_id = doc_id
            .checked_add(gap)
            .ok_or_else(|| IndexError::Corrupt("docId overflow while decoding gaps".into()))?;
        tf = Cursor::new(take(data, &mut pos, 4)?).read_u32::<BigEndian>()?;
        postings.insert(doc_id, tf);
    }
    Ok(postings)
}
