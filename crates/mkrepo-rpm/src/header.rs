// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Binary decoding of the RPM Lead, Signature header and Main header. */

use crate::error::{Result, RpmRepositoryError};
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};

const LEAD_MAGIC: u32 = 0xEDAB_EEDB;
const LEAD_SIZE: usize = 96;
const HEADER_MAGIC: u32 = 0x8EAD_E801;
const HEADER_MAGIC_MASK: u32 = 0xFFFF_FF00;
const INDEX_ENTRY_SIZE: usize = 16;

const TYPE_NULL: u32 = 0;
const TYPE_CHAR: u32 = 1;
const TYPE_INT8: u32 = 2;
const TYPE_INT16: u32 = 3;
const TYPE_INT32: u32 = 4;
const TYPE_INT64: u32 = 5;
const TYPE_STRING: u32 = 6;
const TYPE_BIN: u32 = 7;
const TYPE_STRING_ARRAY: u32 = 8;
const TYPE_I18NSTRING: u32 = 9;

/// A single header's decoded tag store, keyed by numeric tag.
#[derive(Debug, Default, Clone)]
pub struct RawHeader {
    entries: HashMap<u32, HeaderValue>,
}

#[derive(Debug, Clone)]
pub enum HeaderValue {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Binary(Vec<u8>),
    StringArray(Vec<String>),
}

impl RawHeader {
    pub fn get(&self, tag: u32) -> Option<&HeaderValue> {
        self.entries.get(&tag)
    }

    pub fn get_string(&self, tag: u32) -> Option<&str> {
        match self.entries.get(&tag)? {
            HeaderValue::StringArray(values) => values.first().map(|s| s.as_str()),
            _ => None,
        }
    }

    pub fn get_string_array(&self, tag: u32) -> Vec<String> {
        match self.entries.get(&tag) {
            Some(HeaderValue::StringArray(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    pub fn get_i32(&self, tag: u32) -> Option<i32> {
        match self.entries.get(&tag)? {
            HeaderValue::Int32(values) => values.first().copied(),
            HeaderValue::Int16(values) => values.first().map(|v| *v as i32),
            HeaderValue::Int8(values) => values.first().map(|v| *v as i32),
            _ => None,
        }
    }

    pub fn get_i64(&self, tag: u32) -> Option<i64> {
        match self.entries.get(&tag)? {
            HeaderValue::Int64(values) => values.first().copied(),
            HeaderValue::Int32(values) => values.first().map(|v| *v as i64),
            _ => self.get_i32(tag).map(|v| v as i64),
        }
    }

    pub fn get_i32_array(&self, tag: u32) -> Vec<i32> {
        match self.entries.get(&tag) {
            Some(HeaderValue::Int32(values)) => values.clone(),
            Some(HeaderValue::Int16(values)) => values.iter().map(|v| *v as i32).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get_binary(&self, tag: u32) -> Option<&[u8]> {
        match self.entries.get(&tag)? {
            HeaderValue::Binary(data) => Some(data),
            _ => None,
        }
    }

    pub fn has(&self, tag: u32) -> bool {
        self.entries.contains_key(&tag)
    }
}

/// An RPM file's decoded Lead, Signature header and Main header.
pub struct RpmPackage {
    pub signature: RawHeader,
    pub header: RawHeader,
    /// Byte offset within the original file where the Main header begins.
    pub header_start: usize,
    /// Byte offset within the original file immediately after the Main
    /// header's data store ends (the start of the cpio payload).
    pub header_end: usize,
}

/// Parse an RPM file's Lead, Signature header and Main header from `data`.
pub fn parse_rpm(data: &[u8]) -> Result<RpmPackage> {
    if data.len() < LEAD_SIZE {
        return Err(RpmRepositoryError::Truncated {
            offset: 0,
            needed: LEAD_SIZE,
            available: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    let magic = cursor.read_u32::<BigEndian>()?;
    if magic != LEAD_MAGIC {
        return Err(RpmRepositoryError::BadLeadMagic(magic));
    }
    let major = cursor.read_u8()?;
    let minor = cursor.read_u8()?;
    if major < 3 {
        return Err(RpmRepositoryError::UnsupportedVersion(major, minor));
    }

    let (signature, sig_end) = parse_header_section(data, LEAD_SIZE)?;
    // The Signature header's data store is padded so the Main header begins
    // on an 8-byte boundary relative to the start of the file.
    let header_start = (sig_end + 7) & !7;
    let (header, header_end) = parse_header_section(data, header_start)?;

    Ok(RpmPackage {
        signature,
        header,
        header_start,
        header_end,
    })
}

/// Parse one header section (magic + index + data store) starting at `start`
/// within `data`. Returns the decoded header and the offset immediately past
/// its data store.
fn parse_header_section(data: &[u8], start: usize) -> Result<(RawHeader, usize)> {
    let prefix_len = 16;
    if data.len() < start + prefix_len {
        return Err(RpmRepositoryError::Truncated {
            offset: start,
            needed: prefix_len,
            available: data.len().saturating_sub(start),
        });
    }

    let mut cursor = Cursor::new(&data[start..start + prefix_len]);
    let magic_and_version = cursor.read_u32::<BigEndian>()?;
    if magic_and_version & HEADER_MAGIC_MASK != HEADER_MAGIC & HEADER_MAGIC_MASK {
        return Err(RpmRepositoryError::BadHeaderMagic(magic_and_version));
    }
    let mut reserved = [0u8; 4];
    cursor.read_exact(&mut reserved)?;
    let num_index_entries = cursor.read_u32::<BigEndian>()? as usize;
    let num_data_bytes = cursor.read_u32::<BigEndian>()? as usize;

    let index_start = start + prefix_len;
    let index_len = num_index_entries * INDEX_ENTRY_SIZE;
    let store_start = index_start + index_len;
    let store_end = store_start + num_data_bytes;

    if data.len() < store_end {
        return Err(RpmRepositoryError::Truncated {
            offset: store_start,
            needed: num_data_bytes,
            available: data.len().saturating_sub(store_start),
        });
    }

    let store = &data[store_start..store_end];
    let mut entries = HashMap::with_capacity(num_index_entries);

    for i in 0..num_index_entries {
        let entry_start = index_start + i * INDEX_ENTRY_SIZE;
        let mut entry_cursor = Cursor::new(&data[entry_start..entry_start + INDEX_ENTRY_SIZE]);
        let tag = entry_cursor.read_u32::<BigEndian>()?;
        let data_type = entry_cursor.read_u32::<BigEndian>()?;
        let offset = entry_cursor.read_u32::<BigEndian>()? as usize;
        let count = entry_cursor.read_u32::<BigEndian>()? as usize;

        // The region-sentinel entry (tag 62 or 63) has count 16 and marks
        // signature/header region boundaries; its value carries no payload
        // fields we need so plain decoding according to its declared type
        // is sufficient and matches how createrepo-style tools treat it.
        let value = decode_value(store, offset, data_type, count, tag)?;
        entries.insert(tag, value);
    }

    Ok((RawHeader { entries }, store_end))
}

fn decode_value(
    store: &[u8],
    offset: usize,
    data_type: u32,
    count: usize,
    tag: u32,
) -> Result<HeaderValue> {
    match data_type {
        TYPE_NULL => Ok(HeaderValue::Binary(Vec::new())),
        TYPE_CHAR | TYPE_INT8 => {
            let bytes = slice_at(store, offset, count, tag)?;
            Ok(HeaderValue::Int8(bytes.iter().map(|b| *b as i8).collect()))
        }
        TYPE_INT16 => {
            let bytes = slice_at(store, offset, count * 2, tag)?;
            let mut values = Vec::with_capacity(count);
            let mut cursor = Cursor::new(bytes);
            for _ in 0..count {
                values.push(cursor.read_i16::<BigEndian>()?);
            }
            Ok(HeaderValue::Int16(values))
        }
        TYPE_INT32 => {
            let bytes = slice_at(store, offset, count * 4, tag)?;
            let mut values = Vec::with_capacity(count);
            let mut cursor = Cursor::new(bytes);
            for _ in 0..count {
                values.push(cursor.read_i32::<BigEndian>()?);
            }
            Ok(HeaderValue::Int32(values))
        }
        TYPE_INT64 => {
            let bytes = slice_at(store, offset, count * 8, tag)?;
            let mut values = Vec::with_capacity(count);
            let mut cursor = Cursor::new(bytes);
            for _ in 0..count {
                values.push(cursor.read_i64::<BigEndian>()?);
            }
            Ok(HeaderValue::Int64(values))
        }
        TYPE_BIN => {
            let bytes = slice_at(store, offset, count, tag)?;
            Ok(HeaderValue::Binary(bytes.to_vec()))
        }
        TYPE_STRING => {
            let s = read_cstr(store, offset, tag)?;
            Ok(HeaderValue::StringArray(vec![s]))
        }
        TYPE_STRING_ARRAY | TYPE_I18NSTRING => {
            let mut values = Vec::with_capacity(count);
            let mut pos = offset;
            for _ in 0..count {
                let s = read_cstr(store, pos, tag)?;
                pos += s.len() + 1;
                values.push(s);
            }
            Ok(HeaderValue::StringArray(values))
        }
        other => Err(RpmRepositoryError::UnknownTagType(other)),
    }
}

fn slice_at<'a>(store: &'a [u8], offset: usize, len: usize, tag: u32) -> Result<&'a [u8]> {
    store
        .get(offset..offset + len)
        .ok_or(RpmRepositoryError::Truncated {
            offset,
            needed: len,
            available: store.len().saturating_sub(offset),
        })
        .map_err(|e| {
            let _ = tag;
            e
        })
}

fn read_cstr(store: &[u8], offset: usize, tag: u32) -> Result<String> {
    let rest = store
        .get(offset..)
        .ok_or(RpmRepositoryError::Truncated {
            offset,
            needed: 1,
            available: 0,
        })?;
    let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
    let raw = &rest[..end];
    match std::str::from_utf8(raw) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            // Match header_to_primary's Latin-1 fallback for text fields
            // that predate UTF-8 locales.
            let _ = tag;
            Ok(raw.iter().map(|b| *b as char).collect())
        }
    }
}
