//! Synthetic container builders shared by the extraction tests.

use super::tiff::{ByteOrder, TAG_DATE_TIME, TAG_DATE_TIME_ORIGINAL, TAG_EXIF_IFD};
use super::EXIF_SIGNATURE;

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

fn put_u16(out: &mut Vec<u8>, order: ByteOrder, value: u16) {
    match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
}

fn put_u32(out: &mut Vec<u8>, order: ByteOrder, value: u32) {
    match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
}

fn put_entry(out: &mut Vec<u8>, order: ByteOrder, tag: u16, kind: u16, count: u32, value: u32) {
    put_u16(out, order, tag);
    put_u16(out, order, kind);
    put_u32(out, order, count);
    put_u32(out, order, value);
}

/// Build a TIFF blob with an optional IFD0 `DateTime` and an optional
/// `DateTimeOriginal` in an Exif sub-IFD.
pub fn tiff_blob(
    order: ByteOrder,
    date_time: Option<&str>,
    date_time_original: Option<&str>,
) -> Vec<u8> {
    let ifd0_count = date_time.is_some() as usize + date_time_original.is_some() as usize;
    let ifd0_offset = 8usize;
    let ifd0_len = 2 + 12 * ifd0_count + 4;
    let sub_ifd_offset = ifd0_offset + ifd0_len;
    let sub_ifd_len = if date_time_original.is_some() { 2 + 12 + 4 } else { 0 };
    let data_offset = sub_ifd_offset + sub_ifd_len;

    let date_time_bytes = date_time.map(|s| [s.as_bytes(), b"\0"].concat());
    let original_bytes = date_time_original.map(|s| [s.as_bytes(), b"\0"].concat());
    let original_offset = data_offset + date_time_bytes.as_ref().map_or(0, Vec::len);

    let mut out = Vec::new();
    match order {
        ByteOrder::Little => out.extend_from_slice(b"II"),
        ByteOrder::Big => out.extend_from_slice(b"MM"),
    }
    put_u16(&mut out, order, 42);
    put_u32(&mut out, order, ifd0_offset as u32);

    put_u16(&mut out, order, ifd0_count as u16);
    if let Some(bytes) = &date_time_bytes {
        put_entry(
            &mut out,
            order,
            TAG_DATE_TIME,
            TYPE_ASCII,
            bytes.len() as u32,
            data_offset as u32,
        );
    }
    if date_time_original.is_some() {
        put_entry(
            &mut out,
            order,
            TAG_EXIF_IFD,
            TYPE_LONG,
            1,
            sub_ifd_offset as u32,
        );
    }
    put_u32(&mut out, order, 0);

    if let Some(bytes) = &original_bytes {
        put_u16(&mut out, order, 1);
        put_entry(
            &mut out,
            order,
            TAG_DATE_TIME_ORIGINAL,
            TYPE_ASCII,
            bytes.len() as u32,
            original_offset as u32,
        );
        put_u32(&mut out, order, 0);
    }

    if let Some(bytes) = &date_time_bytes {
        out.extend_from_slice(bytes);
    }
    if let Some(bytes) = &original_bytes {
        out.extend_from_slice(bytes);
    }
    out
}

/// Wrap a TIFF blob in a minimal JPEG: SOI, JFIF APP0, APP1/Exif, DQT, SOS, EOI.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + EXIF_SIGNATURE.len() + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(&EXIF_SIGNATURE);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x04, 0x00, 0x01]);
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x11, 0x22, 0x33]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&[0, 0, 0, 0]);
}

/// A 1x1 PNG with the TIFF blob stored in an `eXIf` chunk
pub fn png_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    png_chunk(
        &mut out,
        b"IHDR",
        &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0],
    );
    png_chunk(&mut out, b"eXIf", tiff);
    png_chunk(&mut out, b"IDAT", &[0x08, 0xD7, 0x63, 0xF8]);
    png_chunk(&mut out, b"IEND", &[]);
    out
}

pub fn plain_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&((body.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

pub fn full_box(kind: &[u8; 4], version: u8, body: &[u8]) -> Vec<u8> {
    let mut payload = vec![version, 0, 0, 0];
    payload.extend_from_slice(body);
    plain_box(kind, &payload)
}

pub fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
    let mut body = brand.to_vec();
    body.extend_from_slice(&[0, 0, 0, 0]);
    body.extend_from_slice(b"mif1heic");
    plain_box(b"ftyp", &body)
}

/// `infe` version 2: 16-bit item ID, protection index, item type, empty name
pub fn infe_v2(item_id: u16, item_type: &[u8; 4]) -> Vec<u8> {
    let mut body = item_id.to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0]);
    body.extend_from_slice(item_type);
    body.push(0);
    full_box(b"infe", 2, &body)
}

/// `infe` version 3: 32-bit item ID
pub fn infe_v3(item_id: u32, item_type: &[u8; 4]) -> Vec<u8> {
    let mut body = item_id.to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0]);
    body.extend_from_slice(item_type);
    body.push(0);
    full_box(b"infe", 3, &body)
}

pub fn iinf_v0(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut body = (entries.len() as u16).to_be_bytes().to_vec();
    for entry in entries {
        body.extend_from_slice(entry);
    }
    full_box(b"iinf", 0, &body)
}

/// One `iloc` item: 4-byte offsets, lengths and base offsets, no index field
pub struct IlocItem {
    pub item_id: u16,
    pub construction_method: u16,
    pub base_offset: u32,
    pub extents: Vec<(u32, u32)>,
}

pub fn iloc(version: u8, items: &[IlocItem]) -> Vec<u8> {
    let mut body = vec![0x44, 0x40];
    body.extend_from_slice(&(items.len() as u16).to_be_bytes());
    for item in items {
        body.extend_from_slice(&item.item_id.to_be_bytes());
        if version == 1 {
            body.extend_from_slice(&item.construction_method.to_be_bytes());
        }
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&item.base_offset.to_be_bytes());
        body.extend_from_slice(&(item.extents.len() as u16).to_be_bytes());
        for (offset, length) in &item.extents {
            body.extend_from_slice(&offset.to_be_bytes());
            body.extend_from_slice(&length.to_be_bytes());
        }
    }
    full_box(b"iloc", version, &body)
}

/// The HEIC Exif item layout: 4-byte offset to the signature, padding,
/// `Exif\0\0`, then the TIFF blob.
pub fn heic_exif_item(tiff: &[u8], signature_offset: u32) -> Vec<u8> {
    let mut out = signature_offset.to_be_bytes().to_vec();
    out.extend(std::iter::repeat(0u8).take(signature_offset as usize));
    out.extend_from_slice(&EXIF_SIGNATURE);
    out.extend_from_slice(tiff);
    out
}

/// A HEIC whose Exif item (ID 2) is stored in `idat` as two extents with a
/// gap of junk between them. `iloc` is version 1 with construction method 1.
pub fn heic_with_idat_item(item: &[u8]) -> Vec<u8> {
    let split = item.len() / 2;
    let (first, second) = item.split_at(split);
    let junk = [0xEE; 3];

    let mut idat_data = first.to_vec();
    idat_data.extend_from_slice(&junk);
    idat_data.extend_from_slice(second);

    let infos = iinf_v0(&[infe_v2(1, b"hvc1"), infe_v2(2, b"Exif")]);
    let locations = iloc(
        1,
        &[
            IlocItem {
                item_id: 1,
                construction_method: 0,
                base_offset: 0,
                extents: vec![(0, 4)],
            },
            IlocItem {
                item_id: 2,
                construction_method: 1,
                base_offset: 0,
                extents: vec![
                    (0, first.len() as u32),
                    ((first.len() + junk.len()) as u32, second.len() as u32),
                ],
            },
        ],
    );
    let hdlr = full_box(b"hdlr", 0, b"\0\0\0\0pict\0\0\0\0\0\0\0\0\0\0\0\0\0");

    let mut meta_body = hdlr;
    meta_body.extend_from_slice(&infos);
    meta_body.extend_from_slice(&locations);
    meta_body.extend_from_slice(&plain_box(b"idat", &idat_data));

    let mut out = ftyp(b"heic");
    out.extend_from_slice(&full_box(b"meta", 0, &meta_body));
    out.extend_from_slice(&plain_box(b"mdat", &[0xAB; 16]));
    out
}

/// A HEIC whose Exif item lives in `mdat` at an absolute file offset,
/// described by `iloc` version 0 and `infe` version 3 entries.
pub fn heic_with_absolute_item(item: &[u8]) -> Vec<u8> {
    let build = |mdat_offset: u32| {
        let infos = iinf_v0(&[infe_v3(7, b"Exif")]);
        let locations = iloc(
            0,
            &[IlocItem {
                item_id: 7,
                construction_method: 0,
                base_offset: mdat_offset,
                extents: vec![(0, item.len() as u32)],
            }],
        );
        let mut meta_body = infos;
        meta_body.extend_from_slice(&locations);

        let mut out = ftyp(b"mif1");
        out.extend_from_slice(&full_box(b"meta", 0, &meta_body));
        out
    };

    let head_len = build(0).len() as u32;
    let mut out = build(head_len + 8);
    out.extend_from_slice(&plain_box(b"mdat", item));
    out
}
