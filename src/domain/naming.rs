//! Output naming convention.
//!
//! - full conversion: `<basename>.<ext>`
//! - responsive variant: `<basename>-<width>w.<ext>`
//!
//! Both the derivation and the verification passes go through these functions,
//! so the two can never disagree on a file name.

use std::path::Path;

use crate::domain::TargetFormat;

pub fn full_size_name(basename: &str, format: TargetFormat) -> String {
    format!("{basename}.{}", format.extension())
}

pub fn variant_name(basename: &str, width: u32, format: TargetFormat) -> String {
    format!("{basename}-{width}w.{}", format.extension())
}

pub fn output_name(basename: &str, width: Option<u32>, format: TargetFormat) -> String {
    match width {
        Some(w) => variant_name(basename, w, format),
        None => full_size_name(basename, format),
    }
}

/// Split `banner-01.png` into (`banner-01`, `png`).
///
/// Returns `None` for names without a stem or an extension.
pub fn split_name(name: &str) -> Option<(String, String)> {
    let path = Path::new(name);
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some((stem.to_string(), ext.to_string()))
}

/// True when the full-size output for a `<basename>.<source_ext>` source would
/// land on the source file itself.
///
/// Extensions compare case-insensitively so `HERO.PNG` collides on
/// case-insensitive filesystems too.
pub fn replaces_source(source_ext: &str, format: TargetFormat) -> bool {
    format.extension().eq_ignore_ascii_case(source_ext)
}

/// True when `basename` carries the banner tag.
pub fn is_banner(basename: &str, tag: &str) -> bool {
    !tag.is_empty() && basename.contains(tag)
}

/// True when a basename looks like one of our responsive outputs (`*-<digits>w`).
pub fn is_variant_basename(basename: &str) -> bool {
    let Some((_, suffix)) = basename.rsplit_once('-') else {
        return false;
    };
    let Some(digits) = suffix.strip_suffix('w') else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
